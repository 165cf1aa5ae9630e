// Series extractor - one station, one measurement, one value per day
use crate::domain::measurement::Measurement;
use crate::domain::record::NormalizedRecord;
use crate::domain::series::{DailyPoint, DateRange, StationSeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Mean of the non-missing observations for every date that has records.
///
/// A date whose observations are all missing maps to `None`.
pub fn daily_means<'a, I>(records: I, measurement: Measurement) -> BTreeMap<NaiveDate, Option<f64>>
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for record in records {
        let entry = sums.entry(record.date).or_insert((0.0, 0));
        if let Some(value) = record.measurements.get(measurement) {
            entry.0 += value;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(date, (sum, count))| (date, (count > 0).then(|| sum / count as f64)))
        .collect()
}

/// Build the dense daily series for `station`.
///
/// Every calendar day between the first and last matching record appears
/// once. Missing days carry the previous known value forward; days before the
/// first known value are dropped. No matching records gives an empty series.
pub fn extract_station_series<'a, I>(
    records: I,
    station: &str,
    measurement: Measurement,
    range: Option<DateRange>,
) -> StationSeries
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    let daily = daily_means(
        records
            .into_iter()
            .filter(|r| r.station == station)
            .filter(|r| range.is_none_or(|range| range.contains(r.date))),
        measurement,
    );

    let (Some(&first), Some(&last)) = (daily.keys().next(), daily.keys().next_back()) else {
        tracing::debug!(station, %measurement, "no records match the selection");
        return StationSeries::empty(station.to_string(), measurement);
    };

    let mut points = Vec::new();
    let mut carried: Option<f64> = None;
    for date in first.iter_days().take_while(|d| *d <= last) {
        if let Some(value) = daily.get(&date).copied().flatten() {
            carried = Some(value);
        }
        if let Some(value) = carried {
            points.push(DailyPoint::new(date, value));
        }
    }

    StationSeries::new(station.to_string(), measurement, points)
}
