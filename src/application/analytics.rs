// Exploration analytics - trend, correlation and station comparison views
use crate::application::series_extractor::daily_means;
use crate::domain::measurement::Measurement;
use crate::domain::record::NormalizedRecord;
use crate::domain::series::DailyPoint;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationTrend {
    pub station: String,
    pub measurement: Measurement,
    pub points: Vec<DailyPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<Measurement>,
    /// Row-major; `None` where fewer than two paired values or no variance
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Measurement, b: Measurement) -> Option<f64> {
        let i = self.labels.iter().position(|m| *m == a)?;
        let j = self.labels.iter().position(|m| *m == b)?;
        self.values[i][j]
    }
}

/// Box-plot summary of one measurement at one station
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub station: String,
    pub measurement: Measurement,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
}

fn group_by_station<'a>(records: &[&'a NormalizedRecord]) -> BTreeMap<&'a str, Vec<&'a NormalizedRecord>> {
    let mut groups: BTreeMap<&str, Vec<&NormalizedRecord>> = BTreeMap::new();
    for &record in records {
        groups.entry(record.station.as_str()).or_default().push(record);
    }
    groups
}

/// Daily mean per station; days without any valid value are left out
pub fn station_trends(records: &[&NormalizedRecord], measurement: Measurement) -> Vec<StationTrend> {
    group_by_station(records)
        .into_iter()
        .map(|(station, rows)| StationTrend {
            station: station.to_string(),
            measurement,
            points: daily_means(rows, measurement)
                .into_iter()
                .filter_map(|(date, value)| value.map(|v| DailyPoint::new(date, v)))
                .collect(),
        })
        .collect()
}

/// Pairwise-complete Pearson correlation across all measurements
pub fn correlation_matrix(records: &[&NormalizedRecord]) -> CorrelationMatrix {
    let labels = Measurement::ALL.to_vec();
    let values = labels
        .iter()
        .map(|&a| {
            labels
                .iter()
                .map(|&b| {
                    let pairs: Vec<(f64, f64)> = records
                        .iter()
                        .filter_map(|r| Some((r.measurements.get(a)?, r.measurements.get(b)?)))
                        .collect();
                    pearson(&pairs).map(|r| if a == b { 1.0 } else { r })
                })
                .collect()
        })
        .collect();

    CorrelationMatrix { labels, values }
}

fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Five-number summary per station, linear-interpolated quantiles
pub fn station_comparison(records: &[&NormalizedRecord], measurement: Measurement) -> Vec<StationSummary> {
    group_by_station(records)
        .into_iter()
        .filter_map(|(station, rows)| {
            let mut values: Vec<f64> = rows.iter().filter_map(|r| r.measurements.get(measurement)).collect();
            if values.is_empty() {
                return None;
            }
            values.sort_by(f64::total_cmp);

            Some(StationSummary {
                station: station.to_string(),
                measurement,
                count: values.len(),
                min: values[0],
                q1: quantile(&values, 0.25),
                median: quantile(&values, 0.5),
                q3: quantile(&values, 0.75),
                max: values[values.len() - 1],
                mean: values.iter().sum::<f64>() / values.len() as f64,
            })
        })
        .collect()
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (position - lower as f64)
}
