// Daily station series domain models
use super::measurement::Measurement;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl DailyPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Dense daily series for one station and one measurement.
///
/// Points are ordered by date with exactly one entry per calendar day between
/// the first and last date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSeries {
    pub station: String,
    pub measurement: Measurement,
    pub points: Vec<DailyPoint>,
}

impl StationSeries {
    pub fn new(station: String, measurement: Measurement, points: Vec<DailyPoint>) -> Self {
        Self {
            station,
            measurement,
            points,
        }
    }

    pub fn empty(station: String, measurement: Measurement) -> Self {
        Self::new(station, measurement, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
