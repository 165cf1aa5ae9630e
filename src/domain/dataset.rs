// Loaded dataset and the selection filters applied to it
use super::record::{MalformedRow, NormalizedRecord};
use super::series::DateRange;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Normalized records from one load of the source, plus what was dropped
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Incremented on every successful load
    pub version: u64,
    pub total_rows: usize,
    pub records: Vec<NormalizedRecord>,
    pub malformed: Vec<MalformedRow>,
}

impl Dataset {
    pub fn dropped_rows(&self) -> usize {
        self.malformed.len()
    }

    pub fn dropped_fraction(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.dropped_rows() as f64 / self.total_rows as f64
        }
    }

    /// Distinct station identifiers, sorted
    pub fn stations(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.station.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn date_bounds(&self) -> Option<DateRange> {
        let first = self.records.iter().map(|r| r.date).min()?;
        let last = self.records.iter().map(|r| r.date).max()?;
        Some(DateRange::new(first, last))
    }

    pub fn select<'a>(&'a self, selection: &Selection) -> Vec<&'a NormalizedRecord> {
        self.records.iter().filter(|r| selection.matches(r)).collect()
    }
}

/// Station and date filters chosen in the dashboard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// `None` selects every station
    pub stations: Option<BTreeSet<String>>,
    pub range: Option<DateRange>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn station(station: &str) -> Self {
        Self {
            stations: Some(BTreeSet::from([station.to_string()])),
            range: None,
        }
    }

    pub fn with_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.range = Some(DateRange::new(start, end));
        self
    }

    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        let station_ok = self
            .stations
            .as_ref()
            .is_none_or(|stations| stations.contains(&record.station));
        let date_ok = self.range.is_none_or(|range| range.contains(record.date));
        station_ok && date_ok
    }
}
