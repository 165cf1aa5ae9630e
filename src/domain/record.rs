// Station record domain models
use super::measurement::Measurements;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// One input row as read from the source, before any date resolution
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    /// 1-based data row number in the source, used for reporting
    pub row: usize,
    pub station: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
    pub day: Option<String>,
    pub hour: Option<String>,
    pub datetime: Option<String>,
    pub measurements: Measurements,
}

impl RawRecord {
    pub fn new(row: usize, station: impl Into<String>) -> Self {
        Self {
            row,
            station: Some(station.into()),
            ..Default::default()
        }
    }

    pub fn with_date_parts(mut self, year: i32, month: u32, day: u32, hour: u32) -> Self {
        self.year = Some(year.to_string());
        self.month = Some(month.to_string());
        self.day = Some(day.to_string());
        self.hour = Some(hour.to_string());
        self
    }

    pub fn with_datetime(mut self, datetime: impl Into<String>) -> Self {
        self.datetime = Some(datetime.into());
        self
    }

    pub fn with_measurements(mut self, measurements: Measurements) -> Self {
        self.measurements = measurements;
        self
    }
}

/// Where a row's timestamp comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSource {
    DateParts {
        year: String,
        month: String,
        day: String,
        hour: String,
    },
    Combined(String),
}

const COMBINED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

impl DateSource {
    pub fn to_timestamp(&self) -> Result<NaiveDateTime, MalformedReason> {
        match self {
            DateSource::DateParts {
                year,
                month,
                day,
                hour,
            } => {
                let invalid = || MalformedReason::InvalidDateParts {
                    year: year.clone(),
                    month: month.clone(),
                    day: day.clone(),
                    hour: hour.clone(),
                };
                let y = parse_integer_like(year).ok_or_else(invalid)?;
                let m = parse_integer_like(month).ok_or_else(invalid)?;
                let d = parse_integer_like(day).ok_or_else(invalid)?;
                let h = parse_integer_like(hour).ok_or_else(invalid)?;

                let year = i32::try_from(y).map_err(|_| invalid())?;
                let (month, day, hour) = (
                    u32::try_from(m).map_err(|_| invalid())?,
                    u32::try_from(d).map_err(|_| invalid())?,
                    u32::try_from(h).map_err(|_| invalid())?,
                );

                NaiveDate::from_ymd_opt(year, month, day)
                    .and_then(|date| date.and_hms_opt(hour, 0, 0))
                    .ok_or_else(invalid)
            }
            DateSource::Combined(text) => parse_combined(text)
                .ok_or_else(|| MalformedReason::UnparseableTimestamp(text.clone())),
        }
    }
}

/// Accepts "7", "07", "7.0" but not "7.5" or "7e0"
fn parse_integer_like(text: &str) -> Option<i64> {
    let text = text.trim();
    let digits = match text.split_once('.') {
        Some((whole, fraction)) if !fraction.is_empty() && fraction.bytes().all(|b| b == b'0') => whole,
        Some(_) => return None,
        None => text,
    };
    digits.parse().ok()
}

fn parse_combined(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(text) {
        return Some(with_offset.naive_local());
    }
    COMBINED_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| parse_padded_hour(text))
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// "YYYY-MM-DD-HH"; chrono needs a minute field to build a time
pub(crate) fn parse_padded_hour(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{text}:00"), "%Y-%m-%d-%H:%M").ok()
}

/// A row with a resolved timestamp
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub station: String,
    pub timestamp: NaiveDateTime,
    pub date: NaiveDate,
    pub measurements: Measurements,
}

impl NormalizedRecord {
    pub fn new(station: String, timestamp: NaiveDateTime, measurements: Measurements) -> Self {
        Self {
            station,
            date: timestamp.date(),
            timestamp,
            measurements,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum MalformedReason {
    #[error("row has no station identifier")]
    MissingStation,
    #[error("row has neither year/month/day/hour nor a datetime field")]
    MissingDateInfo,
    #[error("invalid date parts {year}-{month}-{day} hour {hour}")]
    InvalidDateParts {
        year: String,
        month: String,
        day: String,
        hour: String,
    },
    #[error("unparseable timestamp: {0}")]
    UnparseableTimestamp(String),
    #[error("unreadable row: {0}")]
    Unreadable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRow {
    pub row: usize,
    pub reason: MalformedReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(y: &str, m: &str, d: &str, h: &str) -> DateSource {
        DateSource::DateParts {
            year: y.to_string(),
            month: m.to_string(),
            day: d.to_string(),
            hour: h.to_string(),
        }
    }

    #[test]
    fn test_date_parts_match_padded_format() {
        let ts = parts("2013", "3", "1", "7").to_timestamp().unwrap();
        let expected = parse_padded_hour(&format!("{}-{:02}-{:02}-{:02}", 2013, 3, 1, 7)).unwrap();
        assert_eq!(ts, expected);
    }

    #[test]
    fn test_date_parts_accept_float_like_integers() {
        let ts = parts("2014.0", "12.0", "31", "23.0").to_timestamp().unwrap();
        assert_eq!(ts.to_string(), "2014-12-31 23:00:00");
    }

    #[test]
    fn test_integer_like_rejects_exponents() {
        assert_eq!(parse_integer_like(" 07 "), Some(7));
        assert_eq!(parse_integer_like("2013.00"), Some(2013));
        assert_eq!(parse_integer_like("1e3"), None);
        assert_eq!(parse_integer_like("2.013e3"), None);
        assert_eq!(parse_integer_like("7."), None);
        assert_eq!(parse_integer_like(".0"), None);
        assert_eq!(parse_integer_like("inf"), None);

        assert!(matches!(
            parts("1e3", "1", "1", "0").to_timestamp(),
            Err(MalformedReason::InvalidDateParts { .. })
        ));
    }

    #[test]
    fn test_date_parts_out_of_range() {
        assert!(matches!(
            parts("2013", "13", "1", "0").to_timestamp(),
            Err(MalformedReason::InvalidDateParts { .. })
        ));
        assert!(parts("2013", "2", "30", "0").to_timestamp().is_err());
        assert!(parts("2013", "2", "1", "24").to_timestamp().is_err());
        assert!(parts("2013", "2", "1", "1.5").to_timestamp().is_err());
        assert!(parts("2013", "-2", "1", "1").to_timestamp().is_err());
    }

    #[test]
    fn test_combined_formats() {
        let cases = [
            ("2013-03-01 07:00:00", "2013-03-01 07:00:00"),
            ("2013-03-01T07:30:00", "2013-03-01 07:30:00"),
            ("2013-03-01 07:30", "2013-03-01 07:30:00"),
            ("2013-03-01-07", "2013-03-01 07:00:00"),
            ("2013/03/01 07:00:00", "2013-03-01 07:00:00"),
            ("2013-03-01T07:00:00+08:00", "2013-03-01 07:00:00"),
            ("2013-03-01", "2013-03-01 00:00:00"),
        ];
        for (input, expected) in cases {
            let ts = DateSource::Combined(input.to_string()).to_timestamp().unwrap();
            assert_eq!(ts.to_string(), expected, "input {input}");
        }
    }

    #[test]
    fn test_combined_garbage() {
        let err = DateSource::Combined("yesterday".to_string())
            .to_timestamp()
            .unwrap_err();
        assert_eq!(err, MalformedReason::UnparseableTimestamp("yesterday".to_string()));
    }

    #[test]
    fn test_normalized_record_derives_date() {
        let ts = parse_padded_hour("2016-07-04-22").unwrap();
        let record = NormalizedRecord::new("Aotizhongxin".to_string(), ts, Measurements::default());
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2016, 7, 4).unwrap());
    }
}
