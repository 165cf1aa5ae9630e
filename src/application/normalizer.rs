// Record normalizer - resolves each raw row to a single timestamp
use crate::domain::record::{DateSource, MalformedReason, MalformedRow, NormalizedRecord, RawRecord};

#[derive(Debug, Clone, Default)]
pub struct NormalizeOutcome {
    pub records: Vec<NormalizedRecord>,
    pub malformed: Vec<MalformedRow>,
}

/// Pick the date source by which fields are present.
///
/// Complete date parts win over a combined `datetime` field. The choice is
/// made on presence alone: invalid date parts are not retried as `datetime`.
pub fn resolve_date_source(raw: &RawRecord) -> Option<DateSource> {
    let present = |field: &Option<String>| {
        field
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    match (
        present(&raw.year),
        present(&raw.month),
        present(&raw.day),
        present(&raw.hour),
    ) {
        (Some(year), Some(month), Some(day), Some(hour)) => Some(DateSource::DateParts {
            year,
            month,
            day,
            hour,
        }),
        _ => present(&raw.datetime).map(DateSource::Combined),
    }
}

pub fn normalize_record(raw: RawRecord) -> Result<NormalizedRecord, MalformedRow> {
    let row = raw.row;
    let malformed = |reason| MalformedRow { row, reason };

    let station = raw
        .station
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed(MalformedReason::MissingStation))?
        .to_string();

    let source = resolve_date_source(&raw).ok_or_else(|| malformed(MalformedReason::MissingDateInfo))?;
    let timestamp = source.to_timestamp().map_err(malformed)?;

    Ok(NormalizedRecord::new(station, timestamp, raw.measurements))
}

pub fn normalize<I>(rows: I) -> NormalizeOutcome
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut outcome = NormalizeOutcome::default();
    for raw in rows {
        match normalize_record(raw) {
            Ok(record) => outcome.records.push(record),
            Err(row) => {
                tracing::debug!(row = row.row, reason = %row.reason, "dropping malformed row");
                outcome.malformed.push(row);
            }
        }
    }
    outcome
}
