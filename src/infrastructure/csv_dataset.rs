// CSV reader for the air-quality dataset, tolerant of both date layouts
use crate::application::dataset_source::{DatasetError, RawDataset};
use crate::domain::measurement::{Measurement, Measurements};
use crate::domain::record::{MalformedReason, MalformedRow, RawRecord};
use csv::{ReaderBuilder, StringRecord, Trim};

/// Positions of the columns we care about; anything else is ignored
#[derive(Debug, Default)]
struct ColumnMap {
    station: usize,
    year: Option<usize>,
    month: Option<usize>,
    day: Option<usize>,
    hour: Option<usize>,
    datetime: Option<usize>,
    measurements: Vec<(Measurement, usize)>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, DatasetError> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));

        let station = find("station").ok_or(DatasetError::MissingColumn("station"))?;
        let measurements = Measurement::ALL
            .into_iter()
            .filter_map(|m| find(m.column_name()).map(|idx| (m, idx)))
            .collect();

        Ok(Self {
            station,
            year: find("year"),
            month: find("month"),
            day: find("day"),
            hour: find("hour"),
            datetime: find("datetime"),
            measurements,
        })
    }

    fn to_raw(&self, row: usize, record: &StringRecord) -> RawRecord {
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let mut measurements = Measurements::default();
        for &(measurement, idx) in &self.measurements {
            measurements.set(measurement, record.get(idx).and_then(parse_measurement));
        }

        RawRecord {
            row,
            station: field(Some(self.station)),
            year: field(self.year),
            month: field(self.month),
            day: field(self.day),
            hour: field(self.hour),
            datetime: field(self.datetime),
            measurements,
        }
    }
}

/// Empty, `NA`, `NaN` and anything non-numeric are missing
fn parse_measurement(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn parse_csv(text: &str) -> Result<RawDataset, DatasetError> {
    if text.trim().is_empty() {
        return Err(DatasetError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(text.as_bytes());
    let columns = ColumnMap::from_headers(reader.headers()?)?;

    let mut dataset = RawDataset::default();
    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        match result {
            Ok(record) => dataset.rows.push(columns.to_raw(row, &record)),
            Err(e) => {
                tracing::warn!(row, error = %e, "unreadable CSV row");
                dataset.unreadable.push(MalformedRow {
                    row,
                    reason: MalformedReason::Unreadable(e.to_string()),
                });
            }
        }
    }

    tracing::debug!(
        rows = dataset.rows.len(),
        unreadable = dataset.unreadable.len(),
        measurements = columns.measurements.len(),
        "parsed CSV"
    );
    Ok(dataset)
}
