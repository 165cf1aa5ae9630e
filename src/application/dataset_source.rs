// Source trait for the raw air-quality dataset
use crate::domain::record::{MalformedRow, RawRecord};
use async_trait::async_trait;

/// Rows read from a source. Rows the reader could not even split into
/// fields are reported in `unreadable` instead of aborting the load.
#[derive(Debug, Clone, Default)]
pub struct RawDataset {
    pub rows: Vec<RawRecord>,
    pub unreadable: Vec<MalformedRow>,
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset source {location} is unavailable: {reason}")]
    Unavailable { location: String, reason: String },
    #[error("dataset has no `{0}` column")]
    MissingColumn(&'static str),
    #[error("dataset is empty")]
    Empty,
    #[error("failed to read dataset header: {0}")]
    Header(#[from] csv::Error),
}

#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Where the data comes from, for logs
    fn location(&self) -> &str;

    /// Fetch and split the whole dataset into raw rows
    async fn fetch(&self) -> Result<RawDataset, DatasetError>;
}
