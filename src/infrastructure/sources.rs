// Dataset sources: remote CSV over HTTP or a local CSV file
use crate::application::dataset_source::{DatasetError, DatasetSource, RawDataset};
use crate::infrastructure::config::DatasetSettings;
use crate::infrastructure::csv_dataset::parse_csv;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpDatasetSource {
    client: Client,
    url: String,
}

impl HttpDatasetSource {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client, url })
    }

    fn unavailable(&self, reason: impl ToString) -> DatasetError {
        DatasetError::Unavailable {
            location: self.url.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    fn location(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<RawDataset, DatasetError> {
        tracing::info!("Downloading dataset: {}", self.url);
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "text/csv, text/plain")
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(self.unavailable(format!("HTTP status {status}")));
        }

        let body = response.text().await.map_err(|e| self.unavailable(e))?;
        tracing::debug!(bytes = body.len(), "dataset downloaded");
        parse_csv(&body)
    }
}

#[derive(Debug, Clone)]
pub struct FileDatasetSource {
    path: PathBuf,
    display: String,
}

impl FileDatasetSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display = path.display().to_string();
        Self { path, display }
    }
}

#[async_trait]
impl DatasetSource for FileDatasetSource {
    fn location(&self) -> &str {
        &self.display
    }

    async fn fetch(&self) -> Result<RawDataset, DatasetError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| DatasetError::Unavailable {
                location: self.display.clone(),
                reason: e.to_string(),
            })?;
        parse_csv(&text)
    }
}

/// Pick the source implementation from the configured location
pub fn source_for(settings: &DatasetSettings) -> anyhow::Result<Arc<dyn DatasetSource>> {
    let location = settings.location.trim();
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Arc::new(HttpDatasetSource::new(
            location.to_string(),
            settings.request_timeout(),
        )?))
    } else {
        Ok(Arc::new(FileDatasetSource::new(location)))
    }
}
