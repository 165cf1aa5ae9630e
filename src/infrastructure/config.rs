use crate::application::forecaster::ForecastPolicy;
use crate::domain::forecast::ModelOrder;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub server: ServerSettings,
    pub dataset: DatasetSettings,
    pub forecast: ForecastSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetSettings {
    /// http(s) URL or local file path of the CSV
    pub location: String,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
}

impl DatasetSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastSettings {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub horizon: usize,
    pub min_history: usize,
}

impl ForecastSettings {
    pub fn policy(&self) -> ForecastPolicy {
        ForecastPolicy {
            order: ModelOrder::new(self.p, self.d, self.q),
            horizon: self.horizon,
            min_history: self.min_history,
        }
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    let defaults = ForecastPolicy::default();
    Ok(config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:8080")?
        .set_default("dataset.location", "data/cleaned_data.csv")?
        .set_default("dataset.cache_ttl_secs", 600_i64)?
        .set_default("dataset.request_timeout_secs", 30_i64)?
        .set_default("forecast.p", defaults.order.p as i64)?
        .set_default("forecast.d", defaults.order.d as i64)?
        .set_default("forecast.q", defaults.order.q as i64)?
        .set_default("forecast.horizon", defaults.horizon as i64)?
        .set_default("forecast.min_history", defaults.min_history as i64)?)
}

fn environment() -> config::Environment {
    config::Environment::with_prefix("AIRQ")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Defaults, then `config/dashboard.*` if present, then `AIRQ__SECTION__KEY` variables
pub fn load_dashboard_config() -> anyhow::Result<DashboardConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/dashboard").required(false))
        .add_source(environment())
        .build()?;

    Ok(settings.try_deserialize()?)
}
