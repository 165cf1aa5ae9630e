// Dashboard service - Use cases behind each dashboard view
use crate::application::analytics::{
    correlation_matrix, station_comparison, station_trends, CorrelationMatrix, StationSummary,
    StationTrend,
};
use crate::application::dataset_cache::DatasetCache;
use crate::application::dataset_source::DatasetError;
use crate::application::forecaster::Forecaster;
use crate::application::series_extractor::extract_station_series;
use crate::domain::dataset::{Dataset, Selection};
use crate::domain::forecast::{Forecast, ForecastResult};
use crate::domain::measurement::Measurement;
use crate::domain::record::{MalformedRow, NormalizedRecord};
use crate::domain::series::{DateRange, StationSeries};
use std::sync::Arc;

const MALFORMED_SAMPLE: usize = 20;

#[derive(Debug, Clone)]
pub struct DatasetOverview {
    pub version: u64,
    pub stations: Vec<String>,
    pub date_range: Option<DateRange>,
    pub total_rows: usize,
    pub dropped_rows: usize,
    pub dropped_fraction: f64,
    /// First few dropped rows, for diagnosing a bad source
    pub malformed_sample: Vec<MalformedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastStatus {
    /// The selection matched no usable observations
    NoData,
    InsufficientHistory { required: usize, available: usize },
    FitFailed { reason: String },
    Available(ForecastResult),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub series: StationSeries,
    pub status: ForecastStatus,
}

#[derive(Clone)]
pub struct DashboardService {
    cache: Arc<DatasetCache>,
    forecaster: Forecaster,
}

impl DashboardService {
    pub fn new(cache: Arc<DatasetCache>, forecaster: Forecaster) -> Self {
        Self { cache, forecaster }
    }

    async fn dataset(&self) -> Result<Arc<Dataset>, DatasetError> {
        self.cache.get().await
    }

    pub async fn overview(&self) -> Result<DatasetOverview, DatasetError> {
        let dataset = self.dataset().await?;
        Ok(DatasetOverview {
            version: dataset.version,
            stations: dataset.stations(),
            date_range: dataset.date_bounds(),
            total_rows: dataset.total_rows,
            dropped_rows: dataset.dropped_rows(),
            dropped_fraction: dataset.dropped_fraction(),
            malformed_sample: dataset.malformed.iter().take(MALFORMED_SAMPLE).cloned().collect(),
        })
    }

    pub async fn records(&self, selection: &Selection) -> Result<Vec<NormalizedRecord>, DatasetError> {
        let dataset = self.dataset().await?;
        Ok(dataset.select(selection).into_iter().cloned().collect())
    }

    pub async fn trend(
        &self,
        selection: &Selection,
        measurement: Measurement,
    ) -> Result<Vec<StationTrend>, DatasetError> {
        let dataset = self.dataset().await?;
        Ok(station_trends(&dataset.select(selection), measurement))
    }

    pub async fn correlation(&self, selection: &Selection) -> Result<CorrelationMatrix, DatasetError> {
        let dataset = self.dataset().await?;
        Ok(correlation_matrix(&dataset.select(selection)))
    }

    pub async fn comparison(
        &self,
        selection: &Selection,
        measurement: Measurement,
    ) -> Result<Vec<StationSummary>, DatasetError> {
        let dataset = self.dataset().await?;
        Ok(station_comparison(&dataset.select(selection), measurement))
    }

    /// Extract the station's daily series and forecast it.
    ///
    /// Only a dataset failure is an `Err`; every forecasting outcome is
    /// reported through `ForecastStatus`.
    pub async fn forecast(
        &self,
        station: &str,
        range: Option<DateRange>,
        measurement: Measurement,
    ) -> Result<ForecastView, DatasetError> {
        let dataset = self.dataset().await?;
        let series = extract_station_series(&dataset.records, station, measurement, range);
        Ok(self.forecast_series(series))
    }

    pub fn forecast_series(&self, series: StationSeries) -> ForecastView {
        let status = if series.is_empty() {
            ForecastStatus::NoData
        } else {
            match self.forecaster.forecast(&series) {
                Ok(Forecast::Available(result)) => ForecastStatus::Available(result),
                Ok(Forecast::InsufficientHistory { required, available }) => {
                    ForecastStatus::InsufficientHistory { required, available }
                }
                Err(e) => {
                    tracing::warn!(station = %series.station, error = %e, "forecast fit failed");
                    ForecastStatus::FitFailed {
                        reason: e.to_string(),
                    }
                }
            }
        };

        ForecastView { series, status }
    }
}
