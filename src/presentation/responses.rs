// Mapper from dashboard results to JSON response bodies
use crate::application::dashboard_service::{DatasetOverview, ForecastStatus, ForecastView};
use crate::domain::forecast::ModelOrder;
use crate::domain::measurement::Measurement;
use crate::domain::record::{MalformedRow, NormalizedRecord};
use crate::domain::series::DailyPoint;
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub version: u64,
    pub stations: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub total_rows: usize,
    pub dropped_rows: usize,
    pub dropped_fraction: f64,
    pub malformed_sample: Vec<MalformedRow>,
}

impl From<DatasetOverview> for StationsResponse {
    fn from(overview: DatasetOverview) -> Self {
        Self {
            version: overview.version,
            stations: overview.stations,
            first_date: overview.date_range.map(|r| r.start),
            last_date: overview.date_range.map(|r| r.end),
            total_rows: overview.total_rows,
            dropped_rows: overview.dropped_rows,
            dropped_fraction: overview.dropped_fraction,
            malformed_sample: overview.malformed_sample,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub count: usize,
    pub records: Vec<NormalizedRecord>,
}

impl From<Vec<NormalizedRecord>> for RecordsResponse {
    fn from(records: Vec<NormalizedRecord>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatusCode {
    NoData,
    InsufficientData,
    FitFailed,
    Available,
}

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub station: String,
    pub measurement: Measurement,
    pub status: ForecastStatusCode,
    pub series: Vec<DailyPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Vec<DailyPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<ModelOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<ForecastView> for ForecastResponse {
    fn from(view: ForecastView) -> Self {
        let ForecastView { series, status } = view;
        let mut response = Self {
            station: series.station,
            measurement: series.measurement,
            status: ForecastStatusCode::NoData,
            series: series.points,
            forecast: None,
            order: None,
            label: None,
            message: None,
        };

        match status {
            ForecastStatus::NoData => {
                response.message = Some("No data for the selected station and dates".to_string());
            }
            ForecastStatus::InsufficientHistory { required, available } => {
                response.status = ForecastStatusCode::InsufficientData;
                response.message = Some(format!(
                    "Not enough data to forecast: {available} daily values, need at least {required}"
                ));
            }
            ForecastStatus::FitFailed { reason } => {
                response.status = ForecastStatusCode::FitFailed;
                response.message = Some(format!("Could not fit a model: {reason}"));
            }
            ForecastStatus::Available(result) => {
                response.status = ForecastStatusCode::Available;
                response.label = Some(result.order.to_string());
                response.order = Some(result.order);
                response.forecast = Some(result.forecast);
            }
        }

        response
    }
}
