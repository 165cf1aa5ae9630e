// HTTP request handlers
use crate::domain::dataset::Selection;
use crate::domain::measurement::Measurement;
use crate::domain::series::DateRange;
use crate::infrastructure::http_response::{json_response, ApiError};
use crate::presentation::app_state::AppState;
use crate::presentation::responses::{ForecastResponse, RecordsResponse, StationsResponse};
use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

/// Filters shared by every dashboard view
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    /// Comma-separated station identifiers; absent means all stations
    pub stations: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub measurement: Option<String>,
}

impl ViewQuery {
    fn range(&self) -> Result<Option<DateRange>, ApiError> {
        let parse = |name: &str, value: &Option<String>| -> Result<Option<NaiveDate>, ApiError> {
            value
                .as_deref()
                .map(|v| {
                    NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").map_err(|_| {
                        ApiError::BadRequest(format!("{name} must be a YYYY-MM-DD date, got {v:?}"))
                    })
                })
                .transpose()
        };

        match (parse("start", &self.start)?, parse("end", &self.end)?) {
            (None, None) => Ok(None),
            (start, end) => {
                let start = start.unwrap_or(NaiveDate::MIN);
                let end = end.unwrap_or(NaiveDate::MAX);
                if start > end {
                    return Err(ApiError::BadRequest(format!("start {start} is after end {end}")));
                }
                Ok(Some(DateRange::new(start, end)))
            }
        }
    }

    fn selection(&self) -> Result<Selection, ApiError> {
        let stations = self.stations.as_deref().map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        });
        Ok(Selection {
            stations,
            range: self.range()?,
        })
    }

    fn measurement(&self) -> Result<Measurement, ApiError> {
        match self.measurement.as_deref() {
            None => Ok(Measurement::Pm25),
            Some(name) => name.parse().map_err(|e| ApiError::BadRequest(format!("{e}"))),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Station list and load quality of the current dataset
pub async fn list_stations(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let overview = state.dashboard_service.overview().await?;
    tracing::debug!("Listing {} stations", overview.stations.len());
    Ok(json_response(StationsResponse::from(overview)))
}

/// Normalized records for the selection
pub async fn list_records(
    Query(query): Query<ViewQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let selection = query.selection()?;
    let records = state.dashboard_service.records(&selection).await?;
    tracing::debug!("Returning {} records", records.len());
    Ok(json_response(RecordsResponse::from(records)))
}

/// Daily mean per station over time
pub async fn trend(
    Query(query): Query<ViewQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let (selection, measurement) = (query.selection()?, query.measurement()?);
    let trends = state.dashboard_service.trend(&selection, measurement).await?;
    Ok(json_response(trends))
}

/// Correlation between all measurements
pub async fn correlation(
    Query(query): Query<ViewQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let selection = query.selection()?;
    let matrix = state.dashboard_service.correlation(&selection).await?;
    Ok(json_response(matrix))
}

/// Distribution of one measurement per station
pub async fn comparison(
    Query(query): Query<ViewQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let (selection, measurement) = (query.selection()?, query.measurement()?);
    let summaries = state.dashboard_service.comparison(&selection, measurement).await?;
    Ok(json_response(summaries))
}

/// Daily history and forecast for one station
pub async fn forecast(
    Path(station): Path<String>,
    Query(query): Query<ViewQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let (range, measurement) = (query.range()?, query.measurement()?);
    let view = state
        .dashboard_service
        .forecast(&station, range, measurement)
        .await?;
    Ok(json_response(ForecastResponse::from(view)))
}
