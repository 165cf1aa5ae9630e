// Presentation layer - HTTP routes for the dashboard front end
pub mod app_state;
pub mod handlers;
pub mod responses;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    comparison, correlation, forecast, health_check, list_records, list_stations, trend,
};
use axum::{routing::get, Router};
use std::sync::Arc;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/stations", get(list_stations))
        .route("/records", get(list_records))
        .route("/trend", get(trend))
        .route("/correlation", get(correlation))
        .route("/comparison", get(comparison))
        .route("/forecast/:station", get(forecast))
        .with_state(state)
}
