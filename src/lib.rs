//! Air-quality dashboard backend.
//!
//! Loads hourly station measurements, normalizes their timestamps, builds
//! per-station daily series and forecasts them with a fixed-order ARIMA model.
//! The dashboard views are served as JSON over HTTP.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
