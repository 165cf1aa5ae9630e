// Application layer - Pipeline stages and dashboard use cases
pub mod analytics;
pub mod dashboard_service;
pub mod dataset_cache;
pub mod dataset_source;
pub mod forecaster;
pub mod normalizer;
pub mod series_extractor;
