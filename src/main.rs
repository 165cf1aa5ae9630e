// Main entry point - Dependency injection and server setup
use std::net::SocketAddr;
use std::sync::Arc;

use air_quality_dashboard::application::dashboard_service::DashboardService;
use air_quality_dashboard::application::dataset_cache::DatasetCache;
use air_quality_dashboard::application::forecaster::Forecaster;
use air_quality_dashboard::infrastructure::config::load_dashboard_config;
use air_quality_dashboard::infrastructure::sources::source_for;
use air_quality_dashboard::presentation::app_state::AppState;
use air_quality_dashboard::presentation::create_router;
use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,air_quality_dashboard=debug")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    tracing::info!("Loaded configuration: {:?}", config);

    // Dataset source and cache (infrastructure + application layers)
    let source = source_for(&config.dataset)?;
    let cache = Arc::new(DatasetCache::new(source, config.dataset.cache_ttl()));

    let forecaster = Forecaster::new(config.forecast.policy());
    let dashboard_service = DashboardService::new(cache, forecaster);

    let state = Arc::new(AppState { dashboard_service });

    // Build router (presentation layer)
    let router = create_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_addr))?;
    tracing::info!("Starting air-quality dashboard on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
