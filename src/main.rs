// Load configuration
// Set up logging
// Initialize caches and upstream client
// Start ingestion polling task (optional)
// Start HTTP server

use mining_stats_service::{api, config::Config, service, state::AppState};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting mining-stats-service");

    // Load configuration
    let config = Config::from_env();
    tracing::info!(
        "Configuration loaded: credentials {:?}, cache dir {}, durable live stats: {}",
        config.credentials,
        config.cache_dir.display(),
        config.mining_stats_durable
    );
    if config.cron_secret.is_none() {
        tracing::warn!("CRON_SECRET not set, ingestion endpoints will reject every request");
    }

    // Create shared state
    let app_state = Arc::new(AppState::from_config(config.clone()).await?);

    let shutdown = CancellationToken::new();

    // Start ingestion polling task
    let polling_handle = config.ingest_interval.map(|period| {
        let polling_state = app_state.clone();
        let polling_shutdown = shutdown.clone();
        tokio::spawn(async move {
            service::polling::start_polling(polling_state, period, polling_shutdown).await;
        })
    });
    if polling_handle.is_none() {
        tracing::info!("In-process ingestion disabled, relying on external triggers");
    }

    // Start HTTP server
    let app = api::create_router(app_state);
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting server on {}", addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    if let Some(handle) = polling_handle {
        let _ = handle.await;
    }

    Ok(())
}
