// Initialize configuration
// Set up logging
// Connect to the database and apply the schema
// Backfill history on first start
// Run the daily collection loop until Ctrl-C

use chain_metrics_service::{
    collector::bootstrap::bootstrap_store, config::Config, db::DeltaStore, scheduler,
    state::AppState,
};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
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

    // Load configuration
    let config = Config::from_env()?;
    info!("Starting metrics collector for network: {}", config.network);

    // Setup database connection
    let store = DeltaStore::connect(&config).await?;
    info!("Database connection established");

    let state = Arc::new(AppState::new(config, store)?);

    bootstrap_store(&state).await?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal.cancel();
        }
    });

    scheduler::run_daily(state.clone(), shutdown).await;

    state.store.close().await;
    info!("Metrics collector stopped");
    Ok(())
}
