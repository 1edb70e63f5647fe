//! Sports Tracker Server
//!
//! Polls live scores for events marked live and publishes every update to a
//! messaging topic.

mod api;
mod config;
mod publishers;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use server::{build_router, run_server};
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracker_core::clients::HttpScoreFetcher;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Sports Tracker - live score polling and publishing service
#[derive(Parser, Debug)]
#[command(name = "tracker-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "TRACKER_CONFIG", default_value = "./tracker-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Serve the mock score source regardless of the config file
    #[arg(long, default_value = "false")]
    mock_api: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting tracker-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = ConfigLoader::new(&args.config, args.listen);
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let listen_addr = loaded_config.server.listen;
    let mock_api = loaded_config.server.mock_api || args.mock_api;
    let shutdown_grace = loaded_config.polling.shutdown_grace;

    // Collaborators
    let fetcher = Arc::new(HttpScoreFetcher::new(
        loaded_config.external_api.url.clone(),
        loaded_config.external_api.timeout,
    ));
    tracing::info!(endpoint = %fetcher.endpoint(), "Fetching scores over HTTP");

    let publisher = publishers::build_publisher(&loaded_config.messaging).map_err(|e| {
        tracing::error!("Failed to create message publisher: {}", e);
        e
    })?;

    // Create application state
    let state = AppState::new(&loaded_config.polling, fetcher, publisher);

    // Build the router
    let router = build_router(state.clone(), mock_api);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop polling, letting in-flight ticks finish within the grace period
    tracing::info!("Stopping polling scheduler...");
    let report = state.scheduler.shutdown(shutdown_grace).await;
    state.registry.clear();
    tracing::info!(
        cancelled_timers = report.cancelled_timers,
        abandoned_ticks = report.abandoned_ticks,
        "Server shutdown complete"
    );

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
