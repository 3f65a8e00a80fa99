//! Donafeed Server
//!
//! Receives on-chain donation notifications over a webhook, keeps the most
//! recent ones in memory and streams them live to connected clients.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::ConfigLoader;
use donafeed_core::buffer::EventBuffer;
use donafeed_core::config::SharedConfig;
use donafeed_core::events::{analytics_channel, live_event_channel};
use donafeed_core::processors::{AnalyticsForwarder, WebhookIngestor};
use server::{build_router, run_server, spawn_stream_keepalive};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Donafeed - live feed of on-chain donation events
#[derive(Parser, Debug)]
#[command(name = "donafeed-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./donafeed.toml", env = "DONAFEED_CONFIG")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting donafeed-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);
    if loaded_config.analytics.is_none() {
        tracing::info!("No [analytics] section configured, forwarding disabled");
    }

    let shared_config = SharedConfig::new(
        loaded_config.ingest,
        loaded_config.stream,
        loaded_config.analytics,
    );

    // Event plumbing
    let buffer = EventBuffer::new(loaded_config.buffer_capacity);
    let live_tx = live_event_channel();
    let (analytics_tx, analytics_rx) = analytics_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let forwarder = AnalyticsForwarder::new(shared_config.analytics.clone());
    let forwarder_handle = tokio::spawn(forwarder.run(shutdown_rx.clone(), analytics_rx));

    let ingestor = WebhookIngestor::new(
        buffer.clone(),
        live_tx.clone(),
        shared_config.ingest.clone(),
    )
    .with_analytics(analytics_tx);

    // Create application state
    let state = AppState::new(buffer, live_tx, ingestor, shared_config);

    let keepalive_handle = spawn_stream_keepalive(state.clone(), shutdown_rx);

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify =
        spawn_config_reload_handler(state.clone(), config_loader, listen_addr);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop background tasks
    reload_notify.notify_one();
    let _ = shutdown_tx.send(true);
    if let Err(e) = forwarder_handle.await {
        tracing::error!(error = %e, "Analytics forwarder task failed");
    }
    if let Err(e) = keepalive_handle.await {
        tracing::error!(error = %e, "Stream keepalive task failed");
    }
    tracing::info!("Server shutdown complete");

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
