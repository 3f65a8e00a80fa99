//! Axum server setup, router configuration and background stream tasks.

use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::{Json, Router, response::IntoResponse, routing::get};
use donafeed_core::config::StreamConfig;
use donafeed_sdk::objects::{ServerEvent, iso_timestamp};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .merge(crate::api::router())
        // Add state to all routes
        .with_state(state)
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Simple health check - returns OK if the server is running.
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Run the server with graceful shutdown support.
pub async fn run_server(router: Router, addr: SocketAddr) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Spawn the task that keeps stream clients alive.
///
/// Broadcasts a `ping` every `ping_interval` while at least one client is
/// connected, and logs the client count every `monitor_interval`. Both
/// timers are rebuilt when the stream section is reloaded.
pub fn spawn_stream_keepalive(
    state: AppState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut config_watcher = state.config.stream.subscribe();
        let (mut ping, mut monitor) = timers(&state.config.stream.snapshot());

        loop {
            tokio::select! {
                biased;

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::debug!("Stream keepalive shutting down");
                        break;
                    }
                }

                Ok(config) = config_watcher.changed() => {
                    (ping, monitor) = timers(&config);
                    tracing::info!(
                        ping_secs = config.ping_interval.as_secs(),
                        monitor_secs = config.monitor_interval.as_secs(),
                        "Stream timings reloaded"
                    );
                }

                _ = ping.tick() => {
                    if state.stream_clients() > 0 {
                        // Receivers may all have gone between the check and the send.
                        let _ = state.live_tx.send(ServerEvent::Ping {
                            timestamp: iso_timestamp(),
                        });
                    }
                }

                _ = monitor.tick() => {
                    tracing::info!(clients = state.stream_clients(), "Active stream clients");
                }
            }
        }
    })
}

fn timers(config: &StreamConfig) -> (Interval, Interval) {
    (ticker(config.ping_interval), ticker(config.monitor_interval))
}

/// An interval whose first tick is one full period away.
fn ticker(period: Duration) -> Interval {
    let period = period.max(Duration::from_millis(1));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
