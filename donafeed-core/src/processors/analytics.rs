//! AnalyticsForwarder processor.
//!
//! The AnalyticsForwarder is responsible for:
//! - Receiving `RawEvent`s queued by the `WebhookIngestor`
//! - POSTing them as `{"user_data": <event>}` to the analytics endpoint
//! - Retrying failed deliveries with exponential backoff
//!
//! Delivery failures are logged and dropped; they never affect the event
//! buffer. Forwarding is skipped while no analytics target is configured.

use crate::config::{AnalyticsConfig, ConfigStore};
use crate::events::AnalyticsReceiver;
use donafeed_sdk::objects::RawEvent;
use kanau::processor::Processor;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// `User-Agent` sent with every analytics request.
pub const USER_AGENT: &str = concat!("donafeed-analytics/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur during analytics delivery.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// HTTP request error (includes timeouts)
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("analytics webhook failed with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Serialize)]
struct AnalyticsEnvelope<'a> {
    user_data: &'a RawEvent,
}

/// Forwards donation and campaign events to the analytics endpoint.
pub struct AnalyticsForwarder {
    http_client: reqwest::Client,
    config: ConfigStore<Option<AnalyticsConfig>>,
}

impl AnalyticsForwarder {
    pub fn new(config: ConfigStore<Option<AnalyticsConfig>>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
        }
    }

    /// Run until shutdown is signaled or the queue closes.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>, mut event_rx: AnalyticsReceiver) {
        info!("AnalyticsForwarder started");

        loop {
            tokio::select! {
                biased;

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("AnalyticsForwarder received shutdown signal");
                        break;
                    }
                }

                event = event_rx.recv() => {
                    let Some(event) = event else {
                        info!("Analytics channel closed");
                        break;
                    };
                    tokio::select! {
                        biased;

                        () = shutdown_requested(&mut shutdown_rx) => {
                            warn!("AnalyticsForwarder received shutdown signal, abandoning in-flight delivery");
                            break;
                        }

                        result = self.process(event) => {
                            if let Err(e) = result {
                                error!(error = %e, "Failed to forward event to analytics");
                            }
                        }
                    }
                }
            }
        }

        info!("AnalyticsForwarder shutdown complete");
    }

    async fn deliver(&self, config: &AnalyticsConfig, event: &RawEvent) -> Result<(), ForwardError> {
        let response = self
            .http_client
            .post(config.url.clone())
            .timeout(config.timeout)
            .header("User-Agent", USER_AGENT)
            .header("x-api-key", &config.api_key)
            .json(&AnalyticsEnvelope { user_data: event })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ForwardError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl Processor<RawEvent> for AnalyticsForwarder {
    type Output = ();
    type Error = ForwardError;

    async fn process(&self, event: RawEvent) -> Result<(), ForwardError> {
        let config = self.config.snapshot();
        let Some(config) = config.as_ref() else {
            debug!("Analytics not configured, skipping event");
            return Ok(());
        };

        let mut attempt = 0;
        loop {
            match self.deliver(config, &event).await {
                Ok(()) => {
                    debug!(kind = %event.parsed_data.kind, attempt, "Event forwarded to analytics");
                    return Ok(());
                }
                Err(e) if attempt < config.retry_attempts => {
                    let delay = retry_delay(config.retry_delay, attempt);
                    warn!(
                        error = %e,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Analytics delivery failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Resolves once shutdown is signaled. Never resolves if the sender is
/// dropped without signaling.
async fn shutdown_requested(shutdown_rx: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown_rx.borrow_and_update() {
            return;
        }
        if shutdown_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Delay before retry number `attempt` (zero-based): `base * 2^attempt`.
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}
