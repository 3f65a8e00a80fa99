//! WebSocket client for `GET /events/ws`.
//!
//! The client keeps one connection open, translates frames into
//! [`StreamSignal`]s and reconnects with exponential backoff when the
//! connection drops.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};
use url::Url;

use super::ClientError;
use crate::objects::{ServerEvent, StreamSignal};

/// Reconnect attempts before the client gives up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// First reconnect delay; doubled on every further attempt.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Long-running client for the live event stream.
#[derive(Debug, Clone)]
pub struct EventStreamClient {
    endpoint: Url,
    max_reconnect_attempts: u32,
    base_delay: Duration,
}

/// How a single connection ended.
enum SessionEnd {
    Shutdown,
    Closed,
    Failed(String),
}

impl EventStreamClient {
    /// Create a client for the given `ws://` or `wss://` endpoint.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Override the reconnect policy.
    pub fn with_reconnect_policy(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self.base_delay = base_delay;
        self
    }

    /// Run until shutdown is signaled or reconnecting is exhausted.
    ///
    /// Signals are pushed into `signals` in the order they are observed.
    /// A failed connection produces `Failed` followed by `Disconnected`.
    pub async fn run(
        self,
        signals: mpsc::Sender<StreamSignal>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), ClientError> {
        let mut attempts = 0u32;

        loop {
            let end = match tokio_tungstenite::connect_async(self.endpoint.as_str()).await {
                Ok((socket, _response)) => {
                    info!(endpoint = %self.endpoint, "Live stream connection established");
                    attempts = 0;
                    signals
                        .send(StreamSignal::Connected)
                        .await
                        .map_err(|_| ClientError::ChannelClosed)?;
                    Self::drive(socket, &signals, &mut shutdown_rx).await?
                }
                Err(e) => SessionEnd::Failed(e.to_string()),
            };

            match end {
                SessionEnd::Shutdown => {
                    let _ = signals.send(StreamSignal::Disconnected).await;
                    info!("Live stream client shutting down");
                    return Ok(());
                }
                SessionEnd::Closed => {
                    warn!(endpoint = %self.endpoint, "Live stream closed by server");
                }
                SessionEnd::Failed(reason) => {
                    error!(endpoint = %self.endpoint, error = %reason, "Live stream connection error");
                    signals
                        .send(StreamSignal::Failed(reason))
                        .await
                        .map_err(|_| ClientError::ChannelClosed)?;
                }
            }
            signals
                .send(StreamSignal::Disconnected)
                .await
                .map_err(|_| ClientError::ChannelClosed)?;

            if attempts >= self.max_reconnect_attempts {
                return Err(ClientError::ReconnectExhausted { attempts });
            }

            let delay = reconnect_delay(self.base_delay, attempts);
            debug!(attempt = attempts + 1, delay_ms = delay.as_millis() as u64, "Reconnecting");
            tokio::select! {
                biased;
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        return Ok(());
                    }
                }
                _ = tokio::time::sleep(delay) => {}
            }
            attempts += 1;
        }
    }

    /// Relay frames of one open connection until it ends.
    async fn drive<S>(
        mut socket: S,
        signals: &mpsc::Sender<StreamSignal>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd, ClientError>
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        loop {
            tokio::select! {
                biased;

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        return Ok(SessionEnd::Shutdown);
                    }
                }

                frame = socket.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(signal) = decode_frame(&text) {
                                signals
                                    .send(signal)
                                    .await
                                    .map_err(|_| ClientError::ChannelClosed)?;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => return Ok(SessionEnd::Closed),
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Ok(SessionEnd::Failed(e.to_string())),
                    }
                }
            }
        }
    }
}

/// Translate one text frame into a signal.
///
/// Pings and connection greetings carry no feed data and yield `None`, as
/// do frames that fail to parse.
pub fn decode_frame(text: &str) -> Option<StreamSignal> {
    match serde_json::from_str::<ServerEvent>(text) {
        Ok(ServerEvent::Webhook(event)) => Some(StreamSignal::Event(event)),
        Ok(ServerEvent::Connection { client_count, .. }) => {
            debug!(client_count, "Live stream greeting received");
            None
        }
        Ok(ServerEvent::Ping { .. }) => None,
        Err(e) => {
            warn!(error = %e, "Failed to parse live stream frame");
            None
        }
    }
}

/// Backoff delay before reconnect attempt `attempt` (zero-based).
pub fn reconnect_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}
