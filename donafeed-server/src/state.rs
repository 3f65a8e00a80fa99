//! Application state shared across all request handlers.

use donafeed_core::buffer::EventBuffer;
use donafeed_core::config::SharedConfig;
use donafeed_core::events::LiveEventSender;
use donafeed_core::processors::WebhookIngestor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// The server's event buffer, fed by the ingestor.
    pub buffer: EventBuffer,
    /// Live broadcast relayed to stream clients.
    pub live_tx: LiveEventSender,
    /// Webhook batch processor.
    pub ingestor: Arc<WebhookIngestor>,
    /// Reloadable configuration sections.
    pub config: SharedConfig,
    stream_clients: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(
        buffer: EventBuffer,
        live_tx: LiveEventSender,
        ingestor: WebhookIngestor,
        config: SharedConfig,
    ) -> Self {
        Self {
            buffer,
            live_tx,
            ingestor: Arc::new(ingestor),
            config,
            stream_clients: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of connected stream clients.
    pub fn stream_clients(&self) -> usize {
        self.stream_clients.load(Ordering::Relaxed)
    }

    /// Register a stream client. The count drops again when the guard does.
    pub fn register_stream_client(&self) -> StreamClientGuard {
        let count = self.stream_clients.fetch_add(1, Ordering::Relaxed) + 1;
        StreamClientGuard {
            counter: self.stream_clients.clone(),
            count,
        }
    }
}

/// Keeps a stream client counted while alive.
pub struct StreamClientGuard {
    counter: Arc<AtomicUsize>,
    count: usize,
}

impl StreamClientGuard {
    /// Client count right after this client registered.
    pub fn count_at_registration(&self) -> usize {
        self.count
    }
}

impl Drop for StreamClientGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::Relaxed);
    }
}

/// State with default configuration and no analytics.
#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    use donafeed_core::config::{IngestConfig, StreamConfig};
    use donafeed_core::events::live_event_channel;

    let buffer = EventBuffer::default();
    let live_tx = live_event_channel();
    let config = SharedConfig::new(IngestConfig::default(), StreamConfig::default(), None);
    let ingestor = WebhookIngestor::new(buffer.clone(), live_tx.clone(), config.ingest.clone());
    AppState::new(buffer, live_tx, ingestor, config)
}
