//! StreamListener processor.
//!
//! Consumer-side counterpart of the live stream: applies the signals
//! produced by the stream client to a local `EventBuffer`.

use crate::buffer::{DeliveryError, EventBuffer};
use crate::events::StreamSignalReceiver;
use compact_str::CompactString;
use donafeed_sdk::objects::StreamSignal;
use kanau::processor::Processor;
use std::convert::Infallible;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Feeds stream client signals into an [`EventBuffer`].
pub struct StreamListener {
    buffer: EventBuffer,
    /// Event types to keep; empty keeps everything.
    event_types: Vec<CompactString>,
}

impl StreamListener {
    pub fn new(buffer: EventBuffer) -> Self {
        Self {
            buffer,
            event_types: Vec::new(),
        }
    }

    /// Only admit events whose type is in `event_types`.
    pub fn with_event_types(mut self, event_types: Vec<CompactString>) -> Self {
        self.event_types = event_types;
        self
    }

    /// Run until shutdown is signaled or the signal channel closes.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>, mut signal_rx: StreamSignalReceiver) {
        info!("StreamListener started");

        loop {
            tokio::select! {
                biased;

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("StreamListener received shutdown signal");
                        break;
                    }
                }

                signal = signal_rx.recv() => {
                    let Some(signal) = signal else {
                        info!("Stream signal channel closed");
                        break;
                    };
                    let _ = self.process(signal).await;
                }
            }
        }

        info!("StreamListener shutdown complete");
    }
}

impl Processor<StreamSignal> for StreamListener {
    type Output = ();
    type Error = Infallible;

    async fn process(&self, signal: StreamSignal) -> Result<(), Infallible> {
        match signal {
            StreamSignal::Connected => {
                debug!("Live stream connected");
                self.buffer.set_connected(true);
            }
            StreamSignal::Disconnected => {
                debug!("Live stream disconnected");
                self.buffer.set_connected(false);
            }
            StreamSignal::Failed(reason) => {
                warn!(error = %reason, "Live stream failed");
                self.buffer.set_error(Some(DeliveryError::new(reason)));
            }
            StreamSignal::Event(event) => {
                if self.event_types.is_empty() || self.event_types.contains(&event.event_type) {
                    self.buffer.admit(event);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::stream_signal_channel;
    use donafeed_sdk::objects::{EventPayload, WebhookEvent};

    fn event(ts: &str, kind: &str) -> WebhookEvent {
        WebhookEvent::new(kind, ts, EventPayload::default())
    }

    #[tokio::test]
    async fn test_signals_drive_buffer_status() {
        let buffer = EventBuffer::default();
        let listener = StreamListener::new(buffer.clone());

        listener.process(StreamSignal::Connected).await.unwrap();
        assert!(buffer.snapshot().connected());

        listener
            .process(StreamSignal::Failed("connection reset".into()))
            .await
            .unwrap();
        let state = buffer.snapshot();
        assert!(!state.connected());
        assert_eq!(state.error().map(|e| e.message()), Some("connection reset"));

        listener.process(StreamSignal::Disconnected).await.unwrap();
        assert!(buffer.snapshot().error().is_some());

        listener.process(StreamSignal::Connected).await.unwrap();
        assert!(buffer.snapshot().error().is_none());
    }

    #[tokio::test]
    async fn test_type_filter() {
        let buffer = EventBuffer::default();
        let listener = StreamListener::new(buffer.clone())
            .with_event_types(vec!["donation_received".into()]);

        listener
            .process(StreamSignal::Event(event("t1", "campaign_created")))
            .await
            .unwrap();
        listener
            .process(StreamSignal::Event(event("t2", "donation_received")))
            .await
            .unwrap();

        let state = buffer.snapshot();
        assert_eq!(state.len(), 1);
        assert_eq!(state.last_processed_timestamp(), Some("t2"));
    }

    #[tokio::test]
    async fn test_run_drains_channel() {
        let buffer = EventBuffer::default();
        let (signal_tx, signal_rx) = stream_signal_channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);

        signal_tx.send(StreamSignal::Connected).await.unwrap();
        signal_tx
            .send(StreamSignal::Event(event("t1", "donation_received")))
            .await
            .unwrap();
        drop(signal_tx);

        StreamListener::new(buffer.clone())
            .run(shutdown_rx, signal_rx)
            .await;

        let state = buffer.snapshot();
        assert!(state.connected());
        assert_eq!(state.len(), 1);
    }
}
