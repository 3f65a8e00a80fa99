//! Bounded, most-recent-first store of feed events.
//!
//! [`EventBuffer`] is a cheap, cloneable handle. The state it guards is
//! published as an immutable [`BufferState`] snapshot through a
//! `tokio::sync::watch` channel. Every mutation is applied to the snapshot
//! copy-on-write while the channel's write lock is held, so:
//!
//! - a mutation is one indivisible transition (an admit never shows up
//!   half-applied),
//! - a snapshot obtained by a reader never changes underneath it,
//! - subscribers are woken once per transition.

pub mod selectors;

pub use selectors::{EventFilter, select_by_campaign, select_by_type, select_by_user};

use std::collections::VecDeque;
use std::sync::Arc;

use compact_str::CompactString;
use donafeed_sdk::objects::WebhookEvent;
use tokio::sync::watch;

/// Maximum number of events kept in memory.
pub const MAX_EVENTS: usize = 1000;

/// Failure of the upstream event source.
///
/// All upstream failures (dropped connection, malformed payload, ...) are
/// collapsed into this one category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("delivery error: {message}")]
pub struct DeliveryError {
    message: CompactString,
}

impl DeliveryError {
    pub fn new(message: impl Into<CompactString>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One consistent view of the buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferState {
    events: VecDeque<Arc<WebhookEvent>>,
    connected: bool,
    last_processed_timestamp: Option<String>,
    error: Option<DeliveryError>,
}

impl BufferState {
    /// Events, newest first.
    pub fn events(&self) -> impl ExactSizeIterator<Item = &WebhookEvent> + DoubleEndedIterator {
        self.events.iter().map(|e| e.as_ref())
    }

    /// Event at position `index` (0 is the newest).
    pub fn get(&self, index: usize) -> Option<&WebhookEvent> {
        self.events.get(index).map(|e| e.as_ref())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn last_processed_timestamp(&self) -> Option<&str> {
        self.last_processed_timestamp.as_deref()
    }

    pub fn error(&self) -> Option<&DeliveryError> {
        self.error.as_ref()
    }
}

/// Receives a fresh snapshot whenever the buffer changes.
pub struct BufferWatcher {
    rx: watch::Receiver<Arc<BufferState>>,
}

impl BufferWatcher {
    /// Wait for the next transition.
    ///
    /// Returns `Err` once every [`EventBuffer`] handle has been dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }

    /// The most recent snapshot, marking it as seen.
    pub fn snapshot(&mut self) -> Arc<BufferState> {
        self.rx.borrow_and_update().clone()
    }
}

/// Handle to a bounded event buffer.
///
/// Constructed once by the application and passed to every producer and
/// consumer; clones share the same state.
#[derive(Clone)]
pub struct EventBuffer {
    tx: Arc<watch::Sender<Arc<BufferState>>>,
    capacity: usize,
}

impl EventBuffer {
    /// Create an empty buffer holding at most `capacity` events.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = watch::channel(Arc::new(BufferState::default()));
        Self {
            tx: Arc::new(tx),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current state. The returned snapshot is never mutated.
    pub fn snapshot(&self) -> Arc<BufferState> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> BufferWatcher {
        BufferWatcher {
            rx: self.tx.subscribe(),
        }
    }

    /// Prepend `event`, evicting the oldest events beyond capacity.
    pub fn admit(&self, event: WebhookEvent) {
        let capacity = self.capacity;
        self.transition(move |state| {
            state.last_processed_timestamp = Some(event.timestamp.clone());
            state.events.push_front(Arc::new(event));
            state.events.truncate(capacity);
        });
    }

    /// Record upstream liveness. Reasserting liveness clears the error.
    pub fn set_connected(&self, connected: bool) {
        self.transition(|state| {
            state.connected = connected;
            if connected {
                state.error = None;
            }
        });
    }

    /// Record (or clear) an upstream failure. Always marks the source as
    /// disconnected.
    pub fn set_error(&self, error: Option<DeliveryError>) {
        self.transition(|state| {
            state.error = error;
            state.connected = false;
        });
    }

    /// Drop every event. Connection status and error are kept.
    pub fn clear(&self) {
        self.transition(|state| {
            state.events.clear();
            state.last_processed_timestamp = None;
        });
    }

    fn transition(&self, apply: impl FnOnce(&mut BufferState)) {
        self.tx.send_modify(|state| apply(Arc::make_mut(state)));
    }
}

impl Default for EventBuffer {
    fn default() -> Self {
        Self::new(MAX_EVENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use donafeed_sdk::objects::EventPayload;

    fn event(ts: &str) -> WebhookEvent {
        WebhookEvent::new("donation_received", ts, EventPayload::default())
    }

    fn timestamps(state: &BufferState) -> Vec<&str> {
        state.events().map(|e| e.timestamp.as_str()).collect()
    }

    #[test]
    fn test_admit_is_newest_first() {
        let buffer = EventBuffer::default();
        for ts in ["t1", "t2", "t3", "t4", "t5"] {
            buffer.admit(event(ts));
        }
        let state = buffer.snapshot();
        assert_eq!(timestamps(&state), vec!["t5", "t4", "t3", "t2", "t1"]);
        assert_eq!(state.last_processed_timestamp(), Some("t5"));
    }

    #[test]
    fn test_admit_sets_front_and_last_processed() {
        let buffer = EventBuffer::new(3);
        for i in 0..10 {
            let e = event(&format!("t{i}"));
            buffer.admit(e.clone());
            let state = buffer.snapshot();
            assert_eq!(state.get(0), Some(&e));
            assert_eq!(state.last_processed_timestamp(), Some(e.timestamp.as_str()));
            assert!(state.len() <= 3);
        }
    }

    #[test]
    fn test_capacity_eviction_drops_oldest() {
        let buffer = EventBuffer::default();
        for i in 0..=MAX_EVENTS {
            buffer.admit(event(&format!("t{i}")));
        }
        let state = buffer.snapshot();
        assert_eq!(state.len(), MAX_EVENTS);
        assert!(state.events().all(|e| e.timestamp != "t0"));
        assert_eq!(state.get(0).unwrap().timestamp, format!("t{MAX_EVENTS}"));
        assert_eq!(state.get(MAX_EVENTS - 1).unwrap().timestamp, "t1");
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let buffer = EventBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.admit(event("a"));
        buffer.admit(event("b"));
        let state = buffer.snapshot();
        assert_eq!(timestamps(&state), vec!["b"]);
        assert_eq!(state.last_processed_timestamp(), Some("b"));
    }

    #[test]
    fn test_clear_keeps_status() {
        let buffer = EventBuffer::default();
        buffer.admit(event("t1"));
        buffer.set_error(Some(DeliveryError::new("boom")));
        buffer.clear();

        let state = buffer.snapshot();
        assert!(state.is_empty());
        assert_eq!(state.last_processed_timestamp(), None);
        assert_eq!(state.error().map(|e| e.message()), Some("boom"));
        assert!(!state.connected());
        assert!(select_by_type(state.events(), "donation_received").is_empty());
        assert!(select_by_campaign(state.events(), "c").is_empty());
        assert!(select_by_user(state.events(), "u").is_empty());
    }

    #[test]
    fn test_set_connected_true_clears_error() {
        let buffer = EventBuffer::default();
        buffer.set_error(Some(DeliveryError::new("dropped")));
        buffer.set_connected(true);
        let state = buffer.snapshot();
        assert!(state.connected());
        assert!(state.error().is_none());
    }

    #[test]
    fn test_set_connected_false_preserves_error() {
        let buffer = EventBuffer::default();
        buffer.set_error(Some(DeliveryError::new("dropped")));
        buffer.set_connected(false);
        let state = buffer.snapshot();
        assert!(!state.connected());
        assert_eq!(state.error(), Some(&DeliveryError::new("dropped")));
    }

    #[test]
    fn test_set_error_forces_disconnect() {
        let buffer = EventBuffer::default();
        buffer.set_connected(true);
        buffer.set_error(Some(DeliveryError::new("bad payload")));
        assert!(!buffer.snapshot().connected());

        buffer.set_connected(true);
        buffer.set_error(None);
        let state = buffer.snapshot();
        assert!(!state.connected());
        assert!(state.error().is_none());
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_writes() {
        let buffer = EventBuffer::default();
        buffer.admit(event("t1"));
        let before = buffer.snapshot();
        buffer.admit(event("t2"));
        buffer.clear();

        assert_eq!(timestamps(&before), vec!["t1"]);
        assert_eq!(before.last_processed_timestamp(), Some("t1"));
        assert!(buffer.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_watcher_sees_each_transition() {
        let buffer = EventBuffer::default();
        let mut watcher = buffer.subscribe();

        let producer = buffer.clone();
        tokio::spawn(async move {
            producer.admit(event("t1"));
        });

        watcher.changed().await.unwrap();
        let state = watcher.snapshot();
        assert_eq!(timestamps(&state), vec!["t1"]);
    }
}
