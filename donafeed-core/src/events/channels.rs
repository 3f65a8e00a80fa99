//! Event channel factories and handles.

use donafeed_sdk::objects::{RawEvent, ServerEvent, StreamSignal};
use tokio::sync::{broadcast, mpsc};

/// Default buffer size for point-to-point channels.
///
/// This provides enough buffer to handle bursts while keeping memory bounded.
pub const DEFAULT_CHANNEL_BUFFER: usize = 256;

/// Capacity of the live fan-out broadcast. Receivers that fall further
/// behind than this skip the oldest messages.
pub const LIVE_BROADCAST_CAPACITY: usize = 256;

/// Sender handle for live stream messages.
pub type LiveEventSender = broadcast::Sender<ServerEvent>;
/// Receiver handle for live stream messages.
pub type LiveEventReceiver = broadcast::Receiver<ServerEvent>;

/// Sender handle for events queued for analytics.
pub type AnalyticsSender = mpsc::Sender<RawEvent>;
/// Receiver handle for events queued for analytics.
pub type AnalyticsReceiver = mpsc::Receiver<RawEvent>;

/// Sender handle for stream client signals.
pub type StreamSignalSender = mpsc::Sender<StreamSignal>;
/// Receiver handle for stream client signals.
pub type StreamSignalReceiver = mpsc::Receiver<StreamSignal>;

/// Create the live broadcast. Subscribers are added with
/// [`broadcast::Sender::subscribe`].
pub fn live_event_channel() -> LiveEventSender {
    let (tx, _) = broadcast::channel(LIVE_BROADCAST_CAPACITY);
    tx
}

/// Create a new analytics channel.
pub fn analytics_channel() -> (AnalyticsSender, AnalyticsReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}

/// Create a new stream signal channel.
pub fn stream_signal_channel() -> (StreamSignalSender, StreamSignalReceiver) {
    mpsc::channel(DEFAULT_CHANNEL_BUFFER)
}
