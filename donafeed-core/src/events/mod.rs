//! Channel plumbing between the feed's processors.
//!
//! # Event Flow
//!
//! 1. `POST /webhook` hands a batch to the `WebhookIngestor`
//! 2. `WebhookIngestor` admits events into the `EventBuffer`, publishes
//!    `ServerEvent`s on the live broadcast and queues `RawEvent`s for analytics
//! 3. `AnalyticsForwarder` delivers queued `RawEvent`s to the analytics endpoint
//! 4. On the consumer side, the stream client emits `StreamSignal`s which the
//!    `StreamListener` applies to its own `EventBuffer`

pub mod channels;

pub use channels::{
    AnalyticsReceiver, AnalyticsSender, DEFAULT_CHANNEL_BUFFER, LIVE_BROADCAST_CAPACITY,
    LiveEventReceiver, LiveEventSender, StreamSignalReceiver, StreamSignalSender,
    analytics_channel, live_event_channel, stream_signal_channel,
};
