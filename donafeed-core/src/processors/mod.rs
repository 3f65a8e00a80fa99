//! Event processors of the donation feed.
//!
//! - `WebhookIngestor`: receives webhook batches, feeds the buffer, the live
//!   broadcast and the analytics queue
//! - `AnalyticsForwarder`: receives `RawEvent`s, delivers them to analytics
//! - `StreamListener`: receives `StreamSignal`s, feeds a consumer-side buffer

pub mod analytics;
pub mod ingestor;
pub mod listener;
pub mod metadata;

pub use analytics::{AnalyticsForwarder, ForwardError};
pub use ingestor::{IngestError, WebhookBatch, WebhookIngestor};
pub use listener::StreamListener;
