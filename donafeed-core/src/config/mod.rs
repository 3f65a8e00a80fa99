//! Runtime configuration types for the donation feed.
//!
//! These are the validated forms of the server's TOML sections. Parsing and
//! validation live in the server crate; the processors here only read them.

mod analytics;
mod config_store;
mod ingest;
mod stream;

pub use analytics::AnalyticsConfig;
pub use config_store::{ConfigStore, ConfigWatcher};
pub use ingest::IngestConfig;
pub use stream::StreamConfig;

/// Reloadable configuration shared between the server and the processors.
///
/// Each section sits in its own [`ConfigStore`] so that a SIGHUP reload
/// only wakes the processors whose section was swapped.
#[derive(Clone)]
pub struct SharedConfig {
    /// Batch limits for webhook ingestion.
    pub ingest: ConfigStore<IngestConfig>,
    /// Live stream timings.
    pub stream: ConfigStore<StreamConfig>,
    /// Analytics forwarding target; `None` disables forwarding.
    pub analytics: ConfigStore<Option<AnalyticsConfig>>,
}

impl SharedConfig {
    pub fn new(
        ingest: IngestConfig,
        stream: StreamConfig,
        analytics: Option<AnalyticsConfig>,
    ) -> Self {
        Self {
            ingest: ConfigStore::new(ingest),
            stream: ConfigStore::new(stream),
            analytics: ConfigStore::new(analytics),
        }
    }
}
