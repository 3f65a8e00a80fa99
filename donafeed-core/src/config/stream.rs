//! Live stream timings.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Interval between keep-alive pings sent to every stream client.
    pub ping_interval: Duration,
    /// Interval between "active clients" log lines.
    pub monitor_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            monitor_interval: Duration::from_secs(60),
        }
    }
}
