//! Analytics forwarding target.

use std::time::Duration;
use url::Url;

/// Where and how donation / campaign events are forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsConfig {
    pub url: Url,
    /// Sent as the `x-api-key` header.
    pub api_key: String,
    /// Timeout of a single delivery attempt.
    pub timeout: Duration,
    /// Retries after the first failed attempt.
    pub retry_attempts: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub retry_delay: Duration,
}

impl AnalyticsConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

    pub fn new(url: Url, api_key: impl Into<String>) -> Self {
        Self {
            url,
            api_key: api_key.into(),
            timeout: Self::DEFAULT_TIMEOUT,
            retry_attempts: Self::DEFAULT_RETRY_ATTEMPTS,
            retry_delay: Self::DEFAULT_RETRY_DELAY,
        }
    }
}
