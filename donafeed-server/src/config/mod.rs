//! Configuration module for donafeed-server.
//!
//! Handles loading configuration from the TOML file, CLI overrides and
//! environment variables, and converting it into the runtime types used by
//! `donafeed-core`.

pub mod file;

use crate::config::file::{AnalyticsConfig as FileAnalyticsConfig, FileConfig};
use donafeed_core::config::{AnalyticsConfig, IngestConfig, StreamConfig};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable consulted when `[analytics] api_key` is absent.
pub const ANALYTICS_API_KEY_ENV: &str = "ANALYTICS_API_KEY";

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("{ANALYTICS_API_KEY_ENV} environment variable not set and no analytics api_key configured")]
    MissingAnalyticsApiKey,
}

/// Loaded configuration result containing all parts.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listen: SocketAddr,
    pub buffer_capacity: usize,
    pub ingest: IngestConfig,
    pub stream: StreamConfig,
    pub analytics: Option<AnalyticsConfig>,
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Build the runtime configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        self.load_str(&config_content)
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn load_str(&self, content: &str) -> Result<LoadedConfig, ConfigError> {
        let mut file_config: FileConfig = toml::from_str(content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        validate(&file_config)?;
        build_loaded_config(file_config, get_analytics_api_key)
    }
}

fn validate(config: &FileConfig) -> Result<(), ConfigError> {
    if config.buffer.capacity == 0 {
        return Err(ConfigError::ValidationError(
            "buffer capacity must be greater than 0".into(),
        ));
    }
    if config.webhook.max_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "webhook max_batch_size must be greater than 0".into(),
        ));
    }
    if config.stream.ping_interval_secs == 0 || config.stream.monitor_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "stream intervals must be greater than 0".into(),
        ));
    }
    if let Some(analytics) = &config.analytics {
        if !matches!(analytics.url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "analytics url {} must use http or https",
                analytics.url
            )));
        }
    }
    Ok(())
}

fn build_loaded_config(
    file_config: FileConfig,
    env_api_key: impl FnOnce() -> Option<String>,
) -> Result<LoadedConfig, ConfigError> {
    let analytics = file_config
        .analytics
        .map(|a| convert_analytics(a, env_api_key))
        .transpose()?;

    Ok(LoadedConfig {
        listen: file_config.server.listen,
        buffer_capacity: file_config.buffer.capacity,
        ingest: IngestConfig {
            max_batch_size: file_config.webhook.max_batch_size,
        },
        stream: StreamConfig {
            ping_interval: Duration::from_secs(file_config.stream.ping_interval_secs),
            monitor_interval: Duration::from_secs(file_config.stream.monitor_interval_secs),
        },
        analytics,
    })
}

fn convert_analytics(
    a: FileAnalyticsConfig,
    env_api_key: impl FnOnce() -> Option<String>,
) -> Result<AnalyticsConfig, ConfigError> {
    let api_key = a
        .api_key
        .or_else(env_api_key)
        .ok_or(ConfigError::MissingAnalyticsApiKey)?;

    Ok(AnalyticsConfig {
        url: a.url,
        api_key,
        timeout: Duration::from_secs(a.timeout_secs),
        retry_attempts: a.retry_attempts,
        retry_delay: Duration::from_millis(a.retry_delay_ms),
    })
}

/// Get the analytics API key from the environment.
pub fn get_analytics_api_key() -> Option<String> {
    std::env::var(ANALYTICS_API_KEY_ENV).ok()
}
