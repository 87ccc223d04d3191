use std::time::Duration;

use backon::ExponentialBuilder;
use regmgr_core::config::RetryConfig;
use regmgr_core::{AuthConfig, RegmgrConfig};

/// Backoff policy for retryable engine failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOptions {
    /// Retries after the first attempt.
    pub max_retries: usize,
    /// First backoff delay.
    pub min_delay: Duration,
    /// Backoff ceiling.
    pub max_delay: Duration,
    /// Randomize delays.
    pub jitter: bool,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryOptions {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

impl From<&RetryConfig> for RetryOptions {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            min_delay: Duration::from_millis(config.min_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter,
        }
    }
}

impl From<RetryOptions> for ExponentialBuilder {
    fn from(options: RetryOptions) -> Self {
        let mut builder = ExponentialBuilder::new()
            .with_max_times(options.max_retries)
            .with_min_delay(options.min_delay)
            .with_max_delay(options.max_delay);
        if options.jitter {
            builder = builder.with_jitter();
        }
        builder
    }
}

/// Connection settings for [`HttpSearchEngine`](super::HttpSearchEngine).
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Engine base URL, e.g. `http://localhost:9200`.
    pub url: String,
    /// Per-call timeout.
    pub timeout: Duration,
    /// Retry policy.
    pub retry: RetryOptions,
    /// Credentials and TLS trust.
    pub auth: AuthConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            timeout: Duration::from_secs(5),
            retry: RetryOptions::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl EngineOptions {
    /// Build options from the loaded configuration and an optional auth file.
    pub fn from_config(config: &RegmgrConfig, auth: AuthConfig) -> Self {
        Self {
            url: config.engine.url.clone(),
            timeout: config.engine.timeout(),
            retry: RetryOptions::from(&config.retry),
            auth,
        }
    }
}
