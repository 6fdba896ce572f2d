//! Engine configuration
//!
//! Defines the tunables of the pipeline browser: page size, request timeout,
//! and the catalog size above which saved sort preferences are ignored.

use std::time::Duration;

use crate::error::ConfigError;

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Number of pipelines fetched per page
    pub page_size: usize,

    /// Saved sort preferences are restored only when the collector holds
    /// fewer pipelines than this, because sorting by status is expensive
    /// server-side on large catalogs
    pub preference_restore_limit: usize,

    /// Upper bound for every transport call
    pub request_timeout: Duration,
}

impl EngineConfig {
    /// Creates a new configuration with defaults
    pub fn new() -> Self {
        Self {
            page_size: 50,
            preference_restore_limit: 100,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Recognized environment variables, all optional:
    /// - SLUICE_PAGE_SIZE (default: 50)
    /// - SLUICE_REQUEST_TIMEOUT (seconds, default: 30)
    /// - SLUICE_PREFERENCE_RESTORE_LIMIT (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::new();

        let page_size = std::env::var("SLUICE_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.page_size);

        let request_timeout = std::env::var("SLUICE_REQUEST_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let preference_restore_limit = std::env::var("SLUICE_PREFERENCE_RESTORE_LIMIT")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(defaults.preference_restore_limit);

        Self {
            page_size,
            preference_restore_limit,
            request_timeout,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid(
                "page_size must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
