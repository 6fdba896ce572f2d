//! Error types for the Sluice engine

use std::time::Duration;
use thiserror::Error;

/// Failure of a call to the transport collaborator
///
/// The message is the raw payload the operator sees in the error banner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The call reached the collector and failed
    #[error("{0}")]
    Failed(String),

    /// The call did not complete within the configured request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Failure to read or write the persisted preference blob
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference storage failed: {0}")]
    Storage(String),

    #[error("Invalid preference data: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Preference I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
