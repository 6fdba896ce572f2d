//! Error types for the collector client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised while talking to the data collector
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The collector answered with a non-success status
    #[error("Data collector error (status {status}): {body}")]
    Collector {
        status: u16,
        /// Response body as sent, usually a JSON `RemoteException`
        body: String,
    },

    /// The response body or a header could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The base URL cannot be combined with the requested path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn collector(status: u16, body: impl Into<String>) -> Self {
        Self::Collector {
            status,
            body: body.into(),
        }
    }

    /// Raw payload to show the operator
    ///
    /// For collector errors this is the body it sent back, without the
    /// status prefix.
    pub fn payload(&self) -> String {
        match self {
            Self::Collector { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}
