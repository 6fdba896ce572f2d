//! Sluice HTTP Client
//!
//! A simple, type-safe HTTP client for the data collector REST API.
//!
//! The pipeline browser engine talks to the collector through a transport
//! trait; this crate provides the HTTP calls behind it.
//!
//! # Example
//!
//! ```no_run
//! use sluice_client::CollectorClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = CollectorClient::new("http://localhost:18630");
//!
//!     let count = client.count_pipelines().await?;
//!     println!("{} pipeline(s)", count);
//!     Ok(())
//! }
//! ```

pub mod error;
mod manager;
mod pipelines;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

/// Header the collector requires on state-changing requests
const REQUESTED_BY_HEADER: &str = "X-Requested-By";

/// HTTP client for the data collector REST API
///
/// This client provides methods for the endpoints the pipeline browser needs,
/// organized into logical groups:
/// - Pipeline store (list, count, labels, delete, labels, export)
/// - Pipeline manager (start, stop, reset offsets)
#[derive(Debug, Clone)]
pub struct CollectorClient {
    /// Base URL of the collector (e.g., "http://localhost:18630")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl CollectorClient {
    /// Create a new collector client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the data collector (e.g., "http://localhost:18630")
    ///
    /// # Example
    /// ```
    /// use sluice_client::CollectorClient;
    ///
    /// let client = CollectorClient::new("http://localhost:18630");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new collector client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use sluice_client::CollectorClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = CollectorClient::with_client("http://localhost:18630", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the collector
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Request Builders
    // =============================================================================

    /// Build an API URL from path segments
    ///
    /// Segments are percent-encoded, so pipeline names with spaces or slashes
    /// are safe to pass as-is.
    fn api_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["rest", "v1"])
            .extend(segments);
        Ok(url)
    }

    fn get(&self, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.api_url(segments)?;
        tracing::debug!("GET {}", url);
        Ok(self.client.get(url))
    }

    fn post(&self, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.api_url(segments)?;
        tracing::debug!("POST {}", url);
        Ok(self.client.post(url).header(REQUESTED_BY_HEADER, "sluice"))
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        self.check_status(response).await?;
        Ok(())
    }

    /// Handle an API response carrying a file download
    async fn handle_bytes_response(&self, response: reqwest::Response) -> Result<Vec<u8>> {
        let response = self.check_status(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::collector(status.as_u16(), error_text));
        }

        Ok(response)
    }
}
