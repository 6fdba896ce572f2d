//! Transport seam between the engine and the data collector

use async_trait::async_trait;
use serde_json::Value;
use sluice_core::domain::label::PipelineLabels;
use sluice_core::domain::status::PipelineState;
use sluice_core::dto::multi_status::MultiStatusResponse;
use sluice_core::dto::pipeline::{DuplicateOptions, ListPipelines, PipelinePage};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::error::TransportError;

/// Calls the engine makes against the data collector
///
/// Implementations only move data; every call site wraps them in the
/// configured request timeout.
#[async_trait]
pub trait PipelineTransport: Send + Sync {
    /// Fetch one page of pipelines with their states
    async fn list_pipelines(&self, req: &ListPipelines) -> Result<PipelinePage, TransportError>;

    /// Count all pipelines, ignoring any filter
    async fn count_pipelines(&self) -> Result<usize, TransportError>;

    /// Fetch the system and custom labels
    async fn list_labels(&self) -> Result<PipelineLabels, TransportError>;

    async fn start_pipeline(
        &self,
        name: &str,
        runtime_parameters: &HashMap<String, Value>,
    ) -> Result<PipelineState, TransportError>;

    async fn start_pipelines(
        &self,
        names: &[String],
    ) -> Result<MultiStatusResponse<PipelineState>, TransportError>;

    async fn stop_pipeline(&self, name: &str, force: bool) -> Result<PipelineState, TransportError>;

    async fn stop_pipelines(
        &self,
        names: &[String],
        force: bool,
    ) -> Result<MultiStatusResponse<PipelineState>, TransportError>;

    async fn delete_pipelines(&self, names: &[String]) -> Result<(), TransportError>;

    async fn reset_offsets(&self, names: &[String]) -> Result<(), TransportError>;

    /// Add labels; the success entities are the names of updated pipelines
    async fn add_labels(
        &self,
        labels: &[String],
        names: &[String],
    ) -> Result<MultiStatusResponse<String>, TransportError>;

    async fn publish_pipelines(
        &self,
        names: &[String],
        commit_message: &str,
    ) -> Result<(), TransportError>;

    async fn duplicate_pipeline(
        &self,
        name: &str,
        options: &DuplicateOptions,
    ) -> Result<(), TransportError>;

    async fn export_pipeline(
        &self,
        name: &str,
        include_definitions: bool,
    ) -> Result<(), TransportError>;

    async fn export_pipelines(
        &self,
        names: &[String],
        include_definitions: bool,
    ) -> Result<(), TransportError>;
}

/// Runs a transport call, failing with [`TransportError::Timeout`] when it
/// does not complete in time
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, TransportError>
where
    F: Future<Output = Result<T, TransportError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(TransportError::Timeout(timeout)))
}
