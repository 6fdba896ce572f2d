//! HTTP transport backed by the collector client

use async_trait::async_trait;
use serde_json::Value;
use sluice_client::{ClientError, CollectorClient};
use sluice_core::domain::label::PipelineLabels;
use sluice_core::domain::status::PipelineState;
use sluice_core::dto::multi_status::MultiStatusResponse;
use sluice_core::dto::pipeline::{
    AddLabels, DuplicateOptions, ListPipelines, PipelinePage, PublishPipelines,
};
use sluice_engine::{PipelineTransport, TransportError};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Archive name used for multi-pipeline exports
const BULK_EXPORT_FILE: &str = "pipelines.zip";

pub struct HttpTransport {
    client: CollectorClient,
    /// Directory exports are written to
    output_dir: PathBuf,
}

impl HttpTransport {
    pub fn new(client: CollectorClient, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
        }
    }

    async fn write_export(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), TransportError> {
        let path = self.output_dir.join(file_name);
        tokio::fs::create_dir_all(&self.output_dir).await.map_err(|e| {
            TransportError::failed(format!(
                "Failed to create {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            TransportError::failed(format!("Failed to write {}: {}", path.display(), e))
        })?;

        info!("Exported to {}", path.display());
        Ok(())
    }
}

fn transport_error(e: ClientError) -> TransportError {
    TransportError::Failed(e.payload())
}

/// File name for a single exported pipeline
fn export_file_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.json", safe)
}

#[async_trait]
impl PipelineTransport for HttpTransport {
    async fn list_pipelines(&self, req: &ListPipelines) -> Result<PipelinePage, TransportError> {
        self.client.list_pipelines(req).await.map_err(transport_error)
    }

    async fn count_pipelines(&self) -> Result<usize, TransportError> {
        self.client.count_pipelines().await.map_err(transport_error)
    }

    async fn list_labels(&self) -> Result<PipelineLabels, TransportError> {
        let (system, custom) = tokio::try_join!(
            self.client.list_system_labels(),
            self.client.list_custom_labels()
        )
        .map_err(transport_error)?;

        Ok(PipelineLabels { system, custom })
    }

    async fn start_pipeline(
        &self,
        name: &str,
        runtime_parameters: &HashMap<String, Value>,
    ) -> Result<PipelineState, TransportError> {
        self.client
            .start_pipeline(name, runtime_parameters)
            .await
            .map_err(transport_error)
    }

    async fn start_pipelines(
        &self,
        names: &[String],
    ) -> Result<MultiStatusResponse<PipelineState>, TransportError> {
        self.client.start_pipelines(names).await.map_err(transport_error)
    }

    async fn stop_pipeline(&self, name: &str, force: bool) -> Result<PipelineState, TransportError> {
        self.client
            .stop_pipeline(name, force)
            .await
            .map_err(transport_error)
    }

    async fn stop_pipelines(
        &self,
        names: &[String],
        force: bool,
    ) -> Result<MultiStatusResponse<PipelineState>, TransportError> {
        self.client
            .stop_pipelines(names, force)
            .await
            .map_err(transport_error)
    }

    async fn delete_pipelines(&self, names: &[String]) -> Result<(), TransportError> {
        self.client.delete_pipelines(names).await.map_err(transport_error)
    }

    async fn reset_offsets(&self, names: &[String]) -> Result<(), TransportError> {
        self.client.reset_offsets(names).await.map_err(transport_error)
    }

    async fn add_labels(
        &self,
        labels: &[String],
        names: &[String],
    ) -> Result<MultiStatusResponse<String>, TransportError> {
        let req = AddLabels {
            labels: labels.to_vec(),
            pipeline_names: names.to_vec(),
        };
        self.client.add_labels(&req).await.map_err(transport_error)
    }

    async fn publish_pipelines(
        &self,
        names: &[String],
        commit_message: &str,
    ) -> Result<(), TransportError> {
        let req = PublishPipelines {
            pipeline_names: names.to_vec(),
            commit_message: commit_message.to_string(),
        };
        self.client
            .publish_pipelines(&req)
            .await
            .map_err(transport_error)
    }

    async fn duplicate_pipeline(
        &self,
        name: &str,
        options: &DuplicateOptions,
    ) -> Result<(), TransportError> {
        let copies = self
            .client
            .duplicate_pipeline(name, options)
            .await
            .map_err(transport_error)?;

        info!("Created {} copy(ies) of {}", copies.len(), name);
        Ok(())
    }

    async fn export_pipeline(
        &self,
        name: &str,
        include_definitions: bool,
    ) -> Result<(), TransportError> {
        let bytes = self
            .client
            .export_pipeline(name, include_definitions)
            .await
            .map_err(transport_error)?;

        self.write_export(&export_file_name(name), bytes).await
    }

    async fn export_pipelines(
        &self,
        names: &[String],
        include_definitions: bool,
    ) -> Result<(), TransportError> {
        let bytes = self
            .client
            .export_pipelines(names, include_definitions)
            .await
            .map_err(transport_error)?;

        self.write_export(BULK_EXPORT_FILE, bytes).await
    }
}
