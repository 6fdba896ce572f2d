//! Pipeline store API endpoints

use crate::CollectorClient;
use crate::error::{ClientError, Result};
use reqwest::header::HeaderMap;
use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::domain::status::PipelineState;
use sluice_core::dto::multi_status::MultiStatusResponse;
use sluice_core::dto::pipeline::{
    AddLabels, DuplicateOptions, ListPipelines, PipelineCount, PipelinePage, PublishPipelines,
};

/// Header carrying the number of pipelines matching a listing filter
///
/// The collector sends it as `TOTAL_COUNT`; header names are matched
/// case-insensitively and stored lowercase.
const TOTAL_COUNT_HEADER: &str = "total_count";

impl CollectorClient {
    // =============================================================================
    // Listing
    // =============================================================================

    /// List one page of pipelines together with their runtime states
    ///
    /// # Arguments
    /// * `req` - Filter, sort and pagination parameters
    ///
    /// # Returns
    /// The page of pipelines, their states, and the total number of matches
    ///
    /// # Example
    /// ```no_run
    /// # use sluice_client::CollectorClient;
    /// # use sluice_core::dto::pipeline::{ListPipelines, SortColumn, SortOrder};
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = CollectorClient::new("http://localhost:18630");
    /// let page = client.list_pipelines(&ListPipelines {
    ///     filter_text: "kafka".to_string(),
    ///     label: None,
    ///     offset: 0,
    ///     len: 50,
    ///     order_by: SortColumn::LastModified,
    ///     order: SortOrder::Desc,
    ///     include_status: true,
    /// }).await?;
    /// println!("{} of {}", page.items.len(), page.total_count);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_pipelines(&self, req: &ListPipelines) -> Result<PipelinePage> {
        let request = ListPipelines {
            include_status: true,
            ..req.clone()
        };
        let response = self.get(&["pipelines"])?.query(&request).send().await?;
        let total_count = parse_total_count(response.headers())?;

        let (items, statuses): (Vec<PipelineInfo>, Vec<PipelineState>) =
            self.handle_response(response).await?;

        Ok(PipelinePage {
            items,
            statuses,
            total_count,
        })
    }

    /// Count all pipelines, ignoring any filter
    pub async fn count_pipelines(&self) -> Result<usize> {
        let response = self.get(&["pipelines", "count"])?.send().await?;
        let count: PipelineCount = self.handle_response(response).await?;
        Ok(count.count)
    }

    /// List the system labels the collector evaluates on the fly
    pub async fn list_system_labels(&self) -> Result<Vec<String>> {
        let response = self.get(&["pipelines", "systemLabels"])?.send().await?;
        self.handle_response(response).await
    }

    /// List the custom labels found in pipeline metadata
    pub async fn list_custom_labels(&self) -> Result<Vec<String>> {
        let response = self.get(&["pipelines", "labels"])?.send().await?;
        self.handle_response(response).await
    }

    // =============================================================================
    // Bulk Store Operations
    // =============================================================================

    /// Delete pipelines
    ///
    /// # Arguments
    /// * `names` - Names of the pipelines to delete
    pub async fn delete_pipelines(&self, names: &[String]) -> Result<()> {
        let response = self
            .post(&["pipelines", "delete"])?
            .json(names)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Add labels to pipelines
    ///
    /// # Returns
    /// The names of the pipelines that were updated and one message per failure
    pub async fn add_labels(&self, req: &AddLabels) -> Result<MultiStatusResponse<String>> {
        let response = self
            .post(&["pipelines", "addLabels"])?
            .json(req)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Publish pipelines to the remote control hub
    pub async fn publish_pipelines(&self, req: &PublishPipelines) -> Result<()> {
        let response = self
            .post(&["pipelines", "publish"])?
            .json(req)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Duplicate a pipeline
    ///
    /// # Returns
    /// The created copies
    pub async fn duplicate_pipeline(
        &self,
        name: &str,
        options: &DuplicateOptions,
    ) -> Result<Vec<PipelineInfo>> {
        let response = self
            .post(&["pipeline", name, "duplicate"])?
            .json(options)
            .send()
            .await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Export
    // =============================================================================

    /// Export a single pipeline as JSON
    ///
    /// # Arguments
    /// * `name` - The pipeline name
    /// * `include_definitions` - Bundle the stage library definitions the
    ///   pipeline uses, as required by the remote control hub
    pub async fn export_pipeline(&self, name: &str, include_definitions: bool) -> Result<Vec<u8>> {
        let response = self
            .get(&["pipeline", name, "export"])?
            .query(&[
                ("attachment", "true"),
                ("includeLibraryDefinitions", bool_param(include_definitions)),
            ])
            .send()
            .await?;

        self.handle_bytes_response(response).await
    }

    /// Export several pipelines as a zip archive
    pub async fn export_pipelines(
        &self,
        names: &[String],
        include_definitions: bool,
    ) -> Result<Vec<u8>> {
        let response = self
            .post(&["pipelines", "export"])?
            .query(&[("includeLibraryDefinitions", bool_param(include_definitions))])
            .json(names)
            .send()
            .await?;

        self.handle_bytes_response(response).await
    }
}

/// Read the out-of-band total count of a listing
///
/// A missing header means the collector returned everything it matched, which
/// the caller treats as zero further results.
fn parse_total_count(headers: &HeaderMap) -> Result<usize> {
    match headers.get(TOTAL_COUNT_HEADER) {
        None => Ok(0),
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .ok_or_else(|| {
                ClientError::Decode(format!("Invalid {} header: {:?}", TOTAL_COUNT_HEADER, value))
            }),
    }
}

fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
