//! Pipeline manager API endpoints

use crate::CollectorClient;
use crate::error::Result;
use sluice_core::domain::status::PipelineState;
use sluice_core::dto::multi_status::MultiStatusResponse;
use std::collections::HashMap;

impl CollectorClient {
    // =============================================================================
    // Pipeline Lifecycle
    // =============================================================================

    /// Start a pipeline
    ///
    /// # Arguments
    /// * `name` - The pipeline name
    /// * `runtime_parameters` - Values overriding the pipeline's runtime
    ///   parameters; an empty map starts with the saved values
    ///
    /// # Returns
    /// The pipeline state right after the start request was accepted
    ///
    /// # Example
    /// ```no_run
    /// # use sluice_client::CollectorClient;
    /// # use std::collections::HashMap;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = CollectorClient::new("http://localhost:18630");
    /// let state = client.start_pipeline("orders", &HashMap::new()).await?;
    /// println!("{} is {}", state.name, state.status);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn start_pipeline(
        &self,
        name: &str,
        runtime_parameters: &HashMap<String, serde_json::Value>,
    ) -> Result<PipelineState> {
        let mut request = self.post(&["pipeline", name, "start"])?.query(&[("rev", "0")]);
        if !runtime_parameters.is_empty() {
            request = request.json(runtime_parameters);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// Start several pipelines
    ///
    /// # Returns
    /// The states of the pipelines that started and one message per failure
    pub async fn start_pipelines(
        &self,
        names: &[String],
    ) -> Result<MultiStatusResponse<PipelineState>> {
        let response = self
            .post(&["pipelines", "start"])?
            .json(names)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Stop a pipeline
    ///
    /// # Arguments
    /// * `name` - The pipeline name
    /// * `force` - Kill the pipeline instead of waiting for the current batch
    pub async fn stop_pipeline(&self, name: &str, force: bool) -> Result<PipelineState> {
        let response = self
            .post(&["pipeline", name, stop_action(force)])?
            .query(&[("rev", "0")])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Stop several pipelines
    pub async fn stop_pipelines(
        &self,
        names: &[String],
        force: bool,
    ) -> Result<MultiStatusResponse<PipelineState>> {
        let response = self
            .post(&["pipelines", stop_action(force)])?
            .json(names)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Reset the origin offsets of several pipelines
    pub async fn reset_offsets(&self, names: &[String]) -> Result<()> {
        let response = self
            .post(&["pipelines", "resetOffsets"])?
            .json(names)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

fn stop_action(force: bool) -> &'static str {
    if force { "forceStop" } else { "stop" }
}
