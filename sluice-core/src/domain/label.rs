//! Pipeline label types
//!
//! Labels come in two flavours: system labels, which the data collector
//! evaluates on the fly (running, invalid, ...), and custom labels stored in
//! pipeline metadata.

use serde::{Deserialize, Serialize};

pub const ALL_PIPELINES: &str = "system:allPipelines";
pub const RUNNING_PIPELINES: &str = "system:runningPipelines";
pub const NON_RUNNING_PIPELINES: &str = "system:nonRunningPipelines";
pub const INVALID_PIPELINES: &str = "system:invalidPipelines";
pub const ERROR_PIPELINES: &str = "system:errorPipelines";
pub const PUBLISHED_PIPELINES: &str = "system:publishedPipelines";
pub const REMOTE_CONTROLLED_PIPELINES: &str = "system:dpmControlledPipelines";
pub const LOCAL_PIPELINES: &str = "system:localPipelines";
pub const SHARED_WITH_ME_PIPELINES: &str = "system:sharedWithMePipelines";

/// Labels available for filtering the pipeline list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineLabels {
    pub system: Vec<String>,
    pub custom: Vec<String>,
}

impl PipelineLabels {
    pub fn contains(&self, label: &str) -> bool {
        self.system.iter().chain(&self.custom).any(|l| l == label)
    }

    /// Picks the label to filter by
    ///
    /// A previously selected label is kept only if it still exists, otherwise
    /// the list falls back to all pipelines.
    pub fn resolve(&self, preferred: Option<&str>) -> String {
        match preferred {
            Some(label) if self.contains(label) => label.to_string(),
            _ => ALL_PIPELINES.to_string(),
        }
    }
}
