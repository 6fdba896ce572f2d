//! Operator confirmation seam

use async_trait::async_trait;
use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::dto::pipeline::DuplicateOptions;

/// Result of asking the operator to confirm an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation<P> {
    /// The operator confirmed, optionally supplying extra input
    Confirmed(P),
    /// The operator backed out; nothing must change
    Cancelled,
}

impl<P> Confirmation<P> {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Confirmation::Confirmed(_))
    }

    pub fn into_payload(self) -> Option<P> {
        match self {
            Confirmation::Confirmed(payload) => Some(payload),
            Confirmation::Cancelled => None,
        }
    }
}

/// Dialogs the engine opens before it changes anything
#[async_trait]
pub trait PipelineDialogs: Send + Sync {
    async fn confirm_stop(&self, targets: &[PipelineInfo], force: bool) -> Confirmation<()>;

    async fn confirm_delete(&self, targets: &[PipelineInfo]) -> Confirmation<()>;

    async fn confirm_reset_offset(&self, targets: &[PipelineInfo]) -> Confirmation<()>;

    /// Asks for the labels to add
    async fn confirm_add_labels(&self, targets: &[PipelineInfo]) -> Confirmation<Vec<String>>;

    /// Asks for the commit message to publish with
    async fn confirm_publish(&self, targets: &[PipelineInfo]) -> Confirmation<String>;

    /// Asks for the title and number of copies
    async fn confirm_duplicate(&self, pipeline: &PipelineInfo) -> Confirmation<DuplicateOptions>;

    /// Opens the sharing settings of a pipeline
    async fn share(&self, pipeline: &PipelineInfo);

    /// Offers to download pipelines from the remote control hub, skipping
    /// the remote ids that already exist locally
    async fn download_remote(&self, existing_remote_ids: &[String]) -> Confirmation<()>;
}
