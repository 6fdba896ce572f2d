//! Pre-flight checks for bulk actions
//!
//! Before a bulk action reaches the operator's confirmation dialog, every
//! selected pipeline is checked against the rules of that action. A single
//! failing pipeline blocks the whole action.

use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::domain::status::{PipelineState, PipelineStatus};
use std::fmt;

use crate::status::StatusReconciler;

/// States in which a pipeline cannot be deleted
pub const DELETE_BLOCKING: [PipelineStatus; 5] = [
    PipelineStatus::Running,
    PipelineStatus::Starting,
    PipelineStatus::ConnectError,
    PipelineStatus::Retry,
    PipelineStatus::Stopping,
];

/// Operations that can be applied to a selection of pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    Start,
    Stop { force: bool },
    Delete,
    ResetOffset,
    AddLabels,
    Publish,
    Duplicate,
    Share,
    Export { include_definitions: bool },
}

impl BulkAction {
    pub fn name(&self) -> &'static str {
        match self {
            BulkAction::Start => "start",
            BulkAction::Stop { force: false } => "stop",
            BulkAction::Stop { force: true } => "force-stop",
            BulkAction::Delete => "delete",
            BulkAction::ResetOffset => "reset-offset",
            BulkAction::AddLabels => "add-labels",
            BulkAction::Publish => "publish",
            BulkAction::Duplicate => "duplicate",
            BulkAction::Share => "share",
            BulkAction::Export { .. } => "export",
        }
    }

    /// Actions that act on the first selected pipeline only
    pub fn is_single_target(&self) -> bool {
        matches!(self, BulkAction::Duplicate | BulkAction::Share)
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of validating a selection for an action
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// The targets, in list order, including any that produced an issue
    pub allowed: Vec<PipelineInfo>,
    /// One message per failing pipeline
    pub issues: Vec<String>,
}

impl ValidationReport {
    /// A report for one pipeline that needs no checks
    pub fn single(pipeline: PipelineInfo) -> Self {
        Self {
            allowed: vec![pipeline],
            issues: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.allowed.iter().map(|p| p.name.clone()).collect()
    }
}

/// Checks the selected pipelines against the rules of `action`
///
/// Targets are the loaded pipelines whose name is selected, in list order.
/// Pipelines without a known state pass the state-based rules.
pub fn validate<S: AsRef<str>>(
    action: BulkAction,
    selected: &[S],
    loaded: &[PipelineInfo],
    statuses: &StatusReconciler,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    for pipeline in loaded
        .iter()
        .filter(|p| selected.iter().any(|s| s.as_ref() == p.name))
    {
        if let Some(issue) = check(action, pipeline, statuses.get(&pipeline.name)) {
            report.issues.push(issue);
        }
        report.allowed.push(pipeline.clone());
    }

    report
}

fn check(action: BulkAction, pipeline: &PipelineInfo, state: Option<&PipelineState>) -> Option<String> {
    let name = &pipeline.name;

    match action {
        BulkAction::Delete => blocking_status(state, &DELETE_BLOCKING).map(|status| {
            format!(
                "Delete operation is not supported for Pipeline \"{}\" with state {}",
                name, status
            )
        }),
        BulkAction::ResetOffset => blocking_status(state, &PipelineStatus::ACTIVE).map(|status| {
            format!(
                "Reset Origin operation is not supported for Pipeline \"{}\" with state {}",
                name, status
            )
        }),
        BulkAction::AddLabels => blocking_status(state, &PipelineStatus::ACTIVE).map(|status| {
            format!(
                "Add Label is not supported for Pipeline \"{}\" with state {}",
                name, status
            )
        }),
        BulkAction::Publish => {
            if !pipeline.valid {
                Some(format!(
                    "Publish operation is not supported for Invalid Pipeline - {}",
                    name
                ))
            } else if state.is_some_and(PipelineState::is_remote) {
                Some(format!(
                    "Publish operation is not supported for Remote Pipeline \"{}\"",
                    name
                ))
            } else {
                None
            }
        }
        BulkAction::Export {
            include_definitions: true,
        } if !pipeline.valid => Some(format!("Pipeline \"{}\" is not valid", name)),
        _ => None,
    }
}

fn blocking_status(state: Option<&PipelineState>, blocking: &[PipelineStatus]) -> Option<PipelineStatus> {
    state
        .map(|s| s.status)
        .filter(|status| blocking.contains(status))
}
