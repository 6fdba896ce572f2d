//! Bulk command dispatch
//!
//! Runs a validated action through confirmation, execution and
//! reconciliation:
//!
//! ```text
//! Idle -> Validating -> Blocked
//!                    -> AwaitingConfirmation -> Cancelled
//!                                            -> Executing -> Succeeded | Failed
//!                    -> Executing (actions without confirmation)
//! ```
//!
//! The dispatcher only touches the shared [`StateStore`]. Effects on the list
//! itself (refreshing, merging labels into loaded pipelines) are returned in
//! [`CommandEffects`] for the browser to apply.

use serde_json::Value;
use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::domain::status::{PipelineState, PipelineStatus};
use sluice_core::dto::multi_status::MultiStatusResponse;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::dialogs::{Confirmation, PipelineDialogs};
use crate::error::TransportError;
use crate::store::{AppState, StateStore};
use crate::transport::{PipelineTransport, bounded};
use crate::validator::{BulkAction, ValidationReport};

/// Phases of a single command invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkPhase {
    Idle,
    Validating,
    Blocked,
    AwaitingConfirmation,
    Cancelled,
    Executing,
    Succeeded,
    Failed,
}

/// What a successful command changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandEffects {
    /// Pipelines the command succeeded for
    pub succeeded: Vec<String>,
    /// Number of returned states that won the timestamp check
    pub statuses_merged: usize,
    /// Labels to merge into the loaded copies of `succeeded`
    pub labels_added: Vec<String>,
    /// The list must be reloaded from the first page
    pub refresh: bool,
}

/// Terminal result of a command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// No loaded pipeline was targeted
    NothingSelected,
    /// Validation failed; the transport was never called
    Blocked { issues: Vec<String> },
    /// The operator cancelled; nothing changed
    Cancelled,
    Succeeded(CommandEffects),
    /// Some pipelines failed; successes were applied without rollback
    PartiallyFailed {
        effects: CommandEffects,
        errors: Vec<String>,
    },
    Failed { error: String },
}

impl CommandOutcome {
    pub fn phase(&self) -> BulkPhase {
        match self {
            CommandOutcome::NothingSelected => BulkPhase::Idle,
            CommandOutcome::Blocked { .. } => BulkPhase::Blocked,
            CommandOutcome::Cancelled => BulkPhase::Cancelled,
            CommandOutcome::Succeeded(_) | CommandOutcome::PartiallyFailed { .. } => {
                BulkPhase::Succeeded
            }
            CommandOutcome::Failed { .. } => BulkPhase::Failed,
        }
    }

    pub fn effects(&self) -> Option<&CommandEffects> {
        match self {
            CommandOutcome::Succeeded(effects) | CommandOutcome::PartiallyFailed { effects, .. } => {
                Some(effects)
            }
            _ => None,
        }
    }

    fn settle(effects: CommandEffects, errors: Vec<String>) -> Self {
        if errors.is_empty() {
            CommandOutcome::Succeeded(effects)
        } else {
            CommandOutcome::PartiallyFailed { effects, errors }
        }
    }
}

/// Confirms, executes and reconciles pipeline commands
#[derive(Clone)]
pub struct BulkCommandDispatcher {
    transport: Arc<dyn PipelineTransport>,
    dialogs: Arc<dyn PipelineDialogs>,
    store: StateStore,
    timeout: Duration,
}

impl BulkCommandDispatcher {
    pub fn new(
        transport: Arc<dyn PipelineTransport>,
        dialogs: Arc<dyn PipelineDialogs>,
        store: StateStore,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            dialogs,
            store,
            timeout,
        }
    }

    /// Runs `action` on the targets of a validation report
    pub async fn execute(&self, action: BulkAction, report: ValidationReport) -> CommandOutcome {
        debug!(%action, targets = report.allowed.len(), phase = ?BulkPhase::Validating, "Bulk action");

        if !report.is_clean() {
            info!(%action, issues = report.issues.len(), "Bulk action blocked by validation");
            self.store.set_errors(report.issues.clone()).await;
            return CommandOutcome::Blocked {
                issues: report.issues,
            };
        }

        if report.allowed.is_empty() {
            debug!(%action, "Nothing selected");
            return CommandOutcome::NothingSelected;
        }

        let targets = report.allowed;
        let outcome = match action {
            BulkAction::Start => self.start_all(&targets).await,
            BulkAction::Stop { force } => self.stop_all(&targets, force).await,
            BulkAction::Delete => self.delete(&targets).await,
            BulkAction::ResetOffset => self.reset_offset(&targets).await,
            BulkAction::AddLabels => self.add_labels(&targets).await,
            BulkAction::Publish => self.publish(&targets).await,
            BulkAction::Duplicate => self.duplicate(&targets[0]).await,
            BulkAction::Share => self.share(&targets[0]).await,
            BulkAction::Export {
                include_definitions,
            } => self.export(&targets, include_definitions).await,
        };

        match &outcome {
            CommandOutcome::Failed { error } => warn!(%action, %error, "Bulk action failed"),
            CommandOutcome::PartiallyFailed { errors, .. } => {
                warn!(%action, failures = errors.len(), "Bulk action partially failed")
            }
            other => info!(%action, phase = ?other.phase(), "Bulk action finished"),
        }

        outcome
    }

    /// Starts one pipeline unless it is already running
    pub async fn start_one(
        &self,
        pipeline: &PipelineInfo,
        runtime_parameters: &HashMap<String, Value>,
    ) -> CommandOutcome {
        let current = self.store.status_of(&pipeline.name).await;
        if current.is_some_and(|state| state.status == PipelineStatus::Running) {
            let issue = format!("Pipeline \"{}\" is already running", pipeline.name);
            self.store.set_errors(vec![issue.clone()]).await;
            return CommandOutcome::Blocked {
                issues: vec![issue],
            };
        }

        self.executing(BulkAction::Start);
        let result = bounded(
            self.timeout,
            self.transport.start_pipeline(&pipeline.name, runtime_parameters),
        )
        .await;

        match result {
            Ok(state) => self.reconcile_one(state, false).await,
            Err(e) => self.fail(e).await,
        }
    }

    /// Stops one pipeline after confirmation
    pub async fn stop_one(&self, pipeline: &PipelineInfo, force: bool) -> CommandOutcome {
        let action = BulkAction::Stop { force };
        let targets = std::slice::from_ref(pipeline);
        let Confirmation::Confirmed(()) = self.awaiting(action, self.dialogs.confirm_stop(targets, force)).await
        else {
            return CommandOutcome::Cancelled;
        };

        self.executing(action);
        let result = bounded(self.timeout, self.transport.stop_pipeline(&pipeline.name, force)).await;

        match result {
            Ok(state) => self.reconcile_one(state, true).await,
            Err(e) => self.fail(e).await,
        }
    }

    // =============================================================================
    // Actions
    // =============================================================================

    async fn start_all(&self, targets: &[PipelineInfo]) -> CommandOutcome {
        self.executing(BulkAction::Start);
        self.store.update(AppState::clear_errors).await;

        let names = names(targets);
        match bounded(self.timeout, self.transport.start_pipelines(&names)).await {
            Ok(response) => self.reconcile_states(response, false).await,
            Err(e) => self.fail(e).await,
        }
    }

    async fn stop_all(&self, targets: &[PipelineInfo], force: bool) -> CommandOutcome {
        let action = BulkAction::Stop { force };
        self.store.update(AppState::clear_errors).await;
        let Confirmation::Confirmed(()) = self.awaiting(action, self.dialogs.confirm_stop(targets, force)).await
        else {
            return CommandOutcome::Cancelled;
        };

        self.executing(action);
        let names = names(targets);
        match bounded(self.timeout, self.transport.stop_pipelines(&names, force)).await {
            Ok(response) => self.reconcile_states(response, true).await,
            Err(e) => self.fail(e).await,
        }
    }

    async fn delete(&self, targets: &[PipelineInfo]) -> CommandOutcome {
        let action = BulkAction::Delete;
        let Confirmation::Confirmed(()) = self.awaiting(action, self.dialogs.confirm_delete(targets)).await
        else {
            return CommandOutcome::Cancelled;
        };

        self.executing(action);
        let names = names(targets);
        if let Err(e) = bounded(self.timeout, self.transport.delete_pipelines(&names)).await {
            return self.fail(e).await;
        }

        self.store
            .update(|state| {
                for name in &names {
                    state.alerts.drop_pipeline(name);
                }
                state.clear_errors();
            })
            .await;

        CommandOutcome::Succeeded(CommandEffects {
            succeeded: names,
            refresh: true,
            ..CommandEffects::default()
        })
    }

    async fn reset_offset(&self, targets: &[PipelineInfo]) -> CommandOutcome {
        let action = BulkAction::ResetOffset;
        let Confirmation::Confirmed(()) =
            self.awaiting(action, self.dialogs.confirm_reset_offset(targets)).await
        else {
            return CommandOutcome::Cancelled;
        };

        self.executing(action);
        let names = names(targets);
        if let Err(e) = bounded(self.timeout, self.transport.reset_offsets(&names)).await {
            return self.fail(e).await;
        }

        self.store.update(AppState::clear_errors).await;
        CommandOutcome::Succeeded(CommandEffects {
            succeeded: names,
            ..CommandEffects::default()
        })
    }

    async fn add_labels(&self, targets: &[PipelineInfo]) -> CommandOutcome {
        let action = BulkAction::AddLabels;
        let Confirmation::Confirmed(labels) =
            self.awaiting(action, self.dialogs.confirm_add_labels(targets)).await
        else {
            return CommandOutcome::Cancelled;
        };

        self.executing(action);
        let names = names(targets);
        let response = match bounded(self.timeout, self.transport.add_labels(&labels, &names)).await {
            Ok(response) => response,
            Err(e) => return self.fail(e).await,
        };

        let MultiStatusResponse {
            success_entities,
            error_messages,
        } = response;

        self.store
            .update(|state| {
                for name in &success_entities {
                    state.alerts.drop_pipeline(name);
                }
                state.set_errors(error_messages.clone());
            })
            .await;

        let effects = CommandEffects {
            succeeded: success_entities,
            labels_added: labels,
            ..CommandEffects::default()
        };
        CommandOutcome::settle(effects, error_messages)
    }

    async fn publish(&self, targets: &[PipelineInfo]) -> CommandOutcome {
        let action = BulkAction::Publish;
        let Confirmation::Confirmed(commit_message) =
            self.awaiting(action, self.dialogs.confirm_publish(targets)).await
        else {
            return CommandOutcome::Cancelled;
        };

        self.executing(action);
        let names = names(targets);
        if let Err(e) = bounded(
            self.timeout,
            self.transport.publish_pipelines(&names, &commit_message),
        )
        .await
        {
            return self.fail(e).await;
        }

        self.store.update(AppState::clear_errors).await;
        CommandOutcome::Succeeded(CommandEffects {
            succeeded: names,
            refresh: true,
            ..CommandEffects::default()
        })
    }

    async fn duplicate(&self, pipeline: &PipelineInfo) -> CommandOutcome {
        let action = BulkAction::Duplicate;
        let Confirmation::Confirmed(options) =
            self.awaiting(action, self.dialogs.confirm_duplicate(pipeline)).await
        else {
            return CommandOutcome::Cancelled;
        };

        self.executing(action);
        if let Err(e) = bounded(
            self.timeout,
            self.transport.duplicate_pipeline(&pipeline.name, &options),
        )
        .await
        {
            return self.fail(e).await;
        }

        CommandOutcome::Succeeded(CommandEffects {
            succeeded: vec![pipeline.name.clone()],
            refresh: true,
            ..CommandEffects::default()
        })
    }

    async fn share(&self, pipeline: &PipelineInfo) -> CommandOutcome {
        self.dialogs.share(pipeline).await;
        CommandOutcome::Succeeded(CommandEffects {
            succeeded: vec![pipeline.name.clone()],
            ..CommandEffects::default()
        })
    }

    async fn export(&self, targets: &[PipelineInfo], include_definitions: bool) -> CommandOutcome {
        self.executing(BulkAction::Export {
            include_definitions,
        });

        let names = names(targets);
        let result = match targets {
            [single] => {
                bounded(
                    self.timeout,
                    self.transport.export_pipeline(&single.name, include_definitions),
                )
                .await
            }
            _ => {
                bounded(
                    self.timeout,
                    self.transport.export_pipelines(&names, include_definitions),
                )
                .await
            }
        };

        match result {
            Ok(()) => CommandOutcome::Succeeded(CommandEffects {
                succeeded: names,
                ..CommandEffects::default()
            }),
            Err(e) => self.fail(e).await,
        }
    }

    // =============================================================================
    // Reconciliation
    // =============================================================================

    /// Merges the success states of a multi-status response and surfaces its
    /// error messages
    async fn reconcile_states(
        &self,
        response: MultiStatusResponse<PipelineState>,
        drop_alerts: bool,
    ) -> CommandOutcome {
        let MultiStatusResponse {
            success_entities,
            error_messages,
        } = response;
        let succeeded: Vec<String> = success_entities.iter().map(|s| s.name.clone()).collect();

        let statuses_merged = self
            .store
            .update(|state| {
                if drop_alerts {
                    for name in &succeeded {
                        state.alerts.drop_pipeline(name);
                    }
                }
                state.set_errors(error_messages.clone());
                state.statuses.merge_all(success_entities)
            })
            .await;

        let effects = CommandEffects {
            succeeded,
            statuses_merged,
            ..CommandEffects::default()
        };
        CommandOutcome::settle(effects, error_messages)
    }

    async fn reconcile_one(&self, returned: PipelineState, drop_alerts: bool) -> CommandOutcome {
        let name = returned.name.clone();
        let merged = self
            .store
            .update(|state| {
                if drop_alerts {
                    state.alerts.drop_pipeline(&name);
                }
                state.statuses.merge(returned).applied()
            })
            .await;

        CommandOutcome::Succeeded(CommandEffects {
            succeeded: vec![name],
            statuses_merged: usize::from(merged),
            ..CommandEffects::default()
        })
    }

    /// Surfaces a transport failure as the only error
    async fn fail(&self, error: TransportError) -> CommandOutcome {
        let error = error.to_string();
        self.store.set_errors(vec![error.clone()]).await;
        CommandOutcome::Failed { error }
    }

    async fn awaiting<P>(
        &self,
        action: BulkAction,
        confirmation: impl Future<Output = Confirmation<P>>,
    ) -> Confirmation<P> {
        debug!(%action, phase = ?BulkPhase::AwaitingConfirmation, "Bulk action");
        let confirmation = confirmation.await;
        if !confirmation.is_confirmed() {
            info!(%action, "Bulk action cancelled");
        }
        confirmation
    }

    fn executing(&self, action: BulkAction) {
        debug!(%action, phase = ?BulkPhase::Executing, "Bulk action");
    }
}

fn names(targets: &[PipelineInfo]) -> Vec<String> {
    targets.iter().map(|p| p.name.clone()).collect()
}
