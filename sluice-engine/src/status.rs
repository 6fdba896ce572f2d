//! Status reconciliation
//!
//! Pipeline states arrive from list responses, from command responses and from
//! out-of-band pushes, in no particular order. The reconciler keeps exactly
//! one state per pipeline: the one with the newest timestamp.

use sluice_core::domain::status::{PipelineState, PipelineStatus};
use std::collections::HashMap;
use tracing::trace;

/// What a merge did to the status map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First state seen for this pipeline
    Inserted,
    /// The incoming state was strictly newer and replaced the stored one
    Replaced,
    /// The stored state is as new or newer; nothing changed
    Ignored,
}

impl MergeOutcome {
    pub fn applied(&self) -> bool {
        !matches!(self, MergeOutcome::Ignored)
    }
}

/// Map of pipeline name to its most recent known state
#[derive(Debug, Clone, Default)]
pub struct StatusReconciler {
    states: HashMap<String, PipelineState>,
}

impl StatusReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one incoming state
    ///
    /// The incoming state wins only with a strictly greater timestamp, so
    /// equal timestamps keep whichever state arrived first.
    pub fn merge(&mut self, incoming: PipelineState) -> MergeOutcome {
        match self.states.get(&incoming.name) {
            None => {
                trace!(pipeline = %incoming.name, status = %incoming.status, "Status inserted");
                self.states.insert(incoming.name.clone(), incoming);
                MergeOutcome::Inserted
            }
            Some(existing) if incoming.timestamp > existing.timestamp => {
                trace!(pipeline = %incoming.name, status = %incoming.status, "Status replaced");
                self.states.insert(incoming.name.clone(), incoming);
                MergeOutcome::Replaced
            }
            Some(existing) => {
                trace!(
                    pipeline = %incoming.name,
                    incoming = %incoming.timestamp,
                    stored = %existing.timestamp,
                    "Stale status ignored"
                );
                MergeOutcome::Ignored
            }
        }
    }

    /// Merges a batch of states and returns how many were applied
    pub fn merge_all(&mut self, incoming: impl IntoIterator<Item = PipelineState>) -> usize {
        incoming
            .into_iter()
            .map(|state| self.merge(state))
            .filter(MergeOutcome::applied)
            .count()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn get(&self, name: &str) -> Option<&PipelineState> {
        self.states.get(name)
    }

    pub fn status_of(&self, name: &str) -> Option<PipelineStatus> {
        self.states.get(name).map(|state| state.status)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PipelineState> {
        self.states.values()
    }
}
