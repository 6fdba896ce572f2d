//! Shared application state
//!
//! Holds the state every view of the collector shares: the status map, the
//! error banner and the triggered alerts.

use sluice_core::domain::status::PipelineState;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::alerts::AlertRegistry;
use crate::status::StatusReconciler;

#[derive(Debug, Default)]
pub struct AppState {
    pub statuses: StatusReconciler,
    /// Messages shown in the error banner; replaced wholesale
    pub errors: Vec<String>,
    pub alerts: AlertRegistry,
}

impl AppState {
    pub fn set_errors(&mut self, errors: Vec<String>) {
        self.errors = errors;
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

/// Cloneable handle to the shared [`AppState`]
///
/// The lock is only held inside the closures passed to [`StateStore::update`]
/// and [`StateStore::read`], never across a transport call.
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    inner: Arc<Mutex<AppState>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn update<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut state = self.inner.lock().await;
        f(&mut state)
    }

    pub async fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let state = self.inner.lock().await;
        f(&state)
    }

    pub async fn errors(&self) -> Vec<String> {
        self.read(|state| state.errors.clone()).await
    }

    pub async fn set_errors(&self, errors: Vec<String>) {
        self.update(|state| state.set_errors(errors)).await
    }

    pub async fn status_of(&self, name: &str) -> Option<PipelineState> {
        self.read(|state| state.statuses.get(name).cloned()).await
    }

    /// Merges states reported outside of list responses, such as pushes
    pub async fn merge_statuses(&self, states: Vec<PipelineState>) -> usize {
        self.update(|state| state.statuses.merge_all(states)).await
    }

    pub async fn alert_total(&self) -> usize {
        self.read(|state| state.alerts.total()).await
    }
}
