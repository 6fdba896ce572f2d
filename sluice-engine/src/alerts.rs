//! Triggered pipeline alerts

use sluice_core::domain::alert::Alert;
use std::collections::HashMap;

/// Alerts grouped by pipeline, with a running total for the header badge
#[derive(Debug, Clone, Default)]
pub struct AlertRegistry {
    by_pipeline: HashMap<String, Vec<Alert>>,
    total: usize,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, alert: Alert) {
        self.by_pipeline
            .entry(alert.pipeline_name.clone())
            .or_default()
            .push(alert);
        self.total += 1;
    }

    pub fn alerts_for(&self, pipeline: &str) -> &[Alert] {
        self.by_pipeline
            .get(pipeline)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Text lines of every alert of a pipeline, for a tooltip
    pub fn messages(&self, pipeline: &str) -> Vec<String> {
        self.alerts_for(pipeline)
            .iter()
            .flat_map(|alert| alert.lines())
            .map(str::to_string)
            .collect()
    }

    /// Removes the alerts of a pipeline that was stopped, deleted or
    /// relabeled, returning how many were dropped
    pub fn drop_pipeline(&mut self, pipeline: &str) -> usize {
        let dropped = self.by_pipeline.remove(pipeline).map_or(0, |a| a.len());
        self.total = self.total.saturating_sub(dropped);
        dropped
    }

    pub fn total(&self) -> usize {
        self.total
    }
}
