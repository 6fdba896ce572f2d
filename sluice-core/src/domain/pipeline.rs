//! Pipeline domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Pipeline definition as listed by the data collector
///
/// Replaced wholesale on every fetch. The only local mutation is the label
/// merge performed after a successful bulk label operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineInfo {
    /// Unique key of the pipeline
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub creator: Option<String>,
    pub valid: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: PipelineMetadata,
}

/// Free-form pipeline metadata
///
/// Only `labels` and the remote-origin id are interpreted; every other key is
/// kept as-is so a round trip does not lose information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,

    /// Id of the pipeline in the remote control hub, if it was published or
    /// downloaded from there
    #[serde(
        rename = "dpm.pipeline.id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub remote_pipeline_id: Option<String>,

    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl PipelineInfo {
    /// Creates a valid, unlabeled pipeline record stamped with the current time
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            title: None,
            description: None,
            created: now,
            last_modified: now,
            creator: None,
            valid: true,
            metadata: PipelineMetadata::default(),
        }
    }

    /// Title shown to the operator, falling back to the name
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn labels(&self) -> &[String] {
        self.metadata.labels.as_deref().unwrap_or_default()
    }

    pub fn remote_pipeline_id(&self) -> Option<&str> {
        self.metadata.remote_pipeline_id.as_deref()
    }

    /// Merges `labels` into the pipeline's label list
    ///
    /// Existing labels keep their position, new ones are appended, and
    /// duplicates are dropped.
    pub fn merge_labels(&mut self, labels: &[String]) {
        let mut merged: Vec<String> = Vec::with_capacity(self.labels().len() + labels.len());
        for label in self.labels().iter().chain(labels) {
            if !merged.contains(label) {
                merged.push(label.clone());
            }
        }
        self.metadata.labels = Some(merged);
    }

    /// Case-insensitive substring match against the name and the title
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&term)
            || self.display_title().to_lowercase().contains(&term)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
