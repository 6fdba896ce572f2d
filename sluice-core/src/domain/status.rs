//! Pipeline runtime state domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Runtime status of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    Edited,
    Starting,
    StartingError,
    StartError,
    Running,
    RunningError,
    RunError,
    Finishing,
    Finished,
    Retry,
    Killed,
    Stopping,
    Stopped,
    StoppingError,
    StopError,
    Disconnecting,
    Disconnected,
    Connecting,
    ConnectError,
    Deleted,
}

impl PipelineStatus {
    /// Statuses in which a pipeline is considered busy
    pub const ACTIVE: [PipelineStatus; 7] = [
        PipelineStatus::Connecting,
        PipelineStatus::Disconnecting,
        PipelineStatus::Finishing,
        PipelineStatus::Retry,
        PipelineStatus::Running,
        PipelineStatus::Starting,
        PipelineStatus::Stopping,
    ];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            PipelineStatus::StartError
                | PipelineStatus::RunningError
                | PipelineStatus::RunError
                | PipelineStatus::ConnectError
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStatus::Edited => "EDITED",
            PipelineStatus::Starting => "STARTING",
            PipelineStatus::StartingError => "STARTING_ERROR",
            PipelineStatus::StartError => "START_ERROR",
            PipelineStatus::Running => "RUNNING",
            PipelineStatus::RunningError => "RUNNING_ERROR",
            PipelineStatus::RunError => "RUN_ERROR",
            PipelineStatus::Finishing => "FINISHING",
            PipelineStatus::Finished => "FINISHED",
            PipelineStatus::Retry => "RETRY",
            PipelineStatus::Killed => "KILLED",
            PipelineStatus::Stopping => "STOPPING",
            PipelineStatus::Stopped => "STOPPED",
            PipelineStatus::StoppingError => "STOPPING_ERROR",
            PipelineStatus::StopError => "STOP_ERROR",
            PipelineStatus::Disconnecting => "DISCONNECTING",
            PipelineStatus::Disconnected => "DISCONNECTED",
            PipelineStatus::Connecting => "CONNECTING",
            PipelineStatus::ConnectError => "CONNECT_ERROR",
            PipelineStatus::Deleted => "DELETED",
        }
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last observed runtime state of a pipeline
///
/// Keyed by the pipeline name. `timestamp` is what the reconciler compares to
/// decide whether an incoming record is fresher than the cached one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineState {
    pub name: String,
    pub status: PipelineStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "timeStamp", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

impl PipelineState {
    /// Attribute set by the data collector on pipelines controlled remotely
    pub const REMOTE_ATTRIBUTE: &'static str = "IS_REMOTE_PIPELINE";

    pub fn new(name: impl Into<String>, status: PipelineStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            status,
            message: None,
            timestamp,
            attributes: HashMap::new(),
        }
    }

    /// Marks the state as belonging to a remotely controlled pipeline
    pub fn with_remote(mut self, remote: bool) -> Self {
        self.attributes.insert(
            Self::REMOTE_ATTRIBUTE.to_string(),
            serde_json::Value::Bool(remote),
        );
        self
    }

    pub fn is_remote(&self) -> bool {
        self.attributes
            .get(Self::REMOTE_ATTRIBUTE)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}
