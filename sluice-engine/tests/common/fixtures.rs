//! Test fixtures

use chrono::{DateTime, Utc};
use sluice_core::domain::pipeline::PipelineInfo;
use sluice_core::domain::status::{PipelineState, PipelineStatus};
use sluice_engine::{EngineConfig, ListPreferences, MemoryPreferenceStore, PipelineBrowser};
use std::sync::Arc;
use std::time::Duration;

use super::mock_dialogs::ScriptedDialogs;
use super::mock_transport::MockTransport;

#[allow(dead_code)]
pub fn at(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap()
}

#[allow(dead_code)]
pub fn pipeline(name: &str) -> PipelineInfo {
    PipelineInfo::new(name)
}

#[allow(dead_code)]
pub fn state(name: &str, status: PipelineStatus, millis: i64) -> PipelineState {
    PipelineState::new(name, status, at(millis))
}

#[allow(dead_code)]
pub fn test_config() -> EngineConfig {
    EngineConfig::new().with_request_timeout(Duration::from_secs(5))
}

/// A browser over the given collaborators with in-memory preferences
#[allow(dead_code)]
pub fn browser(transport: &Arc<MockTransport>, dialogs: &Arc<ScriptedDialogs>) -> Arc<PipelineBrowser> {
    browser_with(
        test_config(),
        transport,
        dialogs,
        Arc::new(MemoryPreferenceStore::default()),
    )
}

#[allow(dead_code)]
pub fn browser_with(
    config: EngineConfig,
    transport: &Arc<MockTransport>,
    dialogs: &Arc<ScriptedDialogs>,
    preferences: Arc<MemoryPreferenceStore>,
) -> Arc<PipelineBrowser> {
    Arc::new(PipelineBrowser::new(
        config,
        transport.clone(),
        dialogs.clone(),
        preferences,
    ))
}

#[allow(dead_code)]
pub fn saved_preferences(prefs: ListPreferences) -> Arc<MemoryPreferenceStore> {
    Arc::new(MemoryPreferenceStore::new(prefs))
}
