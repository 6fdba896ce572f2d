//! File-backed list preferences

use sluice_engine::{ListPreferences, PreferenceError, PreferenceStore};
use std::fs;
use std::path::PathBuf;

/// Stores the preference blob as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn load(&self) -> Result<ListPreferences, PreferenceError> {
        if !self.path.exists() {
            return Ok(ListPreferences::default());
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, preferences: &ListPreferences) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(preferences)?;
        fs::write(&self.path, content)?;
        tracing::debug!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}
