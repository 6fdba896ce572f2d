//! Persisted list preferences
//!
//! The browser remembers the operator's view across sessions: grid or table
//! layout, the last search, the sort order and the selected label. Storage is
//! an opaque blob behind [`PreferenceStore`].

use serde::{Deserialize, Serialize};
use sluice_core::dto::pipeline::SortColumn;
use std::sync::Mutex;

use crate::error::PreferenceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListPreferences {
    pub grid_view: bool,
    pub search_input: String,
    pub sort_column: Option<SortColumn>,
    pub sort_reverse: bool,
    pub show_name_column: bool,
    pub selected_label: Option<String>,
}

impl Default for ListPreferences {
    fn default() -> Self {
        Self {
            grid_view: false,
            search_input: String::new(),
            sort_column: None,
            sort_reverse: true,
            show_name_column: false,
            selected_label: None,
        }
    }
}

impl ListPreferences {
    pub fn view(&self) -> ViewSettings {
        ViewSettings {
            grid_view: self.grid_view,
            show_name_column: self.show_name_column,
        }
    }
}

/// Layout toggles, observed through a watch channel by the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewSettings {
    pub grid_view: bool,
    pub show_name_column: bool,
}

/// Load and save of the preference blob
///
/// Calls are synchronous and may block on I/O; the browser runs them on the
/// blocking pool.
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<ListPreferences, PreferenceError>;

    fn save(&self, preferences: &ListPreferences) -> Result<(), PreferenceError>;
}

/// Preferences kept in memory for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    preferences: Mutex<ListPreferences>,
}

impl MemoryPreferenceStore {
    pub fn new(preferences: ListPreferences) -> Self {
        Self {
            preferences: Mutex::new(preferences),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<ListPreferences, PreferenceError> {
        self.preferences
            .lock()
            .map(|prefs| prefs.clone())
            .map_err(|_| PreferenceError::Storage("preference lock poisoned".to_string()))
    }

    fn save(&self, preferences: &ListPreferences) -> Result<(), PreferenceError> {
        let mut stored = self
            .preferences
            .lock()
            .map_err(|_| PreferenceError::Storage("preference lock poisoned".to_string()))?;
        *stored = preferences.clone();
        Ok(())
    }
}
