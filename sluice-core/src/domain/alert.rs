//! Alert domain types

use serde::{Deserialize, Serialize};

/// A triggered data rule alert attached to a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub pipeline_name: String,

    /// Rule family, e.g. "data" or "drift"
    pub family: String,

    /// Text configured on the rule definition
    pub alert_text: String,

    /// Texts reported by a data drift rule
    #[serde(default)]
    pub drift_texts: Vec<String>,
}

impl Alert {
    pub fn is_drift(&self) -> bool {
        self.family == "drift" && !self.drift_texts.is_empty()
    }

    /// Lines to show for this alert
    ///
    /// Drift alerts report their own texts, any other alert shows the rule text.
    pub fn lines(&self) -> Vec<&str> {
        if self.is_drift() {
            self.drift_texts.iter().map(String::as_str).collect()
        } else {
            vec![self.alert_text.as_str()]
        }
    }
}
