//! Multi-status DTOs
//!
//! Bulk endpoints answer with HTTP 207 and report, per pipeline, either a
//! success entity or an error message.

use serde::{Deserialize, Serialize};

/// Outcome of a bulk command
///
/// Successes and failures are independent: a response may carry both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiStatusResponse<T> {
    #[serde(default = "Vec::new")]
    pub success_entities: Vec<T>,
    #[serde(default)]
    pub error_messages: Vec<String>,
}

impl<T> MultiStatusResponse<T> {
    pub fn success(entities: Vec<T>) -> Self {
        Self {
            success_entities: entities,
            error_messages: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.error_messages.is_empty()
    }
}

impl<T> Default for MultiStatusResponse<T> {
    fn default() -> Self {
        Self::success(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_failure() {
        let json = r#"{
            "successEntities": ["p1"],
            "errorMessages": ["Failed adding labels [prod] to pipeline: p2. Error: gone"]
        }"#;

        let response: MultiStatusResponse<String> = serde_json::from_str(json).unwrap();
        assert_eq!(response.success_entities, vec!["p1".to_string()]);
        assert!(response.has_errors());
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let response: MultiStatusResponse<String> = serde_json::from_str("{}").unwrap();
        assert!(response.success_entities.is_empty());
        assert!(!response.has_errors());
    }
}
