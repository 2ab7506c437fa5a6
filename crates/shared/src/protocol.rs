//! Wire contracts for the shopping backend.
//!
//! Response fields are lenient on purpose: a payload that parses but carries
//! an unexpected or absent `status` classifies as a rejected command, while a
//! body that fails to decode at all counts as a transport failure.

use serde::{Deserialize, Serialize};

use crate::domain::{Language, SearchResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceCommandRequest {
    pub text: String,
    pub lang: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceCommandResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub substitute_suggestions: Option<Vec<String>>,
}

impl VoiceCommandResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub text: String,
    pub lang: Language,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub found_items: Vec<SearchResult>,
}

impl SearchResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(default)]
    pub seasonal_suggestions: Vec<String>,
    #[serde(default)]
    pub frequently_bought: Vec<String>,
}

impl SuggestionsResponse {
    /// Seasonal labels followed by frequently-bought labels, each subset in
    /// server order, no de-duplication.
    pub fn into_labels(self) -> Vec<String> {
        let mut labels = self.seasonal_suggestions;
        labels.extend(self.frequently_bought);
        labels
    }
}

/// Shape of `DELETE /item/{id}` responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl MutationResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_command_payload_parses_as_rejection() {
        let response: VoiceCommandResponse = serde_json::from_str("{}").expect("lenient parse");
        assert!(!response.is_success());
        assert!(response.message.is_empty());
        assert!(response.substitute_suggestions.is_none());
    }

    #[test]
    fn suggestion_labels_keep_seasonal_before_frequent() {
        let response = SuggestionsResponse {
            seasonal_suggestions: vec!["pumpkin".into(), "cider".into()],
            frequently_bought: vec!["milk".into(), "pumpkin".into()],
        };
        assert_eq!(
            response.into_labels(),
            vec!["pumpkin", "cider", "milk", "pumpkin"]
        );
    }

    #[test]
    fn search_response_defaults_to_empty_results() {
        let response: SearchResponse =
            serde_json::from_str(r#"{"status": "success"}"#).expect("lenient parse");
        assert!(response.is_success());
        assert!(response.found_items.is_empty());
    }
}
