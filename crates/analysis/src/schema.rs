use serde::{Deserialize, Serialize};

/// Outcome of one analysis dimension for one document.
///
/// When `has_error` is set, `result` carries nothing meaningful (list-typed
/// dimensions still hold an empty list so clients can iterate safely).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult<T> {
    pub has_error: bool,
    pub error: Option<String>,
    pub result: Option<T>,
}

impl<T> AnalysisResult<T> {
    pub fn ok(result: T) -> Self {
        Self {
            has_error: false,
            error: None,
            result: Some(result),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            has_error: true,
            error: Some(message.into()),
            result: None,
        }
    }

    /// Error wrapper that still carries a placeholder value (an empty list).
    pub fn failed_with(message: impl Into<String>, placeholder: T) -> Self {
        Self {
            has_error: true,
            error: Some(message.into()),
            result: Some(placeholder),
        }
    }
}

pub type LanguageResult = AnalysisResult<DetectedLanguage>;
pub type SentimentResult = AnalysisResult<Sentiment>;
pub type PiiResult = AnalysisResult<Vec<PiiEntity>>;
pub type KeyPhraseResult = AnalysisResult<KeyPhrases>;
pub type EntitiesResult = AnalysisResult<Vec<Entity>>;
pub type LinkedEntitiesResult = AnalysisResult<Vec<LinkedEntity>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLanguage {
    pub name: String,
    pub iso6391_name: String,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub sentiment: String,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiiEntity {
    pub category: String,
    pub subcategory: Option<String>,
    pub confidence_score: f64,
    pub offset: usize, // UTF-16 code units
    pub length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyPhrases {
    pub key_phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub category: String,
    pub confidence_score: f64,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntityMatch {
    pub text: String,
    pub confidence_score: f64,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedEntity {
    pub name: String,
    pub language: String,
    pub url: String,
    pub data_source: String,
    pub data_source_entity_id: String,
    pub matches: Vec<LinkedEntityMatch>,
}

/// Unified response for a single input document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnifiedTextAnalysis {
    pub has_error: bool,
    pub input_text: Option<String>,
    pub error: Option<String>,
    pub redacted_text: Option<String>,
    pub lang: Option<LanguageResult>,
    pub sentiment: Option<SentimentResult>,
    pub pii: Option<PiiResult>,
    pub key_phrases: Option<KeyPhraseResult>,
    pub entities: Option<EntitiesResult>,
    pub linked_entities: Option<LinkedEntitiesResult>,
}

impl UnifiedTextAnalysis {
    /// Error-shaped response with no per-field data.
    pub fn failed(input_text: Option<String>, error: impl Into<String>) -> Self {
        Self {
            has_error: true,
            input_text,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_failed_response_shape() {
        let response = UnifiedTextAnalysis::failed(None, "No text provided for analysis");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["has_error"], json!(true));
        assert_eq!(value["error"], json!("No text provided for analysis"));
        assert_eq!(value["input_text"], json!(null));
        assert_eq!(value["pii"], json!(null));
    }

    #[test]
    fn test_list_wrapper_keeps_empty_placeholder() {
        let pii: PiiResult = AnalysisResult::failed_with("PII analysis failed", Vec::new());
        let value = serde_json::to_value(&pii).unwrap();

        assert_eq!(
            value,
            json!({"has_error": true, "error": "PII analysis failed", "result": []})
        );
    }
}
