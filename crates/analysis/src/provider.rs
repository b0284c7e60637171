use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::schema::{DetectedLanguage, LinkedEntity};

/// Per-document failure reported by the remote service.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentError {
    pub code: String,
    pub message: String,
}

impl DocumentError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Whole-batch failure: the operation produced no per-document slots at all.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{operation} request failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} returned status {status}: {message}")]
    Status {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// One slot per input document, in input order.
pub type BatchResult<T> = Result<Vec<DocumentResult<T>>, ProviderError>;

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentScores {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl SentimentScores {
    /// Confidence of the given label; `mixed` (or anything unknown) takes the highest score.
    pub fn for_label(&self, label: &str) -> f64 {
        match label {
            "positive" => self.positive,
            "neutral" => self.neutral,
            "negative" => self.negative,
            _ => self.positive.max(self.neutral).max(self.negative),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSentiment {
    pub label: String,
    pub scores: SentimentScores,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecognizedEntity {
    pub text: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub confidence_score: f64,
    pub offset: usize,
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PiiDocument {
    pub redacted_text: String,
    pub entities: Vec<RecognizedEntity>,
}

/// The remote text-analytics capability.
///
/// Every operation takes the whole document batch and answers with one slot
/// per document. `language` is an ISO 639-1 hint; `None` lets the service
/// infer it.
#[async_trait]
pub trait TextAnalyticsProvider: Send + Sync {
    async fn detect_language(&self, documents: &[String]) -> BatchResult<DetectedLanguage>;

    async fn analyze_sentiment(
        &self,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<DocumentSentiment>;

    async fn recognize_pii_entities(
        &self,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<PiiDocument>;

    async fn extract_key_phrases(
        &self,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<Vec<String>>;

    async fn recognize_entities(
        &self,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<Vec<RecognizedEntity>>;

    async fn recognize_linked_entities(
        &self,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<Vec<LinkedEntity>>;
}
