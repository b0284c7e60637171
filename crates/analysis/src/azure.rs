use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::provider::{
    BatchResult, DocumentError, DocumentResult, DocumentSentiment, PiiDocument, ProviderError,
    RecognizedEntity, SentimentScores, TextAnalyticsProvider,
};
use crate::schema::{DetectedLanguage, LinkedEntity, LinkedEntityMatch};

const API_PREFIX: &str = "text/analytics/v3.1";
const KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Client for the Azure AI Language (Text Analytics v3.1) REST API.
///
/// Built once at startup; the inner `reqwest::Client` pools connections and is
/// shared by every request.
#[derive(Clone)]
pub struct AzureTextAnalytics {
    endpoint: String,
    key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct BatchInput<'a> {
    documents: Vec<InputDocument<'a>>,
}

#[derive(Serialize)]
struct InputDocument<'a> {
    id: String,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

#[derive(Deserialize)]
struct BatchResponse<T> {
    documents: Vec<Envelope<T>>,
    #[serde(default)]
    errors: Vec<DocumentErrorEntry>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    id: String,
    #[serde(flatten)]
    body: T,
}

#[derive(Deserialize)]
struct DocumentErrorEntry {
    id: String,
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    innererror: Option<InnerError>,
}

#[derive(Deserialize)]
struct InnerError {
    #[serde(default)]
    message: String,
}

impl ErrorBody {
    fn into_document_error(self) -> DocumentError {
        // The inner error usually says what was actually wrong with the document.
        let message = match self.innererror {
            Some(inner) if !inner.message.is_empty() => inner.message,
            _ => self.message,
        };
        DocumentError::new(self.code, message)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LanguageDocument {
    detected_language: WireLanguage,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLanguage {
    name: String,
    iso6391_name: String,
    confidence_score: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SentimentDocument {
    sentiment: String,
    confidence_scores: WireScores,
}

#[derive(Deserialize)]
struct WireScores {
    positive: f64,
    neutral: f64,
    negative: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PiiWireDocument {
    redacted_text: String,
    entities: Vec<WireEntity>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyPhraseDocument {
    key_phrases: Vec<String>,
}

#[derive(Deserialize)]
struct EntitiesDocument {
    entities: Vec<WireEntity>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEntity {
    text: String,
    category: String,
    #[serde(default)]
    subcategory: Option<String>,
    offset: usize,
    length: usize,
    confidence_score: f64,
}

#[derive(Deserialize)]
struct LinkedEntitiesDocument {
    entities: Vec<WireLinkedEntity>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireLinkedEntity {
    name: String,
    matches: Vec<WireMatch>,
    language: String,
    // Optional in the service schema; an absent id becomes an empty string.
    #[serde(default)]
    id: String,
    url: String,
    data_source: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMatch {
    confidence_score: f64,
    text: String,
    offset: usize,
    length: usize,
}

impl From<WireEntity> for RecognizedEntity {
    fn from(e: WireEntity) -> Self {
        Self {
            text: e.text,
            category: e.category,
            subcategory: e.subcategory,
            confidence_score: e.confidence_score,
            offset: e.offset,
            length: e.length,
        }
    }
}

impl From<WireLinkedEntity> for LinkedEntity {
    fn from(e: WireLinkedEntity) -> Self {
        Self {
            name: e.name,
            language: e.language,
            url: e.url,
            data_source: e.data_source,
            data_source_entity_id: e.id,
            matches: e
                .matches
                .into_iter()
                .map(|m| LinkedEntityMatch {
                    text: m.text,
                    confidence_score: m.confidence_score,
                    offset: m.offset,
                    length: m.length,
                })
                .collect(),
        }
    }
}

impl AzureTextAnalytics {
    pub fn new(
        endpoint: impl Into<String>,
        key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ProviderError::Http {
                operation: "client setup",
                source,
            })?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            key: key.into(),
            client,
        })
    }

    /// POST one batch and realign the answer with the input order.
    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        route: &str,
        utf16_offsets: bool,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<T> {
        let url = format!("{}/{}/{}", self.endpoint, API_PREFIX, route);

        let input = BatchInput {
            documents: documents
                .iter()
                .enumerate()
                .map(|(i, text)| InputDocument {
                    id: i.to_string(),
                    text,
                    language,
                })
                .collect(),
        };

        let mut request = self
            .client
            .post(&url)
            .header(KEY_HEADER, &self.key)
            .json(&input);
        if utf16_offsets {
            request = request.query(&[("stringIndexType", "Utf16CodeUnit")]);
        }

        let response = request
            .send()
            .await
            .map_err(|source| ProviderError::Http { operation, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ProviderError::Http { operation, source })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.into_document_error().message)
                .unwrap_or(body);
            return Err(ProviderError::Status {
                operation,
                status: status.as_u16(),
                message,
            });
        }

        let batch: BatchResponse<T> = serde_json::from_str(&body)
            .map_err(|source| ProviderError::Decode { operation, source })?;

        Ok(align(documents.len(), batch))
    }
}

/// Place every document and error at the index named by its `id`.
fn align<T>(count: usize, batch: BatchResponse<T>) -> Vec<DocumentResult<T>> {
    let mut slots: Vec<Option<DocumentResult<T>>> = (0..count).map(|_| None).collect();

    for doc in batch.documents {
        if let Some(slot) = doc.id.parse::<usize>().ok().and_then(|i| slots.get_mut(i)) {
            *slot = Some(Ok(doc.body));
        }
    }
    for entry in batch.errors {
        if let Some(slot) = entry.id.parse::<usize>().ok().and_then(|i| slots.get_mut(i)) {
            *slot = Some(Err(entry.error.into_document_error()));
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| {
                Err(DocumentError::new(
                    "MissingDocument",
                    "Document missing from service response",
                ))
            })
        })
        .collect()
}

fn convert<W, T>(slots: Vec<DocumentResult<W>>, f: impl Fn(W) -> T) -> Vec<DocumentResult<T>> {
    slots.into_iter().map(|slot| slot.map(&f)).collect()
}

#[async_trait]
impl TextAnalyticsProvider for AzureTextAnalytics {
    async fn detect_language(&self, documents: &[String]) -> BatchResult<DetectedLanguage> {
        let slots = self
            .call::<LanguageDocument>("language detection", "languages", false, documents, None)
            .await?;

        Ok(convert(slots, |doc| DetectedLanguage {
            name: doc.detected_language.name,
            iso6391_name: doc.detected_language.iso6391_name,
            confidence_score: doc.detected_language.confidence_score,
        }))
    }

    async fn analyze_sentiment(
        &self,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<DocumentSentiment> {
        let slots = self
            .call::<SentimentDocument>("sentiment analysis", "sentiment", true, documents, language)
            .await?;

        Ok(convert(slots, |doc| DocumentSentiment {
            label: doc.sentiment,
            scores: SentimentScores {
                positive: doc.confidence_scores.positive,
                neutral: doc.confidence_scores.neutral,
                negative: doc.confidence_scores.negative,
            },
        }))
    }

    async fn recognize_pii_entities(
        &self,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<PiiDocument> {
        let slots = self
            .call::<PiiWireDocument>(
                "PII recognition",
                "entities/recognition/pii",
                true,
                documents,
                language,
            )
            .await?;

        Ok(convert(slots, |doc| PiiDocument {
            redacted_text: doc.redacted_text,
            entities: doc.entities.into_iter().map(Into::into).collect(),
        }))
    }

    async fn extract_key_phrases(
        &self,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<Vec<String>> {
        let slots = self
            .call::<KeyPhraseDocument>(
                "key phrase extraction",
                "keyPhrases",
                false,
                documents,
                language,
            )
            .await?;

        Ok(convert(slots, |doc| doc.key_phrases))
    }

    async fn recognize_entities(
        &self,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<Vec<RecognizedEntity>> {
        let slots = self
            .call::<EntitiesDocument>(
                "entity recognition",
                "entities/recognition/general",
                true,
                documents,
                language,
            )
            .await?;

        Ok(convert(slots, |doc| {
            doc.entities.into_iter().map(Into::into).collect()
        }))
    }

    async fn recognize_linked_entities(
        &self,
        documents: &[String],
        language: Option<&str>,
    ) -> BatchResult<Vec<LinkedEntity>> {
        let slots = self
            .call::<LinkedEntitiesDocument>(
                "linked entity recognition",
                "entities/linking",
                true,
                documents,
                language,
            )
            .await?;

        Ok(convert(slots, |doc| {
            doc.entities.into_iter().map(Into::into).collect()
        }))
    }
}
