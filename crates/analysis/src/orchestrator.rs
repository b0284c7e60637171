use anyhow::{Result, bail};
use std::sync::Arc;
use tracing::{Instrument, debug, info_span, warn};

use crate::provider::{
    BatchResult, DocumentError, DocumentResult, DocumentSentiment, PiiDocument, RecognizedEntity,
    TextAnalyticsProvider,
};
use crate::schema::{
    AnalysisResult, DetectedLanguage, Entity, KeyPhrases, LinkedEntity, PiiEntity, Sentiment,
    UnifiedTextAnalysis,
};

pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const LANGUAGE_FAILED: &str = "Language detection failed";
pub const SENTIMENT_FAILED: &str = "Sentiment analysis failed";
pub const PII_FAILED: &str = "PII analysis failed";
pub const KEY_PHRASES_FAILED: &str = "Key phrase extraction failed";
pub const ENTITIES_FAILED: &str = "Entity recognition failed";
pub const LINKED_ENTITIES_FAILED: &str = "Linked entity recognition failed";

/// Fans a document batch out to every analysis operation and folds the
/// answers into one `UnifiedTextAnalysis` per document.
pub struct Analyzer {
    provider: Arc<dyn TextAnalyticsProvider>,
}

/// Everything the provider said about one document.
struct DocumentSlots {
    language: DocumentResult<DetectedLanguage>,
    sentiment: DocumentResult<DocumentSentiment>,
    pii: DocumentResult<PiiDocument>,
    key_phrases: DocumentResult<Vec<String>>,
    entities: DocumentResult<Vec<RecognizedEntity>>,
    linked_entities: DocumentResult<Vec<LinkedEntity>>,
}

impl DocumentSlots {
    fn any_error(&self) -> bool {
        self.language.is_err()
            || self.sentiment.is_err()
            || self.pii.is_err()
            || self.key_phrases.is_err()
            || self.entities.is_err()
            || self.linked_entities.is_err()
    }
}

impl Analyzer {
    pub fn new(provider: Arc<dyn TextAnalyticsProvider>) -> Self {
        Self { provider }
    }

    /// Analyze a batch of documents.
    ///
    /// Returns one result per document in input order, except when language
    /// detection fails for the first document: then a single error-shaped
    /// result is returned, since every other operation depends on its hint.
    pub async fn analyze(&self, documents: &[String]) -> Result<Vec<UnifiedTextAnalysis>> {
        let Some(first) = documents.first() else {
            bail!("no documents supplied for analysis");
        };

        let languages = match self.provider.detect_language(documents).await {
            Ok(slots) => slots,
            Err(e) => {
                warn!(operation = "language detection", error = %e, "Remote call failed");
                return Ok(vec![UnifiedTextAnalysis::failed(
                    Some(first.clone()),
                    e.to_string(),
                )]);
            }
        };

        let hint = match languages.first() {
            Some(Ok(language)) => language.iso6391_name.clone(),
            Some(Err(e)) => {
                warn!(operation = "language detection", code = %e.code, "Document rejected");
                return Ok(vec![UnifiedTextAnalysis::failed(
                    Some(first.clone()),
                    message_or_unknown(e),
                )]);
            }
            None => {
                warn!(operation = "language detection", "Service returned no documents");
                return Ok(vec![UnifiedTextAnalysis::failed(
                    Some(first.clone()),
                    UNKNOWN_ERROR,
                )]);
            }
        };
        let languages = expect_slots(Ok(languages), documents.len(), "language detection")?;

        let span = info_span!("secondary_analysis", documents = documents.len(), language = %hint);
        let language = Some(hint.as_str());
        let (sentiment, pii, key_phrases, entities, linked_entities) = async {
            tokio::join!(
                self.provider.analyze_sentiment(documents, language),
                self.provider.recognize_pii_entities(documents, language),
                self.provider.extract_key_phrases(documents, language),
                self.provider.recognize_entities(documents, language),
                self.provider.recognize_linked_entities(documents, language),
            )
        }
        .instrument(span)
        .await;

        let count = documents.len();
        let sentiment = expect_slots(sentiment, count, "sentiment analysis")?;
        let pii = expect_slots(pii, count, "PII recognition")?;
        let key_phrases = expect_slots(key_phrases, count, "key phrase extraction")?;
        let entities = expect_slots(entities, count, "entity recognition")?;
        let linked_entities = expect_slots(linked_entities, count, "linked entity recognition")?;

        let slots = languages
            .into_iter()
            .zip(sentiment)
            .zip(pii)
            .zip(key_phrases)
            .zip(entities)
            .zip(linked_entities)
            .map(
                |(((((language, sentiment), pii), key_phrases), entities), linked_entities)| {
                    DocumentSlots {
                        language,
                        sentiment,
                        pii,
                        key_phrases,
                        entities,
                        linked_entities,
                    }
                },
            );

        let results: Vec<UnifiedTextAnalysis> = documents
            .iter()
            .zip(slots)
            .map(|(text, slots)| merge(text, slots))
            .collect();

        debug!(
            documents = results.len(),
            degraded = results.iter().filter(|r| r.has_error).count(),
            "Analysis merged"
        );

        Ok(results)
    }
}

/// A batch that failed outright counts as a failure of every document in it.
/// A batch with the wrong number of slots cannot be lined up with the input.
fn expect_slots<T>(
    batch: BatchResult<T>,
    count: usize,
    operation: &str,
) -> Result<Vec<DocumentResult<T>>> {
    match batch {
        Ok(slots) if slots.len() == count => Ok(slots),
        Ok(slots) => bail!(
            "{} returned {} results for {} documents",
            operation,
            slots.len(),
            count
        ),
        Err(e) => {
            warn!(operation, error = %e, "Remote call failed");
            let error = DocumentError::new("ServiceUnavailable", e.to_string());
            Ok((0..count).map(|_| Err(error.clone())).collect())
        }
    }
}

fn message_or_unknown(error: &DocumentError) -> String {
    if error.message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        error.message.clone()
    }
}

fn merge(text: &str, slots: DocumentSlots) -> UnifiedTextAnalysis {
    let has_error = slots.any_error();
    let redacted_text = slots.pii.as_ref().ok().map(|p| p.redacted_text.clone());

    let lang = match slots.language {
        Ok(language) => AnalysisResult::ok(language),
        Err(_) => AnalysisResult::failed(LANGUAGE_FAILED),
    };

    let sentiment = match slots.sentiment {
        Ok(doc) => AnalysisResult::ok(Sentiment {
            confidence_score: doc.scores.for_label(&doc.label),
            sentiment: doc.label,
        }),
        Err(_) => AnalysisResult::failed(SENTIMENT_FAILED),
    };

    let pii = match slots.pii {
        Ok(doc) => AnalysisResult::ok(
            doc.entities
                .into_iter()
                .map(|e| PiiEntity {
                    category: e.category,
                    subcategory: e.subcategory,
                    confidence_score: e.confidence_score,
                    offset: e.offset,
                    length: e.length,
                })
                .collect(),
        ),
        Err(_) => AnalysisResult::failed_with(PII_FAILED, Vec::new()),
    };

    let key_phrases = match slots.key_phrases {
        Ok(key_phrases) => AnalysisResult::ok(KeyPhrases { key_phrases }),
        Err(_) => AnalysisResult::failed_with(KEY_PHRASES_FAILED, KeyPhrases::default()),
    };

    let entities = match slots.entities {
        Ok(found) => AnalysisResult::ok(
            found
                .into_iter()
                .map(|e| Entity {
                    category: e.category,
                    confidence_score: e.confidence_score,
                    offset: e.offset,
                    length: e.length,
                })
                .collect(),
        ),
        Err(_) => AnalysisResult::failed_with(ENTITIES_FAILED, Vec::new()),
    };

    let linked_entities = match slots.linked_entities {
        Ok(found) => AnalysisResult::ok(found),
        Err(_) => AnalysisResult::failed_with(LINKED_ENTITIES_FAILED, Vec::new()),
    };

    UnifiedTextAnalysis {
        has_error,
        input_text: Some(text.to_string()),
        error: None,
        redacted_text,
        lang: Some(lang),
        sentiment: Some(sentiment),
        pii: Some(pii),
        key_phrases: Some(key_phrases),
        entities: Some(entities),
        linked_entities: Some(linked_entities),
    }
}
