//! Router-level tests: HTTP shapes of every route against a canned provider.

use analysis::{
    Analyzer, BatchResult, DetectedLanguage, DocumentError, DocumentSentiment, LinkedEntity,
    PiiDocument, ProviderError, RecognizedEntity, SentimentScores, TextAnalyticsProvider,
};
use api::{AppConfig, AppState, build_router};
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::ServiceExt;

#[derive(Default)]
struct StubProvider {
    calls: AtomicUsize,
    pii_fails: bool,
    language_down: bool,
    short_sentiment_batch: bool,
}

impl StubProvider {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

fn each<T>(documents: &[String], f: impl Fn(&str) -> T) -> BatchResult<T> {
    Ok(documents.iter().map(|d| Ok(f(d))).collect())
}

#[async_trait]
impl TextAnalyticsProvider for StubProvider {
    async fn detect_language(&self, documents: &[String]) -> BatchResult<DetectedLanguage> {
        self.hit();
        if self.language_down {
            return Err(ProviderError::Status {
                operation: "language detection",
                status: 401,
                message: "Access denied".to_string(),
            });
        }
        each(documents, |_| DetectedLanguage {
            name: "English".to_string(),
            iso6391_name: "en".to_string(),
            confidence_score: 1.0,
        })
    }

    async fn analyze_sentiment(
        &self,
        documents: &[String],
        _language: Option<&str>,
    ) -> BatchResult<DocumentSentiment> {
        self.hit();
        let mut slots = each(documents, |_| DocumentSentiment {
            label: "positive".to_string(),
            scores: SentimentScores {
                positive: 0.95,
                neutral: 0.04,
                negative: 0.01,
            },
        })?;
        if self.short_sentiment_batch {
            slots.clear();
        }
        Ok(slots)
    }

    async fn recognize_pii_entities(
        &self,
        documents: &[String],
        _language: Option<&str>,
    ) -> BatchResult<PiiDocument> {
        self.hit();
        if self.pii_fails {
            return Ok(documents
                .iter()
                .map(|_| Err(DocumentError::new("InvalidArgument", "unsupported language")))
                .collect());
        }
        each(documents, |text| PiiDocument {
            redacted_text: text.replace("555-123-4567", "************"),
            entities: vec![RecognizedEntity {
                text: "555-123-4567".to_string(),
                category: "PhoneNumber".to_string(),
                subcategory: None,
                confidence_score: 0.8,
                offset: 10,
                length: 12,
            }],
        })
    }

    async fn extract_key_phrases(
        &self,
        documents: &[String],
        _language: Option<&str>,
    ) -> BatchResult<Vec<String>> {
        self.hit();
        each(documents, |_| vec!["phone".to_string()])
    }

    async fn recognize_entities(
        &self,
        documents: &[String],
        _language: Option<&str>,
    ) -> BatchResult<Vec<RecognizedEntity>> {
        self.hit();
        each(documents, |_| Vec::new())
    }

    async fn recognize_linked_entities(
        &self,
        documents: &[String],
        _language: Option<&str>,
    ) -> BatchResult<Vec<LinkedEntity>> {
        self.hit();
        each(documents, |_| Vec::new())
    }
}

fn test_app(provider: Arc<StubProvider>) -> Router {
    let config = AppConfig {
        environment: "test".to_string(),
        ..AppConfig::default()
    };
    let state = AppState::new(config, Analyzer::new(provider));
    build_router(state).unwrap()
}

async fn make_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_root_reports_version() {
    let app = test_app(Arc::default());
    let (status, body) = make_request(&app, Method::GET, "/", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "1.0.0");
    assert_eq!(body["description"], "Azure AI Language Service API");
}

#[tokio::test]
async fn test_settings_reports_environment() {
    let app = test_app(Arc::default());
    let (status, body) = make_request(&app, Method::GET, "/settings", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"environment": "test"}));
}

#[tokio::test]
async fn test_blank_statement_skips_provider() {
    let provider = Arc::new(StubProvider::default());
    let app = test_app(provider.clone());

    for statement in ["", "   \n\t"] {
        let (status, body) = make_request(
            &app,
            Method::POST,
            "/analyze",
            Some(json!({"statement": statement})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["has_error"], true);
        assert_eq!(body["error"], "No text provided for analysis");
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_post_analyze_returns_unified_result() {
    let provider = Arc::new(StubProvider::default());
    let app = test_app(provider.clone());

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/analyze",
        Some(json!({"statement": "Call me at 555-123-4567"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_error"], false);
    assert_eq!(body["input_text"], "Call me at 555-123-4567");
    assert_eq!(body["redacted_text"], "Call me at ************");
    assert_eq!(body["lang"]["result"]["iso6391_name"], "en");
    assert_eq!(body["sentiment"]["result"]["sentiment"], "positive");
    assert_eq!(body["sentiment"]["result"]["confidence_score"], 0.95);
    assert_eq!(
        body["pii"],
        json!({
            "has_error": false,
            "error": null,
            "result": [{
                "category": "PhoneNumber",
                "subcategory": null,
                "confidence_score": 0.8,
                "offset": 10,
                "length": 12
            }]
        })
    );
    assert_eq!(body["key_phrases"]["result"]["key_phrases"], json!(["phone"]));
    assert_eq!(body["entities"]["result"], json!([]));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_get_analyze_matches_post() {
    let app = test_app(Arc::default());

    let (_, from_get) = make_request(
        &app,
        Method::GET,
        "/analyze?statement=Call%20me%20at%20555-123-4567",
        None,
    )
    .await;
    let (_, from_post) = make_request(
        &app,
        Method::POST,
        "/analyze",
        Some(json!({"statement": "Call me at 555-123-4567"})),
    )
    .await;

    assert_eq!(from_get, from_post);
}

#[tokio::test]
async fn test_get_analyze_without_statement_is_an_error_object() {
    let app = test_app(Arc::default());
    let (status, body) = make_request(&app, Method::GET, "/analyze", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_error"], true);
    assert_eq!(body["error"], "No text provided for analysis");
}

#[tokio::test]
async fn test_field_failure_keeps_siblings() {
    let provider = Arc::new(StubProvider {
        pii_fails: true,
        ..Default::default()
    });
    let app = test_app(provider);

    let (_, body) = make_request(
        &app,
        Method::POST,
        "/analyze",
        Some(json!({"statement": "Hola"})),
    )
    .await;

    assert_eq!(body["has_error"], true);
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["pii"]["error"], "PII analysis failed");
    assert_eq!(body["pii"]["result"], json!([]));
    assert_eq!(body["redacted_text"], Value::Null);
    assert_eq!(body["sentiment"]["has_error"], false);
}

#[tokio::test]
async fn test_language_outage_is_fatal() {
    let provider = Arc::new(StubProvider {
        language_down: true,
        ..Default::default()
    });
    let app = test_app(provider.clone());

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/analyze",
        Some(json!({"statement": "hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_error"], true);
    assert_eq!(body["input_text"], "hello");
    assert!(body["error"].as_str().unwrap().contains("Access denied"));
    assert_eq!(body["sentiment"], Value::Null);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unexpected_failure_is_error_shaped() {
    let provider = Arc::new(StubProvider {
        short_sentiment_batch: true,
        ..Default::default()
    });
    let app = test_app(provider);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/analyze",
        Some(json!({"statement": "hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["has_error"], true);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Analysis failed: sentiment analysis returned 0 results")
    );
}

#[tokio::test]
async fn test_metrics_track_outcomes() {
    let provider = Arc::new(StubProvider {
        pii_fails: true,
        ..Default::default()
    });
    let app = test_app(provider);

    make_request(&app, Method::POST, "/analyze", Some(json!({"statement": ""}))).await;
    make_request(&app, Method::POST, "/analyze", Some(json!({"statement": "hi"}))).await;

    let (status, body) = make_request(&app, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_requests"], 2);
    assert_eq!(body["rejected_requests"], 1);
    assert_eq!(body["degraded_requests"], 1);
    assert_eq!(body["total_documents_analyzed"], 1);
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let app = test_app(Arc::default());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/analyze")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}
