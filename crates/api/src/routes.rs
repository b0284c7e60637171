use analysis::UnifiedTextAnalysis;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::AppState;
use crate::metrics::{MetricsSnapshot, TimedOperation};

pub const NO_TEXT: &str = "No text provided for analysis";
pub const NO_RESULTS: &str = "No analysis results returned";
const DESCRIPTION: &str = "Azure AI Language Service API";

#[derive(Serialize)]
pub struct ServiceInfo {
    version: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
pub struct SettingsResponse {
    environment: String,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    statement: String,
}

#[derive(Deserialize)]
pub struct AnalyzeQuery {
    #[serde(default)]
    statement: Option<String>,
}

pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        version: env!("CARGO_PKG_VERSION"),
        description: DESCRIPTION,
    })
}

pub async fn settings(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        environment: state.config.environment.clone(),
    })
}

pub async fn analyze_body(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Json<UnifiedTextAnalysis> {
    Json(analyze_statement(&state, &req.statement).await)
}

/// Same contract as the POST route; a missing `statement` counts as blank.
pub async fn analyze_query(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
) -> Json<UnifiedTextAnalysis> {
    let statement = query.statement.unwrap_or_default();
    Json(analyze_statement(&state, &statement).await)
}

pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Run one statement through the analyzer. Every outcome, including
/// unexpected failures, is folded into the error-shaped response.
async fn analyze_statement(state: &AppState, statement: &str) -> UnifiedTextAnalysis {
    if statement.trim().is_empty() {
        state.metrics.record_rejected();
        return UnifiedTextAnalysis::failed(None, NO_TEXT);
    }

    let request_id = Uuid::new_v4();
    let span = info_span!("analyze", %request_id, chars = statement.chars().count());

    async {
        let timer = TimedOperation::start();
        let documents = vec![statement.to_string()];

        let response = match state.analyzer.analyze(&documents).await {
            Ok(results) => results
                .into_iter()
                .next()
                .unwrap_or_else(|| UnifiedTextAnalysis::failed(None, NO_RESULTS)),
            Err(e) => {
                error!(error = %e, "Analysis failed");
                UnifiedTextAnalysis::failed(None, format!("Analysis failed: {e}"))
            }
        };

        state.metrics.record_analysis(timer.elapsed(), documents.len());
        state.metrics.record_request(!response.has_error);
        info!(
            has_error = response.has_error,
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        response
    }
    .instrument(span)
    .await
}
