//! REST API handlers for sale analysis and operational endpoints.

use attribution_core::error::AttributionError;
use attribution_core::types::{
    AnalysisReport, CampaignCandidate, EventSourceStatus, PersistenceStatus,
    RegistrationStatus, SaleRecord, StoredSale,
};
use attribution_engine::estimator::format_click_instant;
use attribution_engine::AnalysisOrchestrator;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
    pub node_id: String,
    pub start_time: Instant,
    pub max_message_len: usize,
    pub list_limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub sale: SaleRecord,
    pub estimated_click_time: String,
    pub candidates: Vec<CampaignCandidate>,
    pub top_candidate: Option<CampaignCandidate>,
    pub events_examined: usize,
    pub event_source: EventSourceStatus,
    pub persistence: PersistenceStatus,
    pub registration: RegistrationStatus,
}

impl From<AnalysisReport> for AnalyzeResponse {
    fn from(report: AnalysisReport) -> Self {
        let result = report.result;
        Self {
            estimated_click_time: format_click_instant(&result.estimated_click),
            top_candidate: result.candidates.first().cloned(),
            candidates: result.candidates,
            events_examined: result.events_examined,
            event_source: result.event_source,
            sale: result.sale,
            persistence: report.persistence,
            registration: report.registration,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    pub limit: Option<usize>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: &str, message: impl Into<String>) -> ApiError {
    metrics::counter!("api.validation_errors").increment(1);
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

/// Validate the analyze request at the API boundary.
fn validate_message(message: &str, max_len: usize) -> Result<(), &'static str> {
    if message.trim().is_empty() {
        return Err("'message' must not be empty");
    }
    if message.len() > max_len {
        return Err("'message' exceeds maximum length");
    }
    Ok(())
}

/// POST /v1/analyze — attribute a sale notification to a campaign.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if let Err(msg) = validate_message(&request.message, state.max_message_len) {
        warn!(error = msg, "Analyze request validation failed");
        return Err(bad_request("invalid_request", msg));
    }

    match state.orchestrator.analyze(&request.message).await {
        Ok(report) => Ok(Json(report.into())),
        Err(e) if e.is_client_error() => Err(bad_request(e.code(), e.to_string())),
        Err(e) => {
            error!(error = %e, "Sale analysis failed");
            metrics::counter!("api.errors").increment(1);
            Err(internal_error(&e))
        }
    }
}

/// GET /v1/sales — stored analyses, most recent first.
pub async fn list_sales(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> Result<Json<Vec<StoredSale>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.list_limit)
        .min(state.list_limit);

    state
        .orchestrator
        .store()
        .recent(limit)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Failed to list stored sales");
            internal_error(&e)
        })
}

fn internal_error(e: &AttributionError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.code().to_string(),
            message: "Internal processing error".to_string(),
        }),
    )
}

/// GET /health — Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        store: state.orchestrator.store().backend().to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /ready — Readiness probe.
pub async fn readiness() -> StatusCode {
    StatusCode::OK
}

/// GET /live — Liveness probe.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub store: String,
    pub uptime_secs: u64,
}
