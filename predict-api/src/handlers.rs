use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    Json,
};
use classifier_core::{
    metrics::{record_request, Outcome},
    PredictionResult,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

/// Health check; also warms the model up on first use.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.classifier.ensure_loaded().await?;
    Ok(Json(json!({ "success": true })))
}

/// The main predict endpoint
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictionResult>, ApiError> {
    let surface = state.validator.surface();

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        record_request(surface, Outcome::Rejected);
        ApiError::bad_request(format!("Failed to decode JSON object: {e}"))
    })?;

    let request = state.validator.parse(payload).map_err(|e| {
        debug!(error = %e, "Rejected predict request");
        record_request(surface, Outcome::Rejected);
        ApiError::from(e)
    })?;

    let prediction = state
        .classifier
        .classify(&request.text, &request.candidate_labels)
        .await
        .map_err(|e| {
            record_request(surface, Outcome::Failed);
            ApiError::from(e)
        })?;

    record_request(surface, Outcome::Success);
    info!(label = %prediction.label, score = prediction.score, "Prediction served");
    Ok(Json(prediction))
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(metrics_exporter_prometheus::PrometheusHandle::render)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Metrics are not enabled."))
}

pub async fn not_found() -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "The requested URL was not found on the server.",
    )
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "The method is not allowed for the requested URL.",
    )
}
