use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use nutriscan::{estimate_from_image, PipelineError, ScanOutcome};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Estimate nutrition from a food photo.
///
/// The request body is the raw encoded image. Responses:
///
/// - `{"source": "regression", "mass", "calories", "fat", "carb", "protein", "similarity"}`
/// - `{"source": "lookup", "food", "reference_id", "score", "calories", "fat", "carb", "protein", "similarity"}`
/// - `{"status": "NOT_FOOD"}`
///
/// An upload over the body limit answers 413 `PAYLOAD_TOO_LARGE`.
pub async fn scan_food(
    State(state): State<Arc<ServerState>>,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<impl IntoResponse> {
    let start = Instant::now();
    let ctx = state.pipeline()?;
    let body = body?;

    let result = estimate_from_image(ctx, &body).await;
    let outcome_label = match &result {
        Ok(outcome) => outcome.label(),
        Err(PipelineError::NoMatchFound) => "no_match",
        Err(_) => "error",
    };
    metrics::counter!("nutriscan_scan_requests_total", "outcome" => outcome_label).increment(1);
    metrics::histogram!("nutriscan_request_duration_seconds", "route" => "scan")
        .record(start.elapsed().as_secs_f64());

    let outcome = result?;
    tracing::info!(
        outcome = outcome_label,
        bytes = body.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "scan handled"
    );
    Ok(Json(scan_body(&outcome)?))
}

fn scan_body(outcome: &ScanOutcome) -> Result<Value, ServerError> {
    match outcome {
        ScanOutcome::NotFood => Ok(json!({ "status": "NOT_FOOD" })),
        other => Ok(serde_json::to_value(other)?),
    }
}
