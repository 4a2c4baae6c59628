use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use nutriscan::{estimate_dish_calories, DishEstimate};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

/// Body of `POST /api/v1/dish/calories`.
#[derive(Debug, Deserialize)]
pub struct DishRequest {
    pub description: String,
    #[serde(default)]
    pub allergy: Option<String>,
}

/// Calorie range and allergy warning for a free-text dish description.
///
/// Response: `{"calories_range": [low, high] | null, "warning": "none" | <text>, "dish": {"id", "score"}}`.
pub async fn dish_calories(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<DishRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let start = Instant::now();
    let ctx = state.pipeline()?;
    let Json(request) = payload.map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;

    let result = estimate_dish_calories(ctx, &request.description, request.allergy.as_deref()).await;
    let outcome_label = match &result {
        Ok(estimate) => dish_outcome(estimate),
        Err(_) => "error",
    };
    metrics::counter!("nutriscan_dish_requests_total", "outcome" => outcome_label).increment(1);
    metrics::histogram!("nutriscan_request_duration_seconds", "route" => "dish")
        .record(start.elapsed().as_secs_f64());

    let estimate = result?;
    tracing::info!(
        outcome = outcome_label,
        dish = estimate.dish.as_ref().map(|d| d.id.as_str()).unwrap_or("-"),
        duration_ms = start.elapsed().as_millis() as u64,
        "dish estimate handled"
    );
    Ok(Json(estimate))
}

/// Metric label: `no_range` is a matched dish whose interval was unusable.
fn dish_outcome(estimate: &DishEstimate) -> &'static str {
    match (&estimate.dish, &estimate.calories_range) {
        (Some(_), Some(_)) => "matched",
        (Some(_), None) => "no_range",
        (None, _) => "unmatched",
    }
}
