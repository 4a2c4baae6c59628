//! API route handlers
//!
//! - `health`: liveness, readiness and Prometheus metrics
//! - `scan`: nutrition estimate from a food photo
//! - `dish`: calorie range and allergy warning for a dish description

pub mod dish;
pub mod health;
pub mod scan;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info (GET /).
///
/// ```json
/// {
///   "name": "NutriScan Server",
///   "version": "0.1.0",
///   "api_version": "v1",
///   "endpoints": ["..."]
/// }
/// ```
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "NutriScan Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/scan",
            "/api/v1/dish/calories",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
