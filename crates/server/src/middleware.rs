use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of one request, stored in the request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Takes `x-request-id` from the caller or mints a v4 UUID, and echoes it on
/// the response.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Logs each request with its id, status and latency, and counts responses
/// by status class.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    tracing::info!(%method, %path, %request_id, "Request started");

    let response = next.run(request).await;
    let status = response.status();
    let class = match status.as_u16() {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    metrics::counter!("nutriscan_http_responses_total", "class" => class).increment(1);

    tracing::info!(
        %method,
        %path,
        status = status.as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        %request_id,
        "Request completed"
    );

    response
}
