use std::future::Future;
use std::time::Duration;

use crate::error::SemanticError;

/// Runs `fut` under a hard deadline.
///
/// Expiry maps to [`SemanticError::Timeout`] tagged with `operation`. There is
/// no retry: one attempt per call.
pub async fn with_timeout<T, F>(
    operation: &'static str,
    limit: Duration,
    fut: F,
) -> Result<T, SemanticError>
where
    F: Future<Output = Result<T, SemanticError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout_ms = limit.as_millis() as u64, "external call timed out");
            Err(SemanticError::Timeout {
                operation,
                millis: limit.as_millis() as u64,
            })
        }
    }
}
