use thiserror::Error;

/// Errors surfaced by embedders and the vision-language classifier.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SemanticError {
    /// Configuration is inconsistent (missing endpoint, zero dimension, unknown backend).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// The image bytes could not be decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// Transport failure or non-success HTTP status from a remote service.
    #[error("http failure: {0}")]
    Http(String),
    /// The remote service answered, but the payload was unusable.
    #[error("inference failure: {0}")]
    Inference(String),
    /// An external call did not complete within its bound.
    #[error("{operation} timed out after {millis}ms")]
    Timeout { operation: &'static str, millis: u64 },
}

impl SemanticError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SemanticError::Timeout { .. })
    }
}
