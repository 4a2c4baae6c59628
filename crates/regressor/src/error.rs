use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RegressorError {
    #[error("shape mismatch: model expects {expected} features, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("model produced a non-finite {field} value")]
    NonFiniteOutput { field: &'static str },
    #[error("invalid weights: {0}")]
    InvalidWeights(String),
    #[error("io error on {path}: {message}")]
    Io { path: String, message: String },
    #[error("model failure: {0}")]
    Model(String),
}
