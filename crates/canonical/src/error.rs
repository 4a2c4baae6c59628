use thiserror::Error;

/// Errors that can occur while building canonical keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("text is empty after normalization: {0:?}")]
    EmptyKey(String),
}
