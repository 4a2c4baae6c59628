use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("io error on {path}: {message}")]
    Io { path: String, message: String },
    #[error("malformed reference data: {0}")]
    InvalidData(String),
    #[error("shape mismatch: expected {expected} dimensions, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("reference backend failure: {0}")]
    Backend(String),
}

impl IndexError {
    pub(crate) fn io(path: &std::path::Path, err: std::io::Error) -> Self {
        IndexError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
