use canonical::CanonicalError;
use index::IndexError;
use semantic::{EmbeddingSpace, SemanticError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MatchError {
    #[error("invalid matcher config: {0}")]
    InvalidConfig(String),
    #[error("reference embedding set is empty")]
    EmptyReferenceSet,
    /// Vector of the wrong space or length. Shapes read like `image[1280]`.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
    #[error("No matching food found")]
    NoMatchFound,
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
    #[error(transparent)]
    Index(IndexError),
}

impl MatchError {
    pub(crate) fn shape(
        expected: (EmbeddingSpace, usize),
        actual: (EmbeddingSpace, usize),
    ) -> Self {
        MatchError::ShapeMismatch {
            expected: format!("{}[{}]", expected.0, expected.1),
            actual: format!("{}[{}]", actual.0, actual.1),
        }
    }
}

impl From<IndexError> for MatchError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::ShapeMismatch { expected, actual } => MatchError::ShapeMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
            other => MatchError::Index(other),
        }
    }
}
