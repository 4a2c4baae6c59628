use index::IndexError;
use matcher::MatchError;
use recipe::RecipeError;
use regressor::RegressorError;
use semantic::SemanticError;
use thiserror::Error;

use crate::config::ConfigLoadError;

/// Failure taxonomy surfaced by the pipeline entrypoints.
///
/// `NotFood` and "no dish matched" are outcomes, not errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    #[error("model not loaded: {0}")]
    ModelNotLoaded(String),
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
    #[error("No matching food found")]
    NoMatchFound,
    #[error("{operation} timed out after {millis}ms")]
    DependencyTimeout { operation: String, millis: u64 },
    #[error("dependency failure: {0}")]
    DependencyError(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("dish {dish:?} references unknown ingredient {ingredient:?}")]
    UnknownIngredient { dish: String, ingredient: String },
}

impl PipelineError {
    /// Stable machine-readable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::ModelNotLoaded(_) => "MODEL_NOT_LOADED",
            PipelineError::InvalidImage(_) => "INVALID_IMAGE",
            PipelineError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            PipelineError::NoMatchFound => "NO_MATCH_FOUND",
            PipelineError::DependencyTimeout { .. } => "DEPENDENCY_TIMEOUT",
            PipelineError::DependencyError(_) => "DEPENDENCY_ERROR",
            PipelineError::Config(_) => "CONFIG_ERROR",
            PipelineError::UnknownIngredient { .. } => "UNKNOWN_INGREDIENT",
        }
    }
}

impl From<SemanticError> for PipelineError {
    fn from(err: SemanticError) -> Self {
        match err {
            SemanticError::Timeout { operation, millis } => PipelineError::DependencyTimeout {
                operation: operation.to_string(),
                millis,
            },
            SemanticError::InvalidImage(msg) => PipelineError::InvalidImage(msg),
            SemanticError::InvalidConfig(msg) => PipelineError::Config(msg),
            SemanticError::Http(msg) | SemanticError::Inference(msg) => PipelineError::DependencyError(msg),
        }
    }
}

impl From<IndexError> for PipelineError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::ShapeMismatch { expected, actual } => PipelineError::ShapeMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
            IndexError::Io { .. } => PipelineError::ModelNotLoaded(err.to_string()),
            IndexError::InvalidData(_) => PipelineError::Config(err.to_string()),
            IndexError::Backend(msg) => PipelineError::DependencyError(msg),
        }
    }
}

impl From<RegressorError> for PipelineError {
    fn from(err: RegressorError) -> Self {
        match err {
            RegressorError::ShapeMismatch { expected, actual } => PipelineError::ShapeMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            },
            RegressorError::InvalidWeights(_) | RegressorError::Io { .. } => {
                PipelineError::ModelNotLoaded(err.to_string())
            }
            RegressorError::NonFiniteOutput { .. } | RegressorError::Model(_) => {
                PipelineError::DependencyError(err.to_string())
            }
        }
    }
}

impl From<RecipeError> for PipelineError {
    fn from(err: RecipeError) -> Self {
        match err {
            RecipeError::UnknownIngredient { dish, ingredient } => {
                PipelineError::UnknownIngredient { dish, ingredient }
            }
            RecipeError::Io { .. } => PipelineError::ModelNotLoaded(err.to_string()),
            RecipeError::InvalidData(_) | RecipeError::InvalidRecord { .. } | RecipeError::InvalidRatio(_) => {
                PipelineError::Config(err.to_string())
            }
        }
    }
}

impl From<MatchError> for PipelineError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::NoMatchFound => PipelineError::NoMatchFound,
            MatchError::ShapeMismatch { expected, actual } => PipelineError::ShapeMismatch { expected, actual },
            MatchError::Semantic(inner) => inner.into(),
            MatchError::Index(inner) => inner.into(),
            MatchError::InvalidConfig(_) | MatchError::EmptyReferenceSet | MatchError::Canonical(_) => {
                PipelineError::Config(err.to_string())
            }
        }
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(err: ConfigLoadError) -> Self {
        PipelineError::Config(err.to_string())
    }
}
