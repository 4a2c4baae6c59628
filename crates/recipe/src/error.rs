use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecipeError {
    #[error("io error on {path}: {message}")]
    Io { path: String, message: String },
    #[error("malformed catalog data: {0}")]
    InvalidData(String),
    #[error("invalid record {id:?}: {reason}")]
    InvalidRecord { id: String, reason: String },
    #[error("narrowing ratio must be in [0, 0.5), got {0}")]
    InvalidRatio(f64),
    #[error("dish {dish:?} references unknown ingredient {ingredient:?}")]
    UnknownIngredient { dish: String, ingredient: String },
}
