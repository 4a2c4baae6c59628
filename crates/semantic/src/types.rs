use serde::{Deserialize, Serialize};
use std::fmt;

/// Which embedder produced a vector. Image and text vectors are never compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingSpace {
    Image,
    Text,
}

impl fmt::Display for EmbeddingSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingSpace::Image => f.write_str("image"),
            EmbeddingSpace::Text => f.write_str("text"),
        }
    }
}

/// Embedder output: a fixed-length vector tagged with its space.
///
/// There is no mutable accessor; once produced the values are frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector {
    space: EmbeddingSpace,
    values: Vec<f32>,
}

impl EmbeddingVector {
    pub fn new(space: EmbeddingSpace, values: Vec<f32>) -> Self {
        Self { space, values }
    }

    pub fn image(values: Vec<f32>) -> Self {
        Self::new(EmbeddingSpace::Image, values)
    }

    pub fn text(values: Vec<f32>) -> Self {
        Self::new(EmbeddingSpace::Text, values)
    }

    pub fn space(&self) -> EmbeddingSpace {
        self.space
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn dim(&self) -> usize {
        self.values.len()
    }

    /// True when the vector lives in `space` and has exactly `dim` entries.
    pub fn has_shape(&self, space: EmbeddingSpace, dim: usize) -> bool {
        self.space == space && self.values.len() == dim
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_tag_space() {
        let img = EmbeddingVector::image(vec![0.1, 0.2]);
        let txt = EmbeddingVector::text(vec![0.1, 0.2]);
        assert_eq!(img.space(), EmbeddingSpace::Image);
        assert_eq!(txt.space(), EmbeddingSpace::Text);
        assert_ne!(img, txt);
    }

    #[test]
    fn shape_check_uses_space_and_dim() {
        let v = EmbeddingVector::image(vec![0.0; 4]);
        assert!(v.has_shape(EmbeddingSpace::Image, 4));
        assert!(!v.has_shape(EmbeddingSpace::Image, 5));
        assert!(!v.has_shape(EmbeddingSpace::Text, 4));
    }

    #[test]
    fn space_serializes_snake_case() {
        let json = serde_json::to_string(&EmbeddingSpace::Image).unwrap();
        assert_eq!(json, "\"image\"");
        assert_eq!(EmbeddingSpace::Text.to_string(), "text");
    }
}
