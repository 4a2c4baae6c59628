use async_trait::async_trait;

use crate::error::SemanticError;
use crate::types::EmbeddingVector;

/// Maps free text to a text-space vector of [`dimension`](Self::dimension) entries.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed_text(&self, text: &str) -> Result<EmbeddingVector, SemanticError>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Maps encoded image bytes (JPEG/PNG/WebP) to an image-space vector.
///
/// Undecodable input fails with [`SemanticError::InvalidImage`].
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    async fn embed_image(&self, bytes: &[u8]) -> Result<EmbeddingVector, SemanticError>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}
