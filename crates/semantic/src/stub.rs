use async_trait::async_trait;
use fxhash::hash64;

use crate::config::EmbedderConfig;
use crate::embedder::{ImageEmbedder, TextEmbedder};
use crate::error::SemanticError;
use crate::normalize::l2_normalize_in_place;
use crate::types::{EmbeddingSpace, EmbeddingVector};

/// Sinusoid values derived from a hash seed. Reproducible and cheap.
fn stub_vector(seed: u64, dim: usize, normalize: bool) -> Vec<f32> {
    let mut v = vec![0f32; dim];
    for (idx, value) in v.iter_mut().enumerate() {
        *value = ((seed >> (idx % 32)) as f32 * 0.0001).sin();
    }
    if normalize {
        l2_normalize_in_place(&mut v);
    }
    v
}

/// Deterministic text embedder: same text, same vector.
#[derive(Debug, Clone)]
pub struct StubTextEmbedder {
    model_name: String,
    dim: usize,
    normalize: bool,
}

impl StubTextEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            model_name: "stub-text".into(),
            dim,
            normalize: true,
        }
    }

    pub fn from_config(cfg: &EmbedderConfig) -> Self {
        Self {
            model_name: cfg.model_name_for(EmbeddingSpace::Text),
            dim: cfg.dimension_for(EmbeddingSpace::Text),
            normalize: cfg.normalize,
        }
    }
}

#[async_trait]
impl TextEmbedder for StubTextEmbedder {
    async fn embed_text(&self, text: &str) -> Result<EmbeddingVector, SemanticError> {
        let seed = hash64(text.as_bytes());
        Ok(EmbeddingVector::text(stub_vector(seed, self.dim, self.normalize)))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Deterministic image embedder.
///
/// The bytes are decoded first, so corrupt uploads fail the same way they
/// would against a real model. The vector is seeded from the decoded pixels.
#[derive(Debug, Clone)]
pub struct StubImageEmbedder {
    model_name: String,
    dim: usize,
    normalize: bool,
}

impl StubImageEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            model_name: "stub-image".into(),
            dim,
            normalize: true,
        }
    }

    pub fn from_config(cfg: &EmbedderConfig) -> Self {
        Self {
            model_name: cfg.model_name_for(EmbeddingSpace::Image),
            dim: cfg.dimension_for(EmbeddingSpace::Image),
            normalize: cfg.normalize,
        }
    }
}

#[async_trait]
impl ImageEmbedder for StubImageEmbedder {
    async fn embed_image(&self, bytes: &[u8]) -> Result<EmbeddingVector, SemanticError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| SemanticError::InvalidImage(e.to_string()))?;
        let rgb = decoded.to_rgb8();
        let mut seed = hash64(rgb.as_raw());
        seed ^= (u64::from(rgb.width()) << 32) | u64::from(rgb.height());
        Ok(EmbeddingVector::image(stub_vector(seed, self.dim, self.normalize)))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(shade: u8) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([shade, 64, 32]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn text_stub_is_deterministic() {
        let embedder = StubTextEmbedder::new(384);
        let a = embedder.embed_text("pho bo").await.unwrap();
        let b = embedder.embed_text("pho bo").await.unwrap();
        let c = embedder.embed_text("com ga").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.dim(), 384);
        assert_eq!(a.space(), EmbeddingSpace::Text);
    }

    #[tokio::test]
    async fn text_stub_is_unit_length() {
        let embedder = StubTextEmbedder::new(64);
        let v = embedder.embed_text("banh mi").await.unwrap();
        let norm: f32 = v.as_slice().iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn image_stub_decodes_first() {
        let embedder = StubImageEmbedder::new(1280);
        let err = embedder.embed_image(b"definitely not an image").await.unwrap_err();
        assert!(matches!(err, SemanticError::InvalidImage(_)));
    }

    #[tokio::test]
    async fn image_stub_tracks_pixels() {
        let embedder = StubImageEmbedder::new(1280);
        let a = embedder.embed_image(&png_bytes(10)).await.unwrap();
        let again = embedder.embed_image(&png_bytes(10)).await.unwrap();
        let b = embedder.embed_image(&png_bytes(200)).await.unwrap();
        assert_eq!(a, again);
        assert_ne!(a, b);
        assert_eq!(a.space(), EmbeddingSpace::Image);
        assert_eq!(a.dim(), 1280);
    }

    #[test]
    fn from_config_uses_space_defaults() {
        let cfg = EmbedderConfig::default();
        assert_eq!(StubImageEmbedder::from_config(&cfg).dimension(), 1280);
        assert_eq!(StubTextEmbedder::from_config(&cfg).dimension(), 384);
    }
}
