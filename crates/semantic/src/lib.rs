//! NutriScan embedding and vision-language capabilities
//!
//! This crate turns photos and dish descriptions into vectors, and wraps the
//! vision-language model the pipeline asks short questions of ("is this
//! food?", "is this dish safe with a peanut allergy?").
//!
//! Two backends for each capability:
//!
//! - **API mode** - Hugging Face style feature-extraction endpoints for the
//!   embedders, an OpenAI-compatible chat-completions endpoint for the
//!   classifier.
//! - **Stub mode** - Deterministic vectors and canned replies for tests and
//!   local development. The image stub still decodes the bytes, so garbage
//!   uploads fail the same way they would in production.
//!
//! Everything sits behind async traits ([`TextEmbedder`], [`ImageEmbedder`],
//! [`VisionLanguage`]) so the pipeline can be driven by scripted doubles.
//! Bound every remote call with [`with_timeout`].
//!
//! ```no_run
//! use semantic::{build_text_embedder, EmbedderConfig};
//!
//! # async fn run() -> Result<(), semantic::SemanticError> {
//! let embedder = build_text_embedder(&EmbedderConfig::default())?;
//! let v = embedder.embed_text("pho bo").await?;
//! assert_eq!(v.dim(), 384);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod types;

mod api;
mod embedder;
mod normalize;
mod stub;
mod timeout;
mod vision;

use std::sync::Arc;

pub use crate::api::{ApiImageEmbedder, ApiTextEmbedder};
pub use crate::config::{Backend, ClassifierConfig, EmbedderConfig, StubReplies};
pub use crate::embedder::{ImageEmbedder, TextEmbedder};
pub use crate::error::SemanticError;
pub use crate::normalize::{cosine_similarity, l2_normalize_in_place};
pub use crate::stub::{StubImageEmbedder, StubTextEmbedder};
pub use crate::timeout::with_timeout;
pub use crate::types::{EmbeddingSpace, EmbeddingVector};
pub use crate::vision::{ChatVisionClient, StubVisionLanguage, VisionLanguage};

/// Builds the configured text embedder.
pub fn build_text_embedder(cfg: &EmbedderConfig) -> Result<Arc<dyn TextEmbedder>, SemanticError> {
    cfg.validate()?;
    let embedder: Arc<dyn TextEmbedder> = match cfg.backend {
        Backend::Api => Arc::new(ApiTextEmbedder::new(cfg)?),
        Backend::Stub => Arc::new(StubTextEmbedder::from_config(cfg)),
    };
    tracing::info!(
        backend = ?cfg.backend,
        model = embedder.model_name(),
        dim = embedder.dimension(),
        "text embedder ready"
    );
    Ok(embedder)
}

/// Builds the configured image embedder.
pub fn build_image_embedder(cfg: &EmbedderConfig) -> Result<Arc<dyn ImageEmbedder>, SemanticError> {
    cfg.validate()?;
    let embedder: Arc<dyn ImageEmbedder> = match cfg.backend {
        Backend::Api => Arc::new(ApiImageEmbedder::new(cfg)?),
        Backend::Stub => Arc::new(StubImageEmbedder::from_config(cfg)),
    };
    tracing::info!(
        backend = ?cfg.backend,
        model = embedder.model_name(),
        dim = embedder.dimension(),
        "image embedder ready"
    );
    Ok(embedder)
}

/// Builds the configured vision-language classifier.
pub fn build_classifier(cfg: &ClassifierConfig) -> Result<Arc<dyn VisionLanguage>, SemanticError> {
    cfg.validate()?;
    let classifier: Arc<dyn VisionLanguage> = match cfg.backend {
        Backend::Api => Arc::new(ChatVisionClient::new(cfg)?),
        Backend::Stub => Arc::new(StubVisionLanguage::new(cfg.stub.clone())),
    };
    tracing::info!(backend = ?cfg.backend, model = classifier.model_name(), "classifier ready");
    Ok(classifier)
}
