use serde::{Deserialize, Serialize};

use crate::error::SemanticError;
use crate::types::EmbeddingSpace;

/// Default image feature size (EfficientNet-lite0 penultimate layer).
pub const DEFAULT_IMAGE_DIM: usize = 1280;
/// Default text feature size (all-MiniLM-L6-v2).
pub const DEFAULT_TEXT_DIM: usize = 384;

pub const DEFAULT_CHAT_URL: &str = "https://router.huggingface.co/v1/chat/completions";
pub const DEFAULT_VLM_MODEL: &str = "Qwen/Qwen2.5-VL-7B-Instruct";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Remote HTTP service.
    Api,
    /// Deterministic local stand-in for tests and development.
    #[default]
    Stub,
}

/// Embedder settings shared by the image and text sides.
///
/// `dimension` and `model_name` fall back to per-space defaults so a YAML
/// section only has to name what differs.
///
/// ```rust
/// use semantic::{EmbedderConfig, EmbeddingSpace};
///
/// let cfg = EmbedderConfig::default();
/// assert_eq!(cfg.dimension_for(EmbeddingSpace::Image), 1280);
/// assert_eq!(cfg.dimension_for(EmbeddingSpace::Text), 384);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbedderConfig {
    pub backend: Backend,
    pub model_name: Option<String>,
    /// Feature-extraction endpoint for the `api` backend.
    pub api_url: Option<String>,
    /// Full `Authorization` header value. Takes precedence over `api_token_env`.
    pub api_auth_header: Option<String>,
    /// Environment variable holding a bearer token.
    pub api_token_env: Option<String>,
    pub dimension: Option<usize>,
    /// L2-normalize vectors before handing them out.
    pub normalize: bool,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Stub,
            model_name: None,
            api_url: None,
            api_auth_header: None,
            api_token_env: Some("HF_TOKEN".into()),
            dimension: None,
            normalize: true,
        }
    }
}

impl EmbedderConfig {
    pub fn dimension_for(&self, space: EmbeddingSpace) -> usize {
        self.dimension.unwrap_or(match space {
            EmbeddingSpace::Image => DEFAULT_IMAGE_DIM,
            EmbeddingSpace::Text => DEFAULT_TEXT_DIM,
        })
    }

    pub fn model_name_for(&self, space: EmbeddingSpace) -> String {
        self.model_name.clone().unwrap_or_else(|| {
            match space {
                EmbeddingSpace::Image => "efficientnet-lite0",
                EmbeddingSpace::Text => "all-MiniLM-L6-v2",
            }
            .to_string()
        })
    }

    pub fn validate(&self) -> Result<(), SemanticError> {
        if self.dimension == Some(0) {
            return Err(SemanticError::InvalidConfig(
                "embedder dimension must be > 0".into(),
            ));
        }
        if self.backend == Backend::Api && self.api_url.is_none() {
            return Err(SemanticError::InvalidConfig(
                "api_url is required for the api backend".into(),
            ));
        }
        Ok(())
    }
}

/// Fixed replies for the stub classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StubReplies {
    /// Reply to `classify` calls that carry an image.
    pub image_reply: String,
    /// Reply to text-only `classify` calls.
    pub text_reply: String,
    pub describe_reply: String,
}

impl Default for StubReplies {
    fn default() -> Self {
        Self {
            image_reply: "FOOD".into(),
            text_reply: "compatible".into(),
            describe_reply: "Keyword: apple".into(),
        }
    }
}

/// Vision-language classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub backend: Backend,
    /// OpenAI-compatible chat-completions endpoint.
    pub api_url: String,
    pub model: String,
    pub api_auth_header: Option<String>,
    pub api_token_env: Option<String>,
    pub max_tokens: u32,
    pub stub: StubReplies,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Stub,
            api_url: DEFAULT_CHAT_URL.into(),
            model: DEFAULT_VLM_MODEL.into(),
            api_auth_header: None,
            api_token_env: Some("HF_TOKEN".into()),
            max_tokens: 64,
            stub: StubReplies::default(),
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), SemanticError> {
        if self.backend == Backend::Api && self.api_url.trim().is_empty() {
            return Err(SemanticError::InvalidConfig(
                "classifier api_url must not be empty".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(SemanticError::InvalidConfig(
                "classifier max_tokens must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Explicit header wins, then the token environment variable.
pub(crate) fn resolve_auth_header(explicit: Option<&str>, token_env: Option<&str>) -> Option<String> {
    if let Some(header) = explicit {
        return Some(header.to_string());
    }
    let var = token_env?;
    match std::env::var(var) {
        Ok(token) if !token.trim().is_empty() => Some(format!("Bearer {}", token.trim())),
        _ => {
            tracing::warn!(env = var, "api token variable is unset; sending unauthenticated requests");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedder_defaults_are_per_space() {
        let cfg = EmbedderConfig::default();
        assert_eq!(cfg.backend, Backend::Stub);
        assert_eq!(cfg.dimension_for(EmbeddingSpace::Image), DEFAULT_IMAGE_DIM);
        assert_eq!(cfg.dimension_for(EmbeddingSpace::Text), DEFAULT_TEXT_DIM);
        assert_eq!(cfg.model_name_for(EmbeddingSpace::Text), "all-MiniLM-L6-v2");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn explicit_dimension_overrides_default() {
        let cfg = EmbedderConfig {
            dimension: Some(16),
            ..Default::default()
        };
        assert_eq!(cfg.dimension_for(EmbeddingSpace::Image), 16);
    }

    #[test]
    fn api_backend_requires_url() {
        let cfg = EmbedderConfig {
            backend: Backend::Api,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(SemanticError::InvalidConfig(_))));
    }

    #[test]
    fn zero_dimension_rejected() {
        let cfg = EmbedderConfig {
            dimension: Some(0),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn classifier_defaults_target_hf_router() {
        let cfg = ClassifierConfig::default();
        assert_eq!(cfg.api_url, DEFAULT_CHAT_URL);
        assert_eq!(cfg.model, DEFAULT_VLM_MODEL);
        assert_eq!(cfg.stub.image_reply, "FOOD");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let cfg: EmbedderConfig =
            serde_json::from_str(r#"{"backend": "api", "api_url": "http://x"}"#).unwrap();
        assert_eq!(cfg.backend, Backend::Api);
        assert!(cfg.normalize);
        assert_eq!(cfg.api_token_env.as_deref(), Some("HF_TOKEN"));
    }

    #[test]
    fn explicit_header_wins() {
        let header = resolve_auth_header(Some("Bearer abc"), Some("NUTRI_TEST_UNSET_TOKEN"));
        assert_eq!(header.as_deref(), Some("Bearer abc"));
        assert_eq!(resolve_auth_header(None, Some("NUTRI_TEST_UNSET_TOKEN_2")), None);
        assert_eq!(resolve_auth_header(None, None), None);
    }
}
