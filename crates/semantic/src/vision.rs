//! Vision-language classification and description capability.
//!
//! The pipeline treats the model as an opaque text oracle: it sends a prompt
//! (optionally with an image) and gets a reply string back. Interpreting the
//! reply is the caller's business.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::api::{build_http_client, image_mime_type, send};
use crate::config::{resolve_auth_header, ClassifierConfig, StubReplies};
use crate::error::SemanticError;

#[async_trait]
pub trait VisionLanguage: Send + Sync {
    /// Short label for `prompt`, optionally grounded on an image.
    async fn classify(&self, prompt: &str, image: Option<&[u8]>) -> Result<String, SemanticError>;

    /// Free-form description of `image` guided by `prompt`.
    async fn describe(&self, prompt: &str, image: &[u8]) -> Result<String, SemanticError>;

    fn model_name(&self) -> &str;
}

/// OpenAI-compatible chat-completions client. Images travel as data URLs.
#[derive(Debug, Clone)]
pub struct ChatVisionClient {
    client: reqwest::Client,
    url: String,
    model: String,
    auth_header: Option<String>,
    max_tokens: u32,
}

impl ChatVisionClient {
    pub fn new(cfg: &ClassifierConfig) -> Result<Self, SemanticError> {
        cfg.validate()?;
        Ok(Self {
            client: build_http_client()?,
            url: cfg.api_url.clone(),
            model: cfg.model.clone(),
            auth_header: resolve_auth_header(cfg.api_auth_header.as_deref(), cfg.api_token_env.as_deref()),
            max_tokens: cfg.max_tokens,
        })
    }

    async fn complete(&self, prompt: &str, image: Option<&[u8]>) -> Result<String, SemanticError> {
        let payload = build_chat_payload(&self.model, prompt, image, self.max_tokens)?;
        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }
        let response = send(request).await?;
        extract_reply(response)
    }
}

#[async_trait]
impl VisionLanguage for ChatVisionClient {
    async fn classify(&self, prompt: &str, image: Option<&[u8]>) -> Result<String, SemanticError> {
        self.complete(prompt, image).await
    }

    async fn describe(&self, prompt: &str, image: &[u8]) -> Result<String, SemanticError> {
        self.complete(prompt, Some(image)).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn build_chat_payload(
    model: &str,
    prompt: &str,
    image: Option<&[u8]>,
    max_tokens: u32,
) -> Result<Value, SemanticError> {
    let mut content = vec![json!({ "type": "text", "text": prompt })];
    if let Some(bytes) = image {
        let mime = image_mime_type(bytes)?;
        let url = format!("data:{mime};base64,{}", BASE64.encode(bytes));
        content.push(json!({ "type": "image_url", "image_url": { "url": url } }));
    }
    Ok(json!({
        "model": model,
        "messages": [{ "role": "user", "content": content }],
        "max_tokens": max_tokens,
        "temperature": 0,
    }))
}

fn extract_reply(response: Value) -> Result<String, SemanticError> {
    response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or_else(|| SemanticError::Inference("chat response has no message content".into()))
}

/// Canned replies, picked by call shape.
#[derive(Debug, Clone, Default)]
pub struct StubVisionLanguage {
    replies: StubReplies,
}

impl StubVisionLanguage {
    pub fn new(replies: StubReplies) -> Self {
        Self { replies }
    }
}

#[async_trait]
impl VisionLanguage for StubVisionLanguage {
    async fn classify(&self, _prompt: &str, image: Option<&[u8]>) -> Result<String, SemanticError> {
        Ok(match image {
            Some(_) => self.replies.image_reply.clone(),
            None => self.replies.text_reply.clone(),
        })
    }

    async fn describe(&self, _prompt: &str, _image: &[u8]) -> Result<String, SemanticError> {
        Ok(self.replies.describe_reply.clone())
    }

    fn model_name(&self) -> &str {
        "stub-vlm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 10] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn text_only_payload_has_single_part() {
        let payload = build_chat_payload("m", "is it safe?", None, 32).unwrap();
        let content = payload.pointer("/messages/0/content").unwrap().as_array().unwrap();
        assert_eq!(content.len(), 1);
        assert_eq!(payload["model"], "m");
        assert_eq!(payload["max_tokens"], 32);
    }

    #[test]
    fn image_payload_uses_data_url() {
        let payload = build_chat_payload("m", "food?", Some(&PNG_MAGIC), 8).unwrap();
        let url = payload
            .pointer("/messages/0/content/1/image_url/url")
            .and_then(Value::as_str)
            .unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn image_payload_rejects_unknown_bytes() {
        let err = build_chat_payload("m", "food?", Some(b"nope"), 8).unwrap_err();
        assert!(matches!(err, SemanticError::InvalidImage(_)));
    }

    #[test]
    fn reply_is_trimmed() {
        let response = json!({"choices": [{"message": {"content": "  FOOD\n"}}]});
        assert_eq!(extract_reply(response).unwrap(), "FOOD");
        assert!(extract_reply(json!({"choices": []})).is_err());
    }

    #[tokio::test]
    async fn stub_picks_reply_by_shape() {
        let stub = StubVisionLanguage::default();
        assert_eq!(stub.classify("x", Some(&PNG_MAGIC)).await.unwrap(), "FOOD");
        assert_eq!(stub.classify("x", None).await.unwrap(), "compatible");
        assert_eq!(stub.describe("x", &PNG_MAGIC).await.unwrap(), "Keyword: apple");
    }
}
