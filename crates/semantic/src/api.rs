use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::{resolve_auth_header, EmbedderConfig};
use crate::embedder::{ImageEmbedder, TextEmbedder};
use crate::error::SemanticError;
use crate::normalize::l2_normalize_in_place;
use crate::types::{EmbeddingSpace, EmbeddingVector};

/// Pooled client shared by one embedder or classifier instance.
pub(crate) fn build_http_client() -> Result<reqwest::Client, SemanticError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(32)
        .build()
        .map_err(|e| SemanticError::InvalidConfig(format!("failed to build HTTP client: {e}")))
}

/// Feature-extraction embedder for text (Hugging Face inference style).
///
/// Sends `{"inputs": text}` and accepts either a flat vector or token-level
/// vectors, which are mean-pooled.
#[derive(Debug, Clone)]
pub struct ApiTextEmbedder {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    model_name: String,
    dim: usize,
    normalize: bool,
}

impl ApiTextEmbedder {
    pub fn new(cfg: &EmbedderConfig) -> Result<Self, SemanticError> {
        cfg.validate()?;
        let url = cfg
            .api_url
            .clone()
            .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;
        Ok(Self {
            client: build_http_client()?,
            url,
            auth_header: resolve_auth_header(cfg.api_auth_header.as_deref(), cfg.api_token_env.as_deref()),
            model_name: cfg.model_name_for(EmbeddingSpace::Text),
            dim: cfg.dimension_for(EmbeddingSpace::Text),
            normalize: cfg.normalize,
        })
    }
}

#[async_trait]
impl TextEmbedder for ApiTextEmbedder {
    async fn embed_text(&self, text: &str) -> Result<EmbeddingVector, SemanticError> {
        let mut request = self.client.post(&self.url).json(&json!({ "inputs": text }));
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }
        let response = send(request).await?;
        let vector = finish_vector(response, self.dim, self.normalize)?;
        Ok(EmbeddingVector::text(vector))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Feature-extraction embedder for images; posts the raw bytes.
#[derive(Debug, Clone)]
pub struct ApiImageEmbedder {
    client: reqwest::Client,
    url: String,
    auth_header: Option<String>,
    model_name: String,
    dim: usize,
    normalize: bool,
}

impl ApiImageEmbedder {
    pub fn new(cfg: &EmbedderConfig) -> Result<Self, SemanticError> {
        cfg.validate()?;
        let url = cfg
            .api_url
            .clone()
            .ok_or_else(|| SemanticError::InvalidConfig("api_url is required for api mode".into()))?;
        Ok(Self {
            client: build_http_client()?,
            url,
            auth_header: resolve_auth_header(cfg.api_auth_header.as_deref(), cfg.api_token_env.as_deref()),
            model_name: cfg.model_name_for(EmbeddingSpace::Image),
            dim: cfg.dimension_for(EmbeddingSpace::Image),
            normalize: cfg.normalize,
        })
    }
}

#[async_trait]
impl ImageEmbedder for ApiImageEmbedder {
    async fn embed_image(&self, bytes: &[u8]) -> Result<EmbeddingVector, SemanticError> {
        let mime = image_mime_type(bytes)?;
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", mime)
            .body(bytes.to_vec());
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }
        let response = send(request).await?;
        let vector = finish_vector(response, self.dim, self.normalize)?;
        Ok(EmbeddingVector::image(vector))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// Sniffs the container format without decoding pixels.
pub(crate) fn image_mime_type(bytes: &[u8]) -> Result<&'static str, SemanticError> {
    if bytes.is_empty() {
        return Err(SemanticError::InvalidImage("empty payload".into()));
    }
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .map_err(|e| SemanticError::InvalidImage(e.to_string()))
}

pub(crate) async fn send(request: reqwest::RequestBuilder) -> Result<Value, SemanticError> {
    let response = request
        .send()
        .await
        .map_err(|e| SemanticError::Http(format!("HTTP request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SemanticError::Http(format!("HTTP error {status}: {body}")));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| SemanticError::Inference(format!("Invalid JSON response: {e}")))
}

fn finish_vector(response: Value, dim: usize, normalize: bool) -> Result<Vec<f32>, SemanticError> {
    let vectors = parse_embeddings_from_value(response)?;
    let mut vector = mean_pool(vectors)?;
    if vector.len() != dim {
        return Err(SemanticError::Inference(format!(
            "expected {dim}-dim embedding, service returned {}",
            vector.len()
        )));
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(SemanticError::Inference("embedding contains non-finite values".into()));
    }
    if normalize {
        l2_normalize_in_place(&mut vector);
    }
    Ok(vector)
}

fn mean_pool(mut vectors: Vec<Vec<f32>>) -> Result<Vec<f32>, SemanticError> {
    match vectors.len() {
        0 => Err(SemanticError::Inference(
            "API response did not contain embeddings".into(),
        )),
        1 => Ok(vectors.pop().unwrap_or_default()),
        n => {
            let width = vectors[0].len();
            if vectors.iter().any(|v| v.len() != width) {
                return Err(SemanticError::Inference("ragged token embeddings".into()));
            }
            let mut pooled = vec![0f32; width];
            for v in &vectors {
                for (acc, x) in pooled.iter_mut().zip(v) {
                    *acc += x;
                }
            }
            let scale = (n as f32).recip();
            pooled.iter_mut().for_each(|x| *x *= scale);
            Ok(pooled)
        }
    }
}

fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                let mut vectors = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(mut obj) => match obj.remove("embedding") {
                            Some(embedding) => vectors.push(parse_embedding_vector(embedding)?),
                            None => {
                                return Err(SemanticError::Inference(
                                    "missing `embedding` field in data item".into(),
                                ))
                            }
                        },
                        _ => {
                            return Err(SemanticError::Inference(
                                "unexpected entry inside `data` array".into(),
                            ))
                        }
                    }
                }
                return Ok(vectors);
            }

            if let Some(error) = map.remove("error") {
                return Err(SemanticError::Inference(format!("service error: {error}")));
            }

            Err(SemanticError::Inference(
                "unsupported API response shape".into(),
            ))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, SemanticError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.len() == 1 && matches!(items[0], Value::Array(ref inner) if inner.iter().all(|v| v.is_array())) {
                // [[[...], [...]]]: one input, token-level rows.
                items.into_iter().next().map_or(Ok(Vec::new()), parse_embedding_collection)
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, SemanticError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SemanticError::Inference("non-finite embedding value".into())),
                other => Err(SemanticError::Inference(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(SemanticError::Inference(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
