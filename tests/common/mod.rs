#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use nutriscan::{
    ContextParts, DishRecord, EmbeddingVector, FixedNutrientModel, ImageEmbedder, InMemoryReferenceIndex,
    IngredientRecord, NutriConfig, PipelineContext, PipelineError, RecipeCatalog, ReferenceEmbeddingSet,
    ReferenceIndex, StubReplies, StubVisionLanguage, TextEmbedder, VisionLanguage,
};
use semantic::SemanticError;
use serde_json::json;

pub const IMAGE_DIM: usize = 4;
pub const TEXT_DIM: usize = 4;

/// Any non-empty bytes; the scripted embedder does not decode them.
pub const PHOTO: &[u8] = b"\x89PNG test photo";

/// Returns the same vector for every image.
pub struct FixedImageEmbedder(pub Vec<f32>);

#[async_trait]
impl ImageEmbedder for FixedImageEmbedder {
    async fn embed_image(&self, _bytes: &[u8]) -> Result<EmbeddingVector, SemanticError> {
        Ok(EmbeddingVector::image(self.0.clone()))
    }

    fn dimension(&self) -> usize {
        self.0.len()
    }

    fn model_name(&self) -> &str {
        "fixed-image"
    }
}

/// Looks texts up in a table, falling back to a fixed vector.
pub struct ScriptedTextEmbedder {
    pub table: HashMap<String, Vec<f32>>,
    pub fallback: Vec<f32>,
}

impl ScriptedTextEmbedder {
    pub fn new(entries: &[(&str, [f32; TEXT_DIM])]) -> Self {
        Self {
            table: entries.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect(),
            fallback: vec![0.0, 0.0, 0.0, 1.0],
        }
    }
}

#[async_trait]
impl TextEmbedder for ScriptedTextEmbedder {
    async fn embed_text(&self, text: &str) -> Result<EmbeddingVector, SemanticError> {
        let values = self.table.get(text).cloned().unwrap_or_else(|| self.fallback.clone());
        Ok(EmbeddingVector::text(values))
    }

    fn dimension(&self) -> usize {
        TEXT_DIM
    }

    fn model_name(&self) -> &str {
        "scripted-text"
    }
}

/// Sleeps before answering, to trip the configured timeouts.
pub struct SlowClassifier(pub Duration);

#[async_trait]
impl VisionLanguage for SlowClassifier {
    async fn classify(&self, _prompt: &str, _image: Option<&[u8]>) -> Result<String, SemanticError> {
        tokio::time::sleep(self.0).await;
        Ok("FOOD".into())
    }

    async fn describe(&self, _prompt: &str, _image: &[u8]) -> Result<String, SemanticError> {
        tokio::time::sleep(self.0).await;
        Ok("Keyword: apple".into())
    }

    fn model_name(&self) -> &str {
        "slow-vlm"
    }
}

/// Fails every call.
pub struct BrokenClassifier;

#[async_trait]
impl VisionLanguage for BrokenClassifier {
    async fn classify(&self, _prompt: &str, _image: Option<&[u8]>) -> Result<String, SemanticError> {
        Err(SemanticError::Http("503 Service Unavailable".into()))
    }

    async fn describe(&self, _prompt: &str, _image: &[u8]) -> Result<String, SemanticError> {
        Err(SemanticError::Http("503 Service Unavailable".into()))
    }

    fn model_name(&self) -> &str {
        "broken-vlm"
    }
}

/// Unit query `[1, 0, 0, 0]` and a reference at cosine `similarity` to it.
pub fn references_at(similarity: f32) -> Arc<ReferenceEmbeddingSet> {
    let row = vec![similarity, (1.0 - similarity * similarity).sqrt(), 0.0, 0.0];
    Arc::new(ReferenceEmbeddingSet::from_rows(vec![row]).unwrap())
}

pub fn query_image() -> FixedImageEmbedder {
    FixedImageEmbedder(vec![1.0, 0.0, 0.0, 0.0])
}

/// Banana at 105-130 kcal per 100g, eaten as 100-200g, plus pho with an
/// ingredient missing from the table.
pub fn catalog() -> RecipeCatalog {
    let dishes: Vec<DishRecord> = serde_json::from_value(json!([
        { "id": "banana", "ingredients": { "banana": [100, 200] } },
        {
            "id": "pho_bo",
            "display_name": "Phở bò",
            "aliases": ["beef pho"],
            "ingredients": { "rice_noodle": [150, 250], "beef": [80, 150], "mystery_sauce": [10, 20] }
        }
    ]))
    .unwrap();
    let ingredients: BTreeMap<String, IngredientRecord> = serde_json::from_value(json!({
        "banana": { "display_unit": "per 100g", "calories": [105, 130] },
        "rice_noodle": { "display_unit": "per 100g", "calories": [105, 130] },
        "beef": { "display_unit": "per 100g", "calories": [170, 250] }
    }))
    .unwrap();
    RecipeCatalog::from_parts(dishes, ingredients).unwrap()
}

/// Text vectors: `banana` and `pho bo` far apart, `something vague` at
/// cosine 0.15 to `banana`.
pub fn text_embedder() -> ScriptedTextEmbedder {
    ScriptedTextEmbedder::new(&[
        ("banana", [0.15, 0.988_686_5, 0.0, 0.0]),
        ("pho bo", [0.0, 0.0, 1.0, 0.0]),
        ("something vague", [1.0, 0.0, 0.0, 0.0]),
        ("apple", [0.0, 0.0, 0.0, 1.0]),
    ])
}

pub struct Fixture {
    pub config: NutriConfig,
    pub image_embedder: Arc<dyn ImageEmbedder>,
    pub text_embedder: Arc<dyn TextEmbedder>,
    pub classifier: Arc<dyn VisionLanguage>,
    pub references: Arc<ReferenceEmbeddingSet>,
    pub fallback_index: Option<Arc<dyn ReferenceIndex>>,
    pub catalog: RecipeCatalog,
}

impl Fixture {
    /// Max similarity 0.8, stub classifier, empty fallback index.
    pub fn new() -> Self {
        Self {
            config: NutriConfig::default(),
            image_embedder: Arc::new(query_image()),
            text_embedder: Arc::new(text_embedder()),
            classifier: Arc::new(StubVisionLanguage::new(StubReplies::default())),
            references: references_at(0.8),
            fallback_index: Some(Arc::new(InMemoryReferenceIndex::new(TEXT_DIM))),
            catalog: catalog(),
        }
    }

    pub fn similarity(mut self, similarity: f32) -> Self {
        self.references = references_at(similarity);
        self
    }

    pub fn replies(mut self, replies: StubReplies) -> Self {
        self.classifier = Arc::new(StubVisionLanguage::new(replies));
        self
    }

    pub fn classifier(mut self, classifier: impl VisionLanguage + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub async fn build(self) -> Result<PipelineContext, PipelineError> {
        let parts = ContextParts {
            image_embedder: self.image_embedder,
            text_embedder: self.text_embedder,
            classifier: self.classifier,
            regressor: Arc::new(FixedNutrientModel::new(IMAGE_DIM, [250.0, 320.0, 12.0, 40.0, 15.0])),
            references: self.references,
            foods: Vec::new(),
            fallback_index: self.fallback_index,
            catalog: self.catalog,
        };
        PipelineContext::from_parts(self.config, parts).await
    }
}
