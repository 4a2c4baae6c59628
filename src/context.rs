use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use index::{
    load_food_references, FoodReference, InMemoryReferenceIndex, ReferenceEmbeddingSet, ReferenceFormat,
    ReferenceIndex,
};
use matcher::{DishMatcher, DomainGate, FallbackMatcher};
use recipe::RecipeCatalog;
use regressor::{FixedNutrientModel, MlpRegressor, NutrientModel};
use semantic::{
    build_classifier, build_image_embedder, build_text_embedder, with_timeout, EmbeddingSpace, ImageEmbedder,
    TextEmbedder, VisionLanguage,
};

use crate::config::{FallbackQuery, NutriConfig, RegressorBackend, RegressorConfig};
use crate::error::PipelineError;

/// Everything a request needs, loaded once and then only read.
///
/// Share it as `Arc<PipelineContext>`; there is no interior mutability.
pub struct PipelineContext {
    config: NutriConfig,
    image_embedder: Arc<dyn ImageEmbedder>,
    text_embedder: Arc<dyn TextEmbedder>,
    classifier: Arc<dyn VisionLanguage>,
    regressor: Arc<dyn NutrientModel>,
    gate: DomainGate,
    fallback: FallbackMatcher,
    catalog: Arc<RecipeCatalog>,
    dishes: DishMatcher,
}

/// Pre-built collaborators for [`PipelineContext::from_parts`].
pub struct ContextParts {
    pub image_embedder: Arc<dyn ImageEmbedder>,
    pub text_embedder: Arc<dyn TextEmbedder>,
    pub classifier: Arc<dyn VisionLanguage>,
    pub regressor: Arc<dyn NutrientModel>,
    pub references: Arc<ReferenceEmbeddingSet>,
    /// Used to build the fallback index when `fallback_index` is `None`.
    pub foods: Vec<FoodReference>,
    pub fallback_index: Option<Arc<dyn ReferenceIndex>>,
    pub catalog: RecipeCatalog,
}

impl PipelineContext {
    /// Builds backends and loads every table named in `config.data`.
    pub async fn load(config: NutriConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let image_embedder = build_image_embedder(&config.embedders.image)?;
        let text_embedder = build_text_embedder(&config.embedders.text)?;
        let classifier = build_classifier(&config.classifier)?;
        let regressor = build_regressor(&config.regressor, image_embedder.dimension())?;

        let references = match &config.data.reference_embeddings {
            Some(path) => {
                let format = config
                    .data
                    .reference_format()
                    .unwrap_or_else(|| ReferenceFormat::from_path(path));
                ReferenceEmbeddingSet::load(path, format, Some(image_embedder.dimension()))?
            }
            None => {
                return Err(PipelineError::ModelNotLoaded(
                    "data.reference_embeddings is not set".to_string(),
                ))
            }
        };

        let foods = match &config.data.food_references {
            Some(path) => load_food_references(path)?,
            None => {
                tracing::warn!("data.food_references is not set; fallback lookups will find nothing");
                Vec::new()
            }
        };

        let catalog = load_catalog(config.data.dishes.as_deref(), config.data.ingredients.as_deref())?;

        let parts = ContextParts {
            image_embedder,
            text_embedder,
            classifier,
            regressor,
            references: Arc::new(references),
            foods,
            fallback_index: None,
            catalog,
        };
        Self::from_parts(config, parts).await
    }

    /// Wires already-built collaborators together and checks that their
    /// shapes agree.
    pub async fn from_parts(config: NutriConfig, parts: ContextParts) -> Result<Self, PipelineError> {
        config.validate()?;

        let image_dim = parts.image_embedder.dimension();
        expect_dim("reference embeddings", image_dim, parts.references.dim())?;
        expect_dim("regressor input", image_dim, parts.regressor.input_dim())?;

        let gate = DomainGate::new(parts.references, &config.gate)?;

        let (space, expected_dim) = match config.fallback.query {
            FallbackQuery::Describe => (EmbeddingSpace::Text, parts.text_embedder.dimension()),
            FallbackQuery::ImageEmbedding => (EmbeddingSpace::Image, image_dim),
        };
        let index: Arc<dyn ReferenceIndex> = match parts.fallback_index {
            Some(index) => index,
            None => Arc::new(
                build_fallback_index(
                    parts.foods,
                    space,
                    expected_dim,
                    parts.text_embedder.as_ref(),
                    config.timeouts.embed(),
                )
                .await?,
            ),
        };
        expect_dim("fallback index", expected_dim, index.dimension())?;
        let fallback = FallbackMatcher::new(index, space, &config.fallback.matcher())?;

        let dishes = DishMatcher::build(
            &parts.catalog,
            Arc::clone(&parts.text_embedder),
            config.dish.clone(),
            config.timeouts.embed(),
        )
        .await?;

        tracing::info!(
            image_model = parts.image_embedder.model_name(),
            text_model = parts.text_embedder.model_name(),
            classifier = parts.classifier.model_name(),
            regressor = parts.regressor.name(),
            dishes = parts.catalog.dishes().len(),
            "pipeline context ready"
        );

        Ok(Self {
            config,
            image_embedder: parts.image_embedder,
            text_embedder: parts.text_embedder,
            classifier: parts.classifier,
            regressor: parts.regressor,
            gate,
            fallback,
            catalog: Arc::new(parts.catalog),
            dishes,
        })
    }

    pub fn config(&self) -> &NutriConfig {
        &self.config
    }

    pub fn image_embedder(&self) -> &dyn ImageEmbedder {
        self.image_embedder.as_ref()
    }

    pub fn text_embedder(&self) -> &dyn TextEmbedder {
        self.text_embedder.as_ref()
    }

    pub fn classifier(&self) -> &dyn VisionLanguage {
        self.classifier.as_ref()
    }

    pub fn regressor(&self) -> &dyn NutrientModel {
        self.regressor.as_ref()
    }

    pub fn gate(&self) -> &DomainGate {
        &self.gate
    }

    pub fn fallback(&self) -> &FallbackMatcher {
        &self.fallback
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn dishes(&self) -> &DishMatcher {
        &self.dishes
    }
}

fn build_regressor(cfg: &RegressorConfig, input_dim: usize) -> Result<Arc<dyn NutrientModel>, PipelineError> {
    let model: Arc<dyn NutrientModel> = match cfg.backend {
        RegressorBackend::Mlp => {
            let path = cfg.weights_path.as_deref().ok_or_else(|| {
                PipelineError::ModelNotLoaded("regressor.weights_path is not set".to_string())
            })?;
            Arc::new(MlpRegressor::load_json(path)?)
        }
        RegressorBackend::Fixed => {
            tracing::warn!("using fixed regressor outputs");
            Arc::new(FixedNutrientModel::new(input_dim, cfg.fixed_outputs))
        }
    };
    Ok(model)
}

fn load_catalog(dishes: Option<&Path>, ingredients: Option<&Path>) -> Result<RecipeCatalog, PipelineError> {
    match (dishes, ingredients) {
        (Some(d), Some(i)) => Ok(RecipeCatalog::load(d, i)?),
        (None, None) => {
            tracing::warn!("no dish catalog configured; dish lookups will match nothing");
            Ok(RecipeCatalog::default())
        }
        _ => Err(PipelineError::Config(
            "data.dishes and data.ingredients must be set together".to_string(),
        )),
    }
}

/// One entry per food in `space`. Text-space entries without a precomputed
/// vector get one embedded entry per tag, id `"{id}:{tag}"`. A precomputed
/// vector of the wrong width is a `ShapeMismatch`.
async fn build_fallback_index(
    foods: Vec<FoodReference>,
    space: EmbeddingSpace,
    dim: usize,
    text_embedder: &dyn TextEmbedder,
    embed_timeout: Duration,
) -> Result<InMemoryReferenceIndex, PipelineError> {
    let mut index = InMemoryReferenceIndex::new(dim);
    let mut skipped = 0usize;

    for food in foods {
        let food = Arc::new(food);
        if let Some(vector) = food.embedding.as_ref() {
            expect_dim(&format!("embedding of food {}", food.id), dim, vector.len())?;
            index.insert(food.id.clone(), vector.clone(), Arc::clone(&food))?;
            continue;
        }
        match space {
            EmbeddingSpace::Text => {
                for key in food.embedding_keys() {
                    let vector = with_timeout("embed_text", embed_timeout, text_embedder.embed_text(key)).await?;
                    index.insert(format!("{}:{}", food.id, key), vector.into_values(), Arc::clone(&food))?;
                }
            }
            EmbeddingSpace::Image => {
                tracing::warn!(id = %food.id, "food reference has no image embedding; skipped");
                skipped += 1;
            }
        }
    }

    tracing::info!(entries = index.len(), skipped, %space, "fallback index built");
    Ok(index)
}

fn expect_dim(what: &str, expected: usize, actual: usize) -> Result<(), PipelineError> {
    if expected != actual {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{what} of {expected} dimensions"),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::NutrientFacts;
    use semantic::{StubImageEmbedder, StubTextEmbedder, StubVisionLanguage};

    fn food(id: &str, tags: &[&str]) -> FoodReference {
        FoodReference {
            id: id.into(),
            food_name: id.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            facts: NutrientFacts {
                calories: 52.0,
                fat: 0.17,
                carb: 13.8,
                protein: 0.26,
                mass: None,
            },
            embedding: None,
        }
    }

    fn parts(image_dim: usize, regressor_dim: usize) -> ContextParts {
        ContextParts {
            image_embedder: Arc::new(StubImageEmbedder::new(image_dim)),
            text_embedder: Arc::new(StubTextEmbedder::new(16)),
            classifier: Arc::new(StubVisionLanguage::default()),
            regressor: Arc::new(FixedNutrientModel::new(regressor_dim, [1.0; 5])),
            references: Arc::new(ReferenceEmbeddingSet::from_rows(vec![vec![1.0; 8]]).unwrap()),
            foods: vec![food("1", &["Apple", "fresh apple"]), food("9", &[])],
            fallback_index: None,
            catalog: RecipeCatalog::default(),
        }
    }

    #[tokio::test]
    async fn text_fallback_index_has_one_entry_per_tag() {
        let ctx = PipelineContext::from_parts(NutriConfig::default(), parts(8, 8)).await.unwrap();
        assert_eq!(ctx.fallback().space(), EmbeddingSpace::Text);
        assert_eq!(ctx.fallback().dimension(), 16);
        // "Apple" and "fresh apple", plus the name of the untagged food.
        assert_eq!(ctx.fallback().len(), 3);
        assert!(ctx.dishes().is_empty());
    }

    #[tokio::test]
    async fn wrong_width_precomputed_embedding_is_rejected() {
        let mut p = parts(8, 8);
        p.foods[0].embedding = Some(vec![0.5; 8]);
        let err = PipelineContext::from_parts(NutriConfig::default(), p).await.err().unwrap();
        assert_eq!(err.code(), "SHAPE_MISMATCH");
        assert!(err.to_string().contains("embedding of food 1"));

        let mut p = parts(8, 8);
        p.foods[0].embedding = Some(vec![0.5; 16]);
        let ctx = PipelineContext::from_parts(NutriConfig::default(), p).await.unwrap();
        assert_eq!(ctx.fallback().len(), 2);
    }

    #[tokio::test]
    async fn regressor_width_must_match_image_embedder() {
        let err = PipelineContext::from_parts(NutriConfig::default(), parts(8, 1280))
            .await
            .err()
            .unwrap();
        assert_eq!(err.code(), "SHAPE_MISMATCH");
    }

    #[tokio::test]
    async fn image_fallback_skips_entries_without_vectors() {
        let mut config = NutriConfig::default();
        config.fallback.query = FallbackQuery::ImageEmbedding;
        let mut p = parts(8, 8);
        p.foods[0].embedding = Some(vec![0.5; 8]);
        let ctx = PipelineContext::from_parts(config, p).await.unwrap();
        assert_eq!(ctx.fallback().space(), EmbeddingSpace::Image);
        assert_eq!(ctx.fallback().dimension(), 8);
        assert_eq!(ctx.fallback().len(), 1);
    }

    #[tokio::test]
    async fn missing_reference_embeddings_is_model_not_loaded() {
        let err = PipelineContext::load(NutriConfig::default()).await.err().unwrap();
        assert!(matches!(err, PipelineError::ModelNotLoaded(_)));
    }

    #[test]
    fn half_configured_catalog_is_rejected() {
        let err = load_catalog(Some(Path::new("dishes.json")), None).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
