use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use canonical::{canonical_key, normalize_text, CanonicalizeConfig};
use recipe::RecipeCatalog;
use semantic::{cosine_similarity, with_timeout, EmbeddingSpace, EmbeddingVector, TextEmbedder};
use serde::{Deserialize, Serialize};

use crate::error::MatchError;

pub const DEFAULT_DISH_THRESHOLD: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DishMatchConfig {
    /// Best cosine below this means no dish matched.
    pub threshold: f32,
    /// Return a dish directly when the normalized query equals its id,
    /// display name or an alias.
    pub exact_alias_match: bool,
    pub normalizer: CanonicalizeConfig,
}

impl Default for DishMatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DISH_THRESHOLD,
            exact_alias_match: true,
            normalizer: CanonicalizeConfig::default(),
        }
    }
}

impl DishMatchConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(-1.0..=1.0).contains(&self.threshold) {
            return Err(MatchError::InvalidConfig(format!(
                "dish threshold must be in [-1, 1], got {}",
                self.threshold
            )));
        }
        self.normalizer.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DishMatch {
    pub dish_id: String,
    pub score: f32,
    /// True when found by name equality rather than by embedding.
    pub exact: bool,
}

#[derive(Debug)]
struct DishKey {
    dish_id: String,
    vector: Vec<f32>,
}

/// Maps free-text dish descriptions to catalog dishes.
///
/// Catalog keys are normalized and embedded once in [`build`](Self::build);
/// a query costs one embedding call plus a linear cosine scan.
pub struct DishMatcher {
    keys: Vec<DishKey>,
    names: HashMap<String, usize>,
    embedder: Arc<dyn TextEmbedder>,
    cfg: DishMatchConfig,
    embed_timeout: Duration,
}

impl DishMatcher {
    pub async fn build(
        catalog: &RecipeCatalog,
        embedder: Arc<dyn TextEmbedder>,
        cfg: DishMatchConfig,
        embed_timeout: Duration,
    ) -> Result<Self, MatchError> {
        cfg.validate()?;

        let mut keys = Vec::with_capacity(catalog.dishes().len());
        let mut names = HashMap::new();

        for dish in catalog.dishes() {
            let key = canonical_key(dish.display_name(), &cfg.normalizer)?;
            let vector = embed_checked(embedder.as_ref(), &key, embed_timeout).await?;

            let pos = keys.len();
            for name in dish.names() {
                let normalized = normalize_text(name, &cfg.normalizer);
                if !normalized.is_empty() {
                    // Earlier dishes keep a shared alias.
                    names.entry(normalized).or_insert(pos);
                }
            }
            keys.push(DishKey {
                dish_id: dish.id.clone(),
                vector: vector.into_values(),
            });
        }

        tracing::info!(
            dishes = keys.len(),
            names = names.len(),
            model = embedder.model_name(),
            "dish matcher ready"
        );

        Ok(Self {
            keys,
            names,
            embedder,
            cfg,
            embed_timeout,
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Best catalog dish for `description`, or `None` when nothing clears
    /// the threshold.
    pub async fn match_dish(&self, description: &str) -> Result<Option<DishMatch>, MatchError> {
        let query = normalize_text(description, &self.cfg.normalizer);
        if query.is_empty() || self.keys.is_empty() {
            tracing::debug!(description, "no dish candidates");
            return Ok(None);
        }

        if self.cfg.exact_alias_match {
            if let Some(&pos) = self.names.get(&query) {
                let dish_id = self.keys[pos].dish_id.clone();
                tracing::debug!(%query, dish = %dish_id, "exact dish name match");
                return Ok(Some(DishMatch {
                    dish_id,
                    score: 1.0,
                    exact: true,
                }));
            }
        }

        let vector = embed_checked(self.embedder.as_ref(), &query, self.embed_timeout).await?;

        let mut best: Option<(usize, f32)> = None;
        for (pos, key) in self.keys.iter().enumerate() {
            let score = cosine_similarity(vector.as_slice(), &key.vector);
            // Strict comparison: the first dish in catalog order wins ties.
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((pos, score));
            }
        }

        let Some((pos, score)) = best else {
            return Ok(None);
        };
        let dish_id = &self.keys[pos].dish_id;
        if score < self.cfg.threshold {
            tracing::debug!(%query, best = %dish_id, score, threshold = self.cfg.threshold, "no dish matched");
            return Ok(None);
        }

        tracing::debug!(%query, dish = %dish_id, score, "dish matched");
        Ok(Some(DishMatch {
            dish_id: dish_id.clone(),
            score,
            exact: false,
        }))
    }
}

async fn embed_checked(
    embedder: &dyn TextEmbedder,
    text: &str,
    limit: Duration,
) -> Result<EmbeddingVector, MatchError> {
    let vector = with_timeout("embed_text", limit, embedder.embed_text(text)).await?;
    let dim = embedder.dimension();
    if !vector.has_shape(EmbeddingSpace::Text, dim) {
        return Err(MatchError::shape(
            (EmbeddingSpace::Text, dim),
            (vector.space(), vector.dim()),
        ));
    }
    Ok(vector)
}
