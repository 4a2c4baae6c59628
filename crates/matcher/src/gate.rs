use std::sync::Arc;

use index::ReferenceEmbeddingSet;
use semantic::{EmbeddingSpace, EmbeddingVector};
use serde::{Deserialize, Serialize};

use crate::error::MatchError;

pub const DEFAULT_GATE_THRESHOLD: f32 = 0.65;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Minimum best-match cosine for an image to count as in-domain.
    pub threshold: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_GATE_THRESHOLD,
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(-1.0..=1.0).contains(&self.threshold) {
            return Err(MatchError::InvalidConfig(format!(
                "gate threshold must be in [-1, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GateDecision {
    pub in_domain: bool,
    pub max_similarity: f32,
}

/// Decides whether an image lies inside the regressor's training
/// distribution by its best cosine against the reference set.
#[derive(Debug, Clone)]
pub struct DomainGate {
    references: Arc<ReferenceEmbeddingSet>,
    threshold: f32,
}

impl DomainGate {
    pub fn new(references: Arc<ReferenceEmbeddingSet>, cfg: &GateConfig) -> Result<Self, MatchError> {
        cfg.validate()?;
        if references.is_empty() {
            return Err(MatchError::EmptyReferenceSet);
        }
        tracing::info!(
            references = references.len(),
            dim = references.dim(),
            threshold = cfg.threshold,
            "domain gate ready"
        );
        Ok(Self {
            references,
            threshold: cfg.threshold,
        })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn dimension(&self) -> usize {
        self.references.dim()
    }

    pub fn evaluate(&self, vector: &EmbeddingVector) -> Result<GateDecision, MatchError> {
        let dim = self.references.dim();
        if !vector.has_shape(EmbeddingSpace::Image, dim) {
            return Err(MatchError::shape(
                (EmbeddingSpace::Image, dim),
                (vector.space(), vector.dim()),
            ));
        }

        let max_similarity = self
            .references
            .max_similarity(vector.as_slice())?
            .ok_or(MatchError::EmptyReferenceSet)?;
        let in_domain = max_similarity >= self.threshold;

        tracing::debug!(max_similarity, threshold = self.threshold, in_domain, "domain gate");
        Ok(GateDecision {
            in_domain,
            max_similarity,
        })
    }
}
