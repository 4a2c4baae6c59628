use std::sync::Arc;

use index::{ReferenceIndex, SimilarityMatch};
use semantic::{EmbeddingSpace, EmbeddingVector};
use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// The fallback only ever wants the single nearest reference.
pub const FALLBACK_TOP_K: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// When set, a best match scoring below this counts as no match.
    /// Unset accepts whatever the index returns.
    pub min_score: Option<f32>,
}

impl FallbackConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        match self.min_score {
            Some(score) if !(-1.0..=1.0).contains(&score) => Err(MatchError::InvalidConfig(format!(
                "fallback min_score must be in [-1, 1], got {score}"
            ))),
            _ => Ok(()),
        }
    }
}

/// Nearest-neighbor lookup for images the gate rejected.
pub struct FallbackMatcher {
    index: Arc<dyn ReferenceIndex>,
    space: EmbeddingSpace,
    min_score: Option<f32>,
}

impl FallbackMatcher {
    /// `space` is the embedding space the index entries were built in.
    pub fn new(
        index: Arc<dyn ReferenceIndex>,
        space: EmbeddingSpace,
        cfg: &FallbackConfig,
    ) -> Result<Self, MatchError> {
        cfg.validate()?;
        tracing::info!(
            entries = index.len(),
            dim = index.dimension(),
            %space,
            min_score = ?cfg.min_score,
            "fallback matcher ready"
        );
        Ok(Self {
            index,
            space,
            min_score: cfg.min_score,
        })
    }

    pub fn space(&self) -> EmbeddingSpace {
        self.space
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Number of index entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub async fn lookup(&self, vector: &EmbeddingVector) -> Result<SimilarityMatch, MatchError> {
        let dim = self.index.dimension();
        if !vector.has_shape(self.space, dim) {
            return Err(MatchError::shape((self.space, dim), (vector.space(), vector.dim())));
        }

        let best = self
            .index
            .query_nearest(vector.as_slice(), FALLBACK_TOP_K)
            .await?
            .into_iter()
            .next()
            .ok_or(MatchError::NoMatchFound)?;

        if let Some(min) = self.min_score {
            if best.score < min {
                tracing::debug!(id = %best.id, score = best.score, min_score = min, "fallback match below min_score");
                return Err(MatchError::NoMatchFound);
            }
        }

        tracing::debug!(id = %best.id, score = best.score, food = %best.reference.food_name, "fallback match");
        Ok(best)
    }
}

/// Pulls the food keyword out of a vision-language reply.
///
/// A line labelled `Keyword:` or `Từ khóa:` (any case or accents) wins;
/// otherwise the last non-empty line is taken. Surrounding quotes, markdown
/// emphasis and a trailing full stop are stripped.
pub fn extract_keyword(reply: &str) -> Option<String> {
    let lines: Vec<&str> = reply.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let labelled = lines.iter().find_map(|line| {
        let (label, rest) = line.split_once(':')?;
        let label = canonical::normalize(label.trim_matches(|c: char| c == '*' || c == '-' || c.is_whitespace()));
        matches!(label.as_str(), "keyword" | "tu khoa").then_some(rest)
    });

    let raw = labelled.or_else(|| lines.last().copied())?;
    let keyword = raw
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '*' | '`' | '“' | '”' | '.'));

    (!keyword.is_empty()).then(|| keyword.to_string())
}
