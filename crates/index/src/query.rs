use async_trait::async_trait;
use semantic::cosine_similarity;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::IndexError;
use crate::food::FoodReference;

/// Result entry for a nearest-neighbor query.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatch {
    /// Identifier of the matched index entry.
    pub id: String,
    /// Cosine similarity in `[-1, 1]`, higher is closer.
    pub score: f32,
    /// The reference the entry was built from.
    pub reference: Arc<FoodReference>,
}

/// Query contract for the fallback lookup.
///
/// Implementations return at most `top_k` matches ordered by descending
/// score, ties in insertion order, and reject vectors whose length differs
/// from [`dimension`](Self::dimension).
#[async_trait]
pub trait ReferenceIndex: Send + Sync {
    async fn query_nearest(&self, vector: &[f32], top_k: usize) -> Result<Vec<SimilarityMatch>, IndexError>;

    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct IndexEntry {
    id: String,
    vector: Vec<f32>,
    reference: Arc<FoodReference>,
}

/// Exhaustive in-memory implementation of [`ReferenceIndex`].
///
/// Built once at startup with [`insert`](Self::insert) and then frozen behind
/// an `Arc`.
#[derive(Debug, Clone)]
pub struct InMemoryReferenceIndex {
    dim: usize,
    entries: Vec<IndexEntry>,
}

impl InMemoryReferenceIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            entries: Vec::new(),
        }
    }

    pub fn insert(
        &mut self,
        id: impl Into<String>,
        vector: Vec<f32>,
        reference: Arc<FoodReference>,
    ) -> Result<(), IndexError> {
        if vector.len() != self.dim {
            return Err(IndexError::ShapeMismatch {
                expected: self.dim,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(IndexError::InvalidData("index vectors must be finite".into()));
        }
        self.entries.push(IndexEntry {
            id: id.into(),
            vector,
            reference,
        });
        Ok(())
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SimilarityMatch>, IndexError> {
        if query.len() != self.dim {
            return Err(IndexError::ShapeMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        if top_k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, cosine_similarity(&entry.vector, query)))
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(pos, score)| {
                let entry = &self.entries[pos];
                SimilarityMatch {
                    id: entry.id.clone(),
                    score,
                    reference: Arc::clone(&entry.reference),
                }
            })
            .collect())
    }
}

#[async_trait]
impl ReferenceIndex for InMemoryReferenceIndex {
    async fn query_nearest(&self, vector: &[f32], top_k: usize) -> Result<Vec<SimilarityMatch>, IndexError> {
        self.search(vector, top_k)
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
