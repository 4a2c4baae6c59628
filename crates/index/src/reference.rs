//! Reference embedding set: the image vectors that represent the regressor's
//! training distribution.
//!
//! Loaded once at startup from one of three on-disk layouts and never
//! mutated afterwards:
//!
//! - JSON array of arrays
//! - raw little-endian `f32`, row-major, with the dimension given by config
//! - NumPy `.npy` (`f32` or `f64`, 1-D or 2-D)

use ndarray::{Array1, Array2, ArrayD, ArrayView1};
use ndarray_npy::{ReadNpyError, ReadNpyExt};
use semantic::cosine_similarity;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::IndexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceFormat {
    Json,
    RawF32,
    Npy,
}

impl ReferenceFormat {
    /// `.json` and `.npy` are recognized; anything else is raw `f32`.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReferenceFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("npy") => ReferenceFormat::Npy,
            _ => ReferenceFormat::RawF32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceEmbeddingSet {
    matrix: Array2<f32>,
}

impl ReferenceEmbeddingSet {
    /// Builds a set from rows that must all share one length and be finite.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let dim = rows.first().map_or(0, Vec::len);
        if let Some(bad) = rows.iter().position(|row| row.len() != dim) {
            return Err(IndexError::InvalidData(format!(
                "row {bad} has {} values, expected {dim}",
                rows[bad].len()
            )));
        }
        let count = rows.len();
        Self::from_flat(count, dim, rows.into_iter().flatten().collect())
    }

    /// An empty set with a known dimension.
    pub fn empty(dim: usize) -> Self {
        Self {
            matrix: Array2::zeros((0, dim)),
        }
    }

    pub fn load(path: &Path, format: ReferenceFormat, dim: Option<usize>) -> Result<Self, IndexError> {
        let set = match format {
            ReferenceFormat::Json => {
                let bytes = std::fs::read(path).map_err(|e| IndexError::io(path, e))?;
                let rows: Vec<Vec<f32>> = serde_json::from_slice(&bytes)
                    .map_err(|e| IndexError::InvalidData(format!("{}: {e}", path.display())))?;
                Self::from_rows(rows)?
            }
            ReferenceFormat::RawF32 => {
                let dim = dim.ok_or_else(|| {
                    IndexError::InvalidData("raw f32 reference files need an explicit dimension".into())
                })?;
                let bytes = std::fs::read(path).map_err(|e| IndexError::io(path, e))?;
                Self::from_le_bytes(&bytes, dim)?
            }
            ReferenceFormat::Npy => {
                let bytes = std::fs::read(path).map_err(|e| IndexError::io(path, e))?;
                Self::from_npy(&bytes)?
            }
        };

        if let Some(expected) = dim {
            if !set.is_empty() && set.dim() != expected {
                return Err(IndexError::ShapeMismatch {
                    expected,
                    actual: set.dim(),
                });
            }
        }
        tracing::info!(
            path = %path.display(),
            rows = set.len(),
            dim = set.dim(),
            "reference embeddings loaded"
        );
        Ok(set)
    }

    /// Row-major little-endian `f32` values.
    pub fn from_le_bytes(bytes: &[u8], dim: usize) -> Result<Self, IndexError> {
        if dim == 0 {
            return Err(IndexError::InvalidData("dimension must be > 0".into()));
        }
        let row_bytes = dim
            .checked_mul(4)
            .ok_or_else(|| IndexError::InvalidData(format!("dimension {dim} is too large")))?;
        if bytes.len() % row_bytes != 0 {
            return Err(IndexError::InvalidData(format!(
                "{} bytes is not a whole number of {dim}-dim f32 rows",
                bytes.len()
            )));
        }
        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_flat(bytes.len() / row_bytes, dim, values)
    }

    /// A 1-D (one row) or 2-D `.npy` array of `f32` or `f64`.
    pub fn from_npy(bytes: &[u8]) -> Result<Self, IndexError> {
        let array = match ArrayD::<f32>::read_npy(bytes) {
            Ok(array) => array,
            Err(ReadNpyError::WrongDescriptor(_)) => ArrayD::<f64>::read_npy(bytes)
                .map_err(npy_error)?
                .mapv(|v| v as f32),
            Err(err) => return Err(npy_error(err)),
        };
        let (rows, dim) = match *array.shape() {
            [d] => (1, d),
            [n, d] => (n, d),
            ref other => {
                return Err(IndexError::InvalidData(format!(
                    "expected a 1-D or 2-D array, got shape {other:?}"
                )))
            }
        };
        Self::from_flat(rows, dim, array.iter().copied().collect())
    }

    fn from_flat(rows: usize, dim: usize, values: Vec<f32>) -> Result<Self, IndexError> {
        let expected = rows
            .checked_mul(dim)
            .ok_or_else(|| IndexError::InvalidData(format!("{rows} x {dim} overflows")))?;
        if values.len() != expected {
            return Err(IndexError::InvalidData(format!(
                "expected {rows} rows of {dim} values, found {} values",
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(IndexError::InvalidData("reference vectors must be finite".into()));
        }
        let matrix = Array2::from_shape_vec((rows, dim), values)
            .map_err(|e| IndexError::InvalidData(e.to_string()))?;
        Ok(Self { matrix })
    }

    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }

    pub fn dim(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn row(&self, idx: usize) -> Option<ArrayView1<'_, f32>> {
        (idx < self.len()).then(|| self.matrix.row(idx))
    }

    /// Cosine similarity of `query` against every reference, in insertion order.
    pub fn cosine_scores(&self, query: &[f32]) -> Result<Array1<f32>, IndexError> {
        if query.len() != self.dim() {
            return Err(IndexError::ShapeMismatch {
                expected: self.dim(),
                actual: query.len(),
            });
        }
        Ok(self
            .matrix
            .rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => cosine_similarity(slice, query),
                None => cosine_similarity(&row.to_vec(), query),
            })
            .collect())
    }

    /// Highest cosine similarity, or `None` for an empty set.
    pub fn max_similarity(&self, query: &[f32]) -> Result<Option<f32>, IndexError> {
        let scores = self.cosine_scores(query)?;
        Ok(scores.iter().copied().reduce(f32::max))
    }
}

fn npy_error(err: ReadNpyError) -> IndexError {
    IndexError::InvalidData(format!("npy: {err}"))
}
