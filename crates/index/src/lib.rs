//! # NutriScan Index
//!
//! Read-only similarity structures the estimation pipeline consults:
//!
//! - [`ReferenceEmbeddingSet`]: the image vectors describing the regressor's
//!   training distribution. The domain gate scores new images against it.
//! - [`ReferenceIndex`]: the nearest-neighbor contract behind the fallback
//!   lookup, with [`InMemoryReferenceIndex`] as the bundled implementation.
//! - [`FoodReference`] / [`NutrientFacts`]: the curated table that backs the
//!   index entries.
//!
//! Everything here is loaded once and then shared through `Arc`; nothing
//! mutates after startup.
//!
//! ## Example Usage
//!
//! ```
//! use index::{FoodReference, InMemoryReferenceIndex, NutrientFacts, ReferenceIndex};
//! use std::sync::Arc;
//!
//! let apple = Arc::new(FoodReference {
//!     id: "1".into(),
//!     food_name: "apple".into(),
//!     tags: vec!["fresh apple".into()],
//!     facts: NutrientFacts { calories: 52.0, fat: 0.17, carb: 13.8, protein: 0.26, mass: None },
//!     embedding: None,
//! });
//!
//! let mut index = InMemoryReferenceIndex::new(3);
//! index.insert("1:fresh apple", vec![1.0, 0.0, 0.0], apple).unwrap();
//! assert_eq!(index.len(), 1);
//! ```

mod error;
mod food;
mod query;
mod reference;

pub use error::IndexError;
pub use food::{load_food_references, parse_quantity, FoodReference, NutrientFacts};
pub use query::{InMemoryReferenceIndex, ReferenceIndex, SimilarityMatch};
pub use reference::{ReferenceEmbeddingSet, ReferenceFormat};
