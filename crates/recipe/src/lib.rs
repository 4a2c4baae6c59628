//! Dish catalog and calorie interval synthesis.
//!
//! A dish is a set of ingredients with quantity ranges; each ingredient has a
//! calorie range per unit. [`synthesize`] composes them into a raw
//! `(min_total, max_total)` bound and narrows it symmetrically by a ratio,
//! giving a [`CalorieInterval`] that is tighter than the worst case but never
//! leaves it.
//!
//! ```
//! use recipe::{synthesize, RecipeCatalog, SynthesisConfig};
//!
//! let dishes = serde_json::from_str(r#"[
//!     {"id": "banana", "ingredients": {"banana": [100, 200]}}
//! ]"#).unwrap();
//! let ingredients = serde_json::from_str(r#"{
//!     "banana": {"unit": "per 100g", "calories": [105, 130]}
//! }"#).unwrap();
//!
//! let catalog = RecipeCatalog::from_parts(dishes, ingredients).unwrap();
//! let dish = catalog.dish("banana").unwrap();
//! let interval = synthesize(dish, &catalog, &SynthesisConfig::default()).unwrap();
//! assert_eq!(interval.as_pair(), (143.75, 221.25));
//! ```

mod catalog;
mod error;
mod record;
mod synth;

pub use catalog::RecipeCatalog;
pub use error::RecipeError;
pub use record::{DishRecord, IngredientRecord, Range};
pub use synth::{synthesize, CalorieInterval, SynthesisConfig, UnknownIngredientPolicy};
