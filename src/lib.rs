//! NutriScan: nutrition estimates from food photos and dish descriptions.
//!
//! Two entrypoints share one immutable [`PipelineContext`]:
//!
//! - [`estimate_from_image`]: photo → (food pre-check) → image embedding →
//!   domain gate → regressor, or nearest-reference lookup for images the
//!   regressor was not trained on.
//! - [`estimate_dish_calories`]: description → normalized text → dish match →
//!   calorie interval from the dish's ingredients → allergy check.
//!
//! ```no_run
//! use std::sync::Arc;
//! use nutriscan::{estimate_dish_calories, NutriConfig, PipelineContext};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = NutriConfig::from_file("nutriscan.yaml")?;
//! let ctx = Arc::new(PipelineContext::load(config).await?);
//! let estimate = estimate_dish_calories(&ctx, "Phở bò tái", Some("peanut")).await?;
//! println!("{:?} ({})", estimate.calories_range, estimate.warning);
//! # Ok(())
//! # }
//! ```

mod allergy;
mod config;
mod context;
mod dish;
mod error;
mod image;

pub use crate::allergy::{check_allergy, parse_verdict, AllergyVerdict};
pub use crate::config::{
    AllergyConfig, ConfigLoadError, DataConfig, EmbeddersConfig, FallbackQuery, FallbackYamlConfig,
    FoodCheckConfig, NutriConfig, RegressorBackend, RegressorConfig, TimeoutConfig,
};
pub use crate::context::{ContextParts, PipelineContext};
pub use crate::dish::{estimate_dish_calories, DishEstimate, MatchedDish, NO_WARNING};
pub use crate::error::PipelineError;
pub use crate::image::{estimate_from_image, ScanOutcome};

pub use index::{
    FoodReference, InMemoryReferenceIndex, NutrientFacts, ReferenceEmbeddingSet, ReferenceIndex, SimilarityMatch,
};
pub use matcher::{DishMatch, GateDecision};
pub use recipe::{CalorieInterval, DishRecord, IngredientRecord, Range, RecipeCatalog};
pub use regressor::{FixedNutrientModel, MlpRegressor, NutrientEstimate, NutrientModel};
pub use semantic::{
    EmbeddingSpace, EmbeddingVector, ImageEmbedder, StubImageEmbedder, StubReplies, StubTextEmbedder,
    StubVisionLanguage, TextEmbedder, VisionLanguage,
};
