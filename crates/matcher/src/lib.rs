//! # NutriScan Matcher (`matcher`)
//!
//! Decision logic that sits between the embedders and the nutrient data:
//!
//! - [`DomainGate`]: is this image close enough to the regressor's training
//!   set to trust a regression?
//! - [`FallbackMatcher`]: when it is not, which curated reference is nearest?
//! - [`DishMatcher`]: which catalog dish does a free-text description name?
//!
//! All three are built once at startup and then only read, so a single
//! instance can serve concurrent requests behind an `Arc`.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use matcher::{DishMatchConfig, DishMatcher};
//! use recipe::RecipeCatalog;
//! use semantic::{build_text_embedder, EmbedderConfig};
//!
//! # async fn run(catalog: RecipeCatalog) -> Result<(), matcher::MatchError> {
//! let embedder = build_text_embedder(&EmbedderConfig::default())?;
//! let dishes = DishMatcher::build(&catalog, embedder, DishMatchConfig::default(), Duration::from_secs(5)).await?;
//! if let Some(hit) = dishes.match_dish("Phở bò tái").await? {
//!     println!("{} ({:.2})", hit.dish_id, hit.score);
//! }
//! # Ok(())
//! # }
//! ```

mod dish;
mod error;
mod fallback;
mod gate;

pub use crate::dish::{DishMatch, DishMatchConfig, DishMatcher, DEFAULT_DISH_THRESHOLD};
pub use crate::error::MatchError;
pub use crate::fallback::{extract_keyword, FallbackConfig, FallbackMatcher, FALLBACK_TOP_K};
pub use crate::gate::{DomainGate, GateConfig, GateDecision, DEFAULT_GATE_THRESHOLD};
