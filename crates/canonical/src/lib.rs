//! Dish-name canonical text layer.
//!
//! Free-text dish descriptions and catalog keys are folded into one matching
//! form before they are embedded, so accents, casing and punctuation never
//! decide whether two strings match.
//!
//! ## What we do
//!
//! - Unicode canonical decomposition (NFD) and removal of combining marks
//! - Unicode lowercasing
//! - Every character outside `[a-z0-9]` and whitespace becomes a space
//! - Edges trimmed (optionally, internal whitespace collapsed)
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. Output depends only on the
//! text and the config, and normalizing an already-normalized string returns
//! it unchanged.

mod config;
mod error;
mod pipeline;
mod whitespace;

pub use crate::config::CanonicalizeConfig;
pub use crate::error::CanonicalError;
pub use crate::pipeline::{canonical_key, normalize, normalize_text};
pub use crate::whitespace::collapse_whitespace;
