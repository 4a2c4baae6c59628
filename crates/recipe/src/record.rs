use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::RecipeError;

/// Closed numeric range `[min, max]`, both finite and non-negative.
///
/// Authored as a two-element array: `[100, 200]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub fn new(min: f64, max: f64) -> Result<Self, String> {
        if !min.is_finite() || !max.is_finite() {
            return Err(format!("range bounds must be finite, got [{min}, {max}]"));
        }
        if min < 0.0 {
            return Err(format!("range bounds must be >= 0, got [{min}, {max}]"));
        }
        if min > max {
            return Err(format!("range min exceeds max: [{min}, {max}]"));
        }
        Ok(Self { min, max })
    }
}

impl TryFrom<[f64; 2]> for Range {
    type Error = String;

    fn try_from([min, max]: [f64; 2]) -> Result<Self, Self::Error> {
        Range::new(min, max)
    }
}

impl From<Range> for [f64; 2] {
    fn from(r: Range) -> Self {
        [r.min, r.max]
    }
}

/// Calorie density of one ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRecord {
    #[serde(default)]
    pub id: String,
    /// Human-readable basis, e.g. `"per 100g"`.
    #[serde(alias = "unit")]
    pub display_unit: String,
    /// Quantity the calorie range refers to. Parsed from `display_unit`
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_size: Option<f64>,
    /// kcal per `unit_size`.
    pub calories: Range,
}

impl IngredientRecord {
    /// Explicit `unit_size`, else the first number in `display_unit`, else 1.
    pub fn effective_unit_size(&self) -> f64 {
        self.unit_size
            .or_else(|| first_number(&self.display_unit))
            .unwrap_or(1.0)
    }

    pub(crate) fn validate(&self) -> Result<(), RecipeError> {
        let size = self.effective_unit_size();
        if !size.is_finite() || size <= 0.0 {
            return Err(RecipeError::InvalidRecord {
                id: self.id.clone(),
                reason: format!("unit size must be > 0, got {size}"),
            });
        }
        Ok(())
    }
}

/// A known dish: ingredient id to quantity range, in the ingredient's units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub ingredients: BTreeMap<String, Range>,
    /// Ingredients that never contribute calories (water, salt).
    #[serde(default)]
    pub non_caloric: Vec<String>,
}

impl DishRecord {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }

    /// Every string a user might type for this dish: id, display name, aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str())
            .chain(self.display_name.as_deref())
            .chain(self.aliases.iter().map(String::as_str))
    }

    pub fn is_non_caloric(&self, ingredient: &str) -> bool {
        self.non_caloric.iter().any(|n| n == ingredient)
    }

    pub(crate) fn validate(&self) -> Result<(), RecipeError> {
        if self.id.trim().is_empty() {
            return Err(RecipeError::InvalidRecord {
                id: self.id.clone(),
                reason: "dish id must not be empty".into(),
            });
        }
        if self.ingredients.is_empty() {
            return Err(RecipeError::InvalidRecord {
                id: self.id.clone(),
                reason: "dish has no ingredients".into(),
            });
        }
        Ok(())
    }
}

/// First decimal number in `text`: `"per 100g"` gives 100.
fn first_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].trim_end_matches('.').parse().ok()
}
