use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::IndexError;

/// Nutrition facts attached to a reference food.
///
/// Values may be authored as plain numbers or unit-suffixed strings
/// (`"52kcal"`, `"0.17g"`); both parse to the same number. Calories are kcal,
/// the rest grams.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientFacts {
    #[serde(deserialize_with = "de_quantity")]
    pub calories: f32,
    #[serde(deserialize_with = "de_quantity")]
    pub fat: f32,
    #[serde(deserialize_with = "de_quantity")]
    pub carb: f32,
    #[serde(deserialize_with = "de_quantity")]
    pub protein: f32,
    #[serde(default, deserialize_with = "de_opt_quantity", skip_serializing_if = "Option::is_none")]
    pub mass: Option<f32>,
}

/// One entry of the curated fallback table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodReference {
    pub id: String,
    #[serde(alias = "food")]
    pub food_name: String,
    #[serde(default, alias = "tag")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub facts: NutrientFacts,
    /// Precomputed vector. Entries without one are embedded at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl FoodReference {
    /// Strings to embed for this entry: its tags, or the food name when there are none.
    pub fn embedding_keys(&self) -> Vec<&str> {
        let tags: Vec<&str> = self
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if tags.is_empty() {
            vec![self.food_name.as_str()]
        } else {
            tags
        }
    }
}

/// Reads a JSON array of [`FoodReference`] entries.
pub fn load_food_references(path: &Path) -> Result<Vec<FoodReference>, IndexError> {
    let bytes = std::fs::read(path).map_err(|e| IndexError::io(path, e))?;
    let refs: Vec<FoodReference> = serde_json::from_slice(&bytes)
        .map_err(|e| IndexError::InvalidData(format!("{}: {e}", path.display())))?;

    let mut seen = std::collections::HashSet::new();
    for r in &refs {
        if !seen.insert(r.id.as_str()) {
            return Err(IndexError::InvalidData(format!("duplicate food reference id {:?}", r.id)));
        }
    }
    tracing::info!(path = %path.display(), count = refs.len(), "food references loaded");
    Ok(refs)
}

/// Parses `"52kcal"`, `"0.17 g"` or `"13.8"` into a non-negative finite number.
pub fn parse_quantity(raw: &str) -> Option<f32> {
    let trimmed = raw.trim();
    let numeric_end = trimmed
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+'))
        .map_or(trimmed.len(), |(i, _)| i);
    let (number, unit) = trimmed.split_at(numeric_end);
    if !unit.trim().chars().all(|c| c.is_alphabetic()) {
        return None;
    }
    number.parse::<f32>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Number(f64),
    Text(String),
}

impl RawQuantity {
    fn resolve<E: serde::de::Error>(self) -> Result<f32, E> {
        match self {
            RawQuantity::Number(n) if n.is_finite() && n >= 0.0 => Ok(n as f32),
            RawQuantity::Number(n) => Err(E::custom(format!("quantity must be finite and >= 0, got {n}"))),
            RawQuantity::Text(s) => {
                parse_quantity(&s).ok_or_else(|| E::custom(format!("unparseable quantity {s:?}")))
            }
        }
    }
}

fn de_quantity<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    RawQuantity::deserialize(deserializer)?.resolve()
}

fn de_opt_quantity<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawQuantity>::deserialize(deserializer)?
        .map(RawQuantity::resolve)
        .transpose()
}
