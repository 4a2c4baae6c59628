use serde::{Deserialize, Serialize};

use crate::catalog::RecipeCatalog;
use crate::error::RecipeError;
use crate::record::DishRecord;

/// What to do with a dish ingredient missing from the ingredient table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnknownIngredientPolicy {
    /// Leave it out of the sums and log a warning.
    #[default]
    Skip,
    /// Fail with [`RecipeError::UnknownIngredient`].
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Fraction of the span trimmed from each end. Must lie in `[0, 0.5)`.
    pub ratio: f64,
    pub unknown_ingredients: UnknownIngredientPolicy,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            ratio: 0.25,
            unknown_ingredients: UnknownIngredientPolicy::Skip,
        }
    }
}

impl SynthesisConfig {
    pub fn validate(&self) -> Result<(), RecipeError> {
        if !(0.0..0.5).contains(&self.ratio) {
            return Err(RecipeError::InvalidRatio(self.ratio));
        }
        Ok(())
    }
}

/// Narrowed calorie bound for one dish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalorieInterval {
    pub low: f64,
    pub high: f64,
    /// Sum of minimum quantities at minimum density.
    pub min_total: f64,
    /// Sum of maximum quantities at maximum density.
    pub max_total: f64,
    /// Ingredients that contributed to the sums.
    pub resolved: usize,
    /// Ingredients left out because the table does not know them.
    pub skipped: usize,
}

impl CalorieInterval {
    /// False when no ingredient could be resolved; the `(0, 0)` bound then
    /// carries no information.
    pub fn is_usable(&self) -> bool {
        self.resolved > 0
    }

    pub fn as_pair(&self) -> (f64, f64) {
        (self.low, self.high)
    }
}

/// Composes per-ingredient calorie ranges into a dish interval.
///
/// ```text
/// min_total = Σ (qty_min / unit_size) * cal_min
/// max_total = Σ (qty_max / unit_size) * cal_max
/// low  = min_total + (max_total - min_total) * ratio
/// high = max_total - (max_total - min_total) * ratio
/// ```
pub fn synthesize(
    dish: &DishRecord,
    catalog: &RecipeCatalog,
    cfg: &SynthesisConfig,
) -> Result<CalorieInterval, RecipeError> {
    cfg.validate()?;

    let mut min_total = 0.0f64;
    let mut max_total = 0.0f64;
    let mut resolved = 0usize;
    let mut skipped = 0usize;

    // BTreeMap iteration keeps the summation order fixed.
    for (name, qty) in &dish.ingredients {
        if dish.is_non_caloric(name) {
            continue;
        }
        let Some(ingredient) = catalog.ingredient(name) else {
            match cfg.unknown_ingredients {
                UnknownIngredientPolicy::Skip => {
                    tracing::warn!(dish = %dish.id, ingredient = %name, "skipping unknown ingredient");
                    skipped += 1;
                    continue;
                }
                UnknownIngredientPolicy::Reject => {
                    return Err(RecipeError::UnknownIngredient {
                        dish: dish.id.clone(),
                        ingredient: name.clone(),
                    });
                }
            }
        };

        let unit = ingredient.effective_unit_size();
        min_total += qty.min / unit * ingredient.calories.min;
        max_total += qty.max / unit * ingredient.calories.max;
        resolved += 1;
    }

    let span = max_total - min_total;
    let low = min_total + span * cfg.ratio;
    let high = max_total - span * cfg.ratio;

    tracing::debug!(
        dish = %dish.id,
        min_total,
        max_total,
        low,
        high,
        resolved,
        skipped,
        "calorie interval synthesized"
    );

    Ok(CalorieInterval {
        low,
        high,
        min_total,
        max_total,
        resolved,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{IngredientRecord, Range};
    use std::collections::BTreeMap;

    fn ingredient(id: &str, unit: &str, min: f64, max: f64) -> (String, IngredientRecord) {
        (
            id.to_string(),
            IngredientRecord {
                id: id.to_string(),
                display_unit: unit.to_string(),
                unit_size: None,
                calories: Range::new(min, max).unwrap(),
            },
        )
    }

    fn dish(id: &str, parts: &[(&str, f64, f64)], non_caloric: &[&str]) -> DishRecord {
        DishRecord {
            id: id.into(),
            display_name: None,
            aliases: Vec::new(),
            ingredients: parts
                .iter()
                .map(|(name, lo, hi)| (name.to_string(), Range::new(*lo, *hi).unwrap()))
                .collect(),
            non_caloric: non_caloric.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn catalog(dishes: Vec<DishRecord>) -> RecipeCatalog {
        let table: BTreeMap<_, _> = [
            ingredient("banana", "per 100g", 105.0, 130.0),
            ingredient("rice", "per 100g", 110.0, 130.0),
            ingredient("egg", "1 piece", 70.0, 80.0),
        ]
        .into_iter()
        .collect();
        RecipeCatalog::from_parts(dishes, table).unwrap()
    }

    #[test]
    fn single_ingredient_reference_values() {
        let d = dish("banana", &[("banana", 100.0, 200.0)], &[]);
        let cat = catalog(vec![d.clone()]);
        let out = synthesize(&d, &cat, &SynthesisConfig::default()).unwrap();
        assert_eq!(out.min_total, 105.0);
        assert_eq!(out.max_total, 260.0);
        assert_eq!(out.as_pair(), (143.75, 221.25));
        assert!(out.is_usable());
    }

    #[test]
    fn zero_ratio_returns_raw_bound() {
        let d = dish("x", &[("rice", 100.0, 200.0), ("egg", 1.0, 2.0)], &[]);
        let cat = catalog(vec![d.clone()]);
        let cfg = SynthesisConfig {
            ratio: 0.0,
            ..Default::default()
        };
        let out = synthesize(&d, &cat, &cfg).unwrap();
        assert_eq!(out.low, 110.0 + 70.0);
        assert_eq!(out.high, 260.0 + 160.0);
    }

    #[test]
    fn narrowing_strictly_shrinks_interval() {
        let d = dish("x", &[("rice", 150.0, 250.0), ("egg", 1.0, 2.0)], &[]);
        let cat = catalog(vec![d.clone()]);
        for ratio in [0.05, 0.1, 0.25, 0.4, 0.49] {
            let cfg = SynthesisConfig {
                ratio,
                ..Default::default()
            };
            let out = synthesize(&d, &cat, &cfg).unwrap();
            assert!(0.0 <= out.low && out.low <= out.high);
            assert!(out.low > out.min_total, "ratio {ratio}");
            assert!(out.high < out.max_total, "ratio {ratio}");
        }
    }

    #[test]
    fn ratio_is_validated() {
        let d = dish("x", &[("rice", 1.0, 2.0)], &[]);
        let cat = catalog(vec![d.clone()]);
        for ratio in [-0.1, 0.5, 0.9, f64::NAN] {
            let cfg = SynthesisConfig {
                ratio,
                ..Default::default()
            };
            assert!(matches!(synthesize(&d, &cat, &cfg), Err(RecipeError::InvalidRatio(_))));
        }
    }

    #[test]
    fn unknown_ingredients_skip_or_reject() {
        let d = dish("x", &[("rice", 100.0, 100.0), ("unicorn", 1.0, 1.0)], &[]);
        let cat = catalog(vec![d.clone()]);

        let lenient = synthesize(&d, &cat, &SynthesisConfig::default()).unwrap();
        assert_eq!((lenient.resolved, lenient.skipped), (1, 1));
        assert_eq!(lenient.min_total, 110.0);

        let strict = SynthesisConfig {
            unknown_ingredients: UnknownIngredientPolicy::Reject,
            ..Default::default()
        };
        let err = synthesize(&d, &cat, &strict).unwrap_err();
        assert_eq!(
            err,
            RecipeError::UnknownIngredient {
                dish: "x".into(),
                ingredient: "unicorn".into()
            }
        );
    }

    #[test]
    fn non_caloric_ingredients_never_count() {
        let d = dish("soup", &[("rice", 100.0, 100.0), ("water", 300.0, 400.0)], &["water"]);
        let cat = catalog(vec![d.clone()]);
        let strict = SynthesisConfig {
            unknown_ingredients: UnknownIngredientPolicy::Reject,
            ..Default::default()
        };
        let out = synthesize(&d, &cat, &strict).unwrap();
        assert_eq!((out.resolved, out.skipped), (1, 0));
    }

    #[test]
    fn nothing_resolved_is_unusable() {
        let d = dish("mystery", &[("unicorn", 1.0, 2.0)], &[]);
        let cat = catalog(vec![d.clone()]);
        let out = synthesize(&d, &cat, &SynthesisConfig::default()).unwrap();
        assert_eq!(out.as_pair(), (0.0, 0.0));
        assert!(!out.is_usable());
    }
}
