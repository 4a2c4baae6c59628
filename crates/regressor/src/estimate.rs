use serde::{Deserialize, Serialize};

use crate::error::RegressorError;

/// Output order of every regressor head.
pub const OUTPUT_COLUMNS: [&str; 5] = ["mass", "calories", "fat", "carb", "protein"];

/// Nutrient totals for one photographed portion. Grams, except calories (kcal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutrientEstimate {
    pub mass: f32,
    pub calories: f32,
    pub fat: f32,
    pub carb: f32,
    pub protein: f32,
}

impl NutrientEstimate {
    /// Builds an estimate from raw head outputs, rejecting non-finite values
    /// and clipping negatives to zero.
    pub fn from_outputs(raw: [f32; 5]) -> Result<Self, RegressorError> {
        for (value, field) in raw.iter().zip(OUTPUT_COLUMNS) {
            if !value.is_finite() {
                return Err(RegressorError::NonFiniteOutput { field });
            }
        }
        let [mass, calories, fat, carb, protein] = raw.map(|v| v.max(0.0));
        Ok(Self {
            mass,
            calories,
            fat,
            carb,
            protein,
        })
    }

    pub fn as_array(&self) -> [f32; 5] {
        [self.mass, self.calories, self.fat, self.carb, self.protein]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negatives_are_clipped() {
        let est = NutrientEstimate::from_outputs([250.0, -3.0, 1.5, -0.0001, 12.0]).unwrap();
        assert_eq!(est.as_array(), [250.0, 0.0, 1.5, 0.0, 12.0]);
    }

    #[test]
    fn non_finite_outputs_name_the_field() {
        let err = NutrientEstimate::from_outputs([1.0, 1.0, f32::NAN, 1.0, 1.0]).unwrap_err();
        assert_eq!(err, RegressorError::NonFiniteOutput { field: "fat" });

        let err = NutrientEstimate::from_outputs([f32::INFINITY, 1.0, 1.0, 1.0, 1.0]).unwrap_err();
        assert_eq!(err, RegressorError::NonFiniteOutput { field: "mass" });
    }
}
