//! Nutrient regressor invocation.
//!
//! A [`NutrientModel`] maps an in-domain image feature vector to five raw
//! outputs. [`estimate_nutrients`] is the contract callers go through: it
//! checks the feature count, refuses non-finite outputs and clips negatives,
//! so a returned [`NutrientEstimate`] is always usable as-is.
//!
//! [`MlpRegressor`] runs the trained dense head from exported JSON weights;
//! [`FixedNutrientModel`] answers a constant for development setups without
//! weights.

mod error;
mod estimate;
mod mlp;

pub use error::RegressorError;
pub use estimate::{NutrientEstimate, OUTPUT_COLUMNS};
pub use mlp::MlpRegressor;

/// A pre-trained regression head.
pub trait NutrientModel: Send + Sync {
    /// Number of features the head consumes.
    fn input_dim(&self) -> usize;

    fn name(&self) -> &str;

    /// Raw outputs in [`OUTPUT_COLUMNS`] order.
    fn predict(&self, features: &[f32]) -> Result<[f32; 5], RegressorError>;
}

/// Runs `model` on `features` and validates the result.
pub fn estimate_nutrients(
    model: &dyn NutrientModel,
    features: &[f32],
) -> Result<NutrientEstimate, RegressorError> {
    if features.len() != model.input_dim() {
        return Err(RegressorError::ShapeMismatch {
            expected: model.input_dim(),
            actual: features.len(),
        });
    }
    let raw = model.predict(features)?;
    let estimate = NutrientEstimate::from_outputs(raw)?;
    tracing::debug!(model = model.name(), ?estimate, "regressor estimate");
    Ok(estimate)
}

/// Returns the same estimate for every input of the right size.
#[derive(Debug, Clone)]
pub struct FixedNutrientModel {
    input_dim: usize,
    outputs: [f32; 5],
}

impl FixedNutrientModel {
    pub fn new(input_dim: usize, outputs: [f32; 5]) -> Self {
        Self { input_dim, outputs }
    }
}

impl NutrientModel for FixedNutrientModel {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn predict(&self, _features: &[f32]) -> Result<[f32; 5], RegressorError> {
        Ok(self.outputs)
    }
}
