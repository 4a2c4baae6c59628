//! Dense regressor head executed on `ndarray`.
//!
//! Weights come from a JSON export of the trained state dict: an ordered
//! list of layers, each tagged by `type`. Dropout layers are accepted and
//! ignored (inference mode). BatchNorm uses its running statistics.
//!
//! ```json
//! { "input_dim": 1280,
//!   "layers": [
//!     { "type": "linear", "weight": [[...]], "bias": [...] },
//!     { "type": "silu" },
//!     { "type": "batch_norm", "running_mean": [...], "running_var": [...],
//!       "weight": [...], "bias": [...], "eps": 1e-5 },
//!     { "type": "dropout", "p": 0.3 },
//!     ...
//!   ] }
//! ```

use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::path::Path;

use crate::error::RegressorError;
use crate::NutrientModel;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LayerSpec {
    Linear {
        weight: Vec<Vec<f32>>,
        bias: Vec<f32>,
    },
    Silu,
    BatchNorm {
        running_mean: Vec<f32>,
        running_var: Vec<f32>,
        weight: Vec<f32>,
        bias: Vec<f32>,
        #[serde(default = "default_eps")]
        eps: f32,
    },
    Dropout {
        #[serde(default)]
        #[allow(dead_code)]
        p: f32,
    },
}

fn default_eps() -> f32 {
    1e-5
}

#[derive(Debug, Deserialize)]
struct WeightsFile {
    input_dim: usize,
    layers: Vec<LayerSpec>,
}

#[derive(Debug, Clone)]
enum Layer {
    /// `y = W x + b`, `W` is `(out, in)`.
    Linear { weight: Array2<f32>, bias: Array1<f32> },
    Silu,
    /// Folded into a per-feature affine map: `y = x * scale + shift`.
    BatchNorm { scale: Array1<f32>, shift: Array1<f32> },
}

#[derive(Debug, Clone)]
pub struct MlpRegressor {
    name: String,
    input_dim: usize,
    layers: Vec<Layer>,
}

impl MlpRegressor {
    pub fn load_json(path: &Path) -> Result<Self, RegressorError> {
        let bytes = std::fs::read(path).map_err(|e| RegressorError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let file: WeightsFile = serde_json::from_slice(&bytes)
            .map_err(|e| RegressorError::InvalidWeights(format!("{}: {e}", path.display())))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("mlp")
            .to_string();
        let model = Self::from_specs(name, file.input_dim, file.layers)?;
        tracing::info!(
            path = %path.display(),
            input_dim = model.input_dim,
            layers = model.layers.len(),
            "regressor weights loaded"
        );
        Ok(model)
    }

    pub fn from_json_str(name: &str, json: &str) -> Result<Self, RegressorError> {
        let file: WeightsFile =
            serde_json::from_str(json).map_err(|e| RegressorError::InvalidWeights(e.to_string()))?;
        Self::from_specs(name.to_string(), file.input_dim, file.layers)
    }

    fn from_specs(name: String, input_dim: usize, specs: Vec<LayerSpec>) -> Result<Self, RegressorError> {
        if input_dim == 0 {
            return Err(RegressorError::InvalidWeights("input_dim must be > 0".into()));
        }
        let mut width = input_dim;
        let mut layers = Vec::with_capacity(specs.len());

        for (idx, spec) in specs.into_iter().enumerate() {
            match spec {
                LayerSpec::Linear { weight, bias } => {
                    let out = weight.len();
                    if out == 0 || bias.len() != out {
                        return Err(RegressorError::InvalidWeights(format!(
                            "layer {idx}: linear has {out} weight rows and {} biases",
                            bias.len()
                        )));
                    }
                    if let Some(row) = weight.iter().position(|r| r.len() != width) {
                        return Err(RegressorError::InvalidWeights(format!(
                            "layer {idx}: weight row {row} has {} inputs, expected {width}",
                            weight[row].len()
                        )));
                    }
                    let flat: Vec<f32> = weight.into_iter().flatten().collect();
                    let weight = Array2::from_shape_vec((out, width), flat)
                        .map_err(|e| RegressorError::InvalidWeights(format!("layer {idx}: {e}")))?;
                    layers.push(Layer::Linear {
                        weight,
                        bias: Array1::from(bias),
                    });
                    width = out;
                }
                LayerSpec::Silu => layers.push(Layer::Silu),
                LayerSpec::BatchNorm {
                    running_mean,
                    running_var,
                    weight,
                    bias,
                    eps,
                } => {
                    let lens = [running_mean.len(), running_var.len(), weight.len(), bias.len()];
                    if lens.iter().any(|&l| l != width) {
                        return Err(RegressorError::InvalidWeights(format!(
                            "layer {idx}: batch_norm parameter lengths {lens:?} do not match width {width}"
                        )));
                    }
                    if eps.is_nan() || eps <= 0.0 || running_var.iter().any(|v| *v < 0.0) {
                        return Err(RegressorError::InvalidWeights(format!(
                            "layer {idx}: batch_norm needs eps > 0 and non-negative variance"
                        )));
                    }
                    let mut scale = Array1::zeros(width);
                    let mut shift = Array1::zeros(width);
                    for i in 0..width {
                        let s = weight[i] / (running_var[i] + eps).sqrt();
                        scale[i] = s;
                        shift[i] = bias[i] - running_mean[i] * s;
                    }
                    layers.push(Layer::BatchNorm { scale, shift });
                }
                LayerSpec::Dropout { .. } => {}
            }
        }

        if width != 5 {
            return Err(RegressorError::InvalidWeights(format!(
                "final width is {width}, the head must produce 5 outputs"
            )));
        }
        Ok(Self {
            name,
            input_dim,
            layers,
        })
    }

    fn forward(&self, features: &[f32]) -> Array1<f32> {
        let mut x = Array1::from(features.to_vec());
        for layer in &self.layers {
            x = match layer {
                Layer::Linear { weight, bias } => weight.dot(&x) + bias,
                Layer::Silu => x.mapv(silu),
                Layer::BatchNorm { scale, shift } => x * scale + shift,
            };
        }
        x
    }
}

#[inline]
fn silu(v: f32) -> f32 {
    v / (1.0 + (-v).exp())
}

impl NutrientModel for MlpRegressor {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &[f32]) -> Result<[f32; 5], RegressorError> {
        if features.len() != self.input_dim {
            return Err(RegressorError::ShapeMismatch {
                expected: self.input_dim,
                actual: features.len(),
            });
        }
        let out = self.forward(features);
        match out.as_slice() {
            Some([a, b, c, d, e]) => Ok([*a, *b, *c, *d, *e]),
            _ => Err(RegressorError::Model(format!(
                "head produced {} outputs",
                out.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // 2 -> 2 (silu, batch_norm, dropout) -> 5
    const TINY: &str = r#"{
        "input_dim": 2,
        "layers": [
            { "type": "linear", "weight": [[1.0, 0.0], [0.0, 2.0]], "bias": [0.0, -1.0] },
            { "type": "silu" },
            { "type": "batch_norm", "running_mean": [0.0, 1.0], "running_var": [1.0, 4.0],
              "weight": [1.0, 2.0], "bias": [0.5, 0.0], "eps": 0.0001 },
            { "type": "dropout", "p": 0.3 },
            { "type": "linear",
              "weight": [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [-1.0, 0.0], [0.0, 0.0]],
              "bias": [0.0, 0.0, 0.0, 0.0, 7.0] }
        ]
    }"#;

    fn reference_forward(x: [f32; 2]) -> [f32; 5] {
        let h = [x[0], 2.0 * x[1] - 1.0];
        let h = [silu(h[0]), silu(h[1])];
        let bn0 = (h[0] - 0.0) / (1.0f32 + 0.0001).sqrt() * 1.0 + 0.5;
        let bn1 = (h[1] - 1.0) / (4.0f32 + 0.0001).sqrt() * 2.0 + 0.0;
        [bn0, bn1, bn0 + bn1, -bn0, 7.0]
    }

    #[test]
    fn forward_matches_hand_computation() {
        let model = MlpRegressor::from_json_str("tiny", TINY).unwrap();
        assert_eq!(model.input_dim(), 2);
        let out = model.predict(&[0.8, -1.5]).unwrap();
        let expected = reference_forward([0.8, -1.5]);
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-5, "{got} vs {want}");
        }
    }

    #[test]
    fn silu_known_values() {
        assert_eq!(silu(0.0), 0.0);
        assert!((silu(1.0) - 0.731_058_6).abs() < 1e-6);
        assert!(silu(-20.0).abs() < 1e-6);
    }

    #[test]
    fn wrong_feature_count_is_shape_mismatch() {
        let model = MlpRegressor::from_json_str("tiny", TINY).unwrap();
        assert_eq!(
            model.predict(&[1.0, 2.0, 3.0]).unwrap_err(),
            RegressorError::ShapeMismatch { expected: 2, actual: 3 }
        );
    }

    #[test]
    fn rejects_broken_layer_chains() {
        let mismatched = r#"{"input_dim": 3, "layers": [
            {"type": "linear", "weight": [[1.0, 1.0]], "bias": [0.0]}
        ]}"#;
        assert!(matches!(
            MlpRegressor::from_json_str("m", mismatched),
            Err(RegressorError::InvalidWeights(_))
        ));

        let wrong_head = r#"{"input_dim": 1, "layers": [
            {"type": "linear", "weight": [[1.0]], "bias": [0.0]}
        ]}"#;
        let err = MlpRegressor::from_json_str("m", wrong_head).unwrap_err();
        assert!(err.to_string().contains("5 outputs"));

        let bad_bn = r#"{"input_dim": 1, "layers": [
            {"type": "batch_norm", "running_mean": [0.0], "running_var": [-1.0], "weight": [1.0], "bias": [0.0]}
        ]}"#;
        assert!(MlpRegressor::from_json_str("m", bad_bn).is_err());
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(TINY.as_bytes()).unwrap();
        let model = MlpRegressor::load_json(file.path()).unwrap();
        assert_eq!(model.input_dim(), 2);
        assert!(!model.name().is_empty());

        let missing = MlpRegressor::load_json(Path::new("/definitely/not/here.json"));
        assert!(matches!(missing, Err(RegressorError::Io { .. })));
    }
}
