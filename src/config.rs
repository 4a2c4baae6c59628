//! YAML configuration for the estimation pipeline.
//!
//! One file configures every stage. Every field has a default, so an empty
//! document is a valid (fully stubbed) configuration.
//!
//! ```yaml
//! version: "1.0"
//!
//! gate:
//!   threshold: 0.65
//!
//! dish:
//!   threshold: 0.2
//!   exact_alias_match: true
//!
//! synthesis:
//!   ratio: 0.25
//!   unknown_ingredients: skip     # or: reject
//!
//! fallback:
//!   query: describe               # or: image_embedding
//!   min_score: null
//!
//! food_check:
//!   enabled: true
//!
//! embedders:
//!   image: { backend: api, api_url: "https://example.invalid/efficientnet", dimension: 1280 }
//!   text:  { backend: api, api_url: "https://example.invalid/minilm", dimension: 384 }
//!
//! classifier:
//!   backend: api
//!   model: "Qwen/Qwen2.5-VL-7B-Instruct"
//!
//! regressor:
//!   backend: mlp
//!   weights_path: models/nutrient_regressor.json
//!
//! data:
//!   reference_embeddings: data/embeddings.npy
//!   food_references: data/food_references.json
//!   dishes: data/dishes.json
//!   ingredients: data/ingredients.json
//!
//! timeouts:
//!   embed_ms: 10000
//!   classify_ms: 20000
//! ```
//!
//! Relative data paths are resolved against the directory of the config file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use index::ReferenceFormat;
use matcher::{DishMatchConfig, FallbackConfig, GateConfig};
use recipe::SynthesisConfig;
use semantic::{ClassifierConfig, EmbedderConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NutriConfig {
    pub version: String,
    pub name: Option<String>,
    pub gate: GateConfig,
    pub dish: DishMatchConfig,
    pub synthesis: SynthesisConfig,
    pub fallback: FallbackYamlConfig,
    pub allergy: AllergyConfig,
    pub food_check: FoodCheckConfig,
    pub embedders: EmbeddersConfig,
    pub classifier: ClassifierConfig,
    pub regressor: RegressorConfig,
    pub data: DataConfig,
    pub timeouts: TimeoutConfig,
}

impl Default for NutriConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            gate: GateConfig::default(),
            dish: DishMatchConfig::default(),
            synthesis: SynthesisConfig::default(),
            fallback: FallbackYamlConfig::default(),
            allergy: AllergyConfig::default(),
            food_check: FoodCheckConfig::default(),
            embedders: EmbeddersConfig::default(),
            classifier: ClassifierConfig::default(),
            regressor: RegressorConfig::default(),
            data: DataConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl NutriConfig {
    /// Load, validate and resolve relative data paths against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigLoadError::FileRead {
            path: path.display().to_string(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: NutriConfig = if yaml.trim().is_empty() {
            NutriConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        self.gate.validate().map_err(validation("gate"))?;
        self.dish.validate().map_err(validation("dish"))?;
        self.synthesis.validate().map_err(validation("synthesis"))?;
        self.fallback.matcher().validate().map_err(validation("fallback"))?;
        self.embedders.image.validate().map_err(validation("embedders.image"))?;
        self.embedders.text.validate().map_err(validation("embedders.text"))?;
        self.classifier.validate().map_err(validation("classifier"))?;
        self.regressor.validate()?;
        self.timeouts.validate()?;
        Ok(())
    }

    /// Rebase relative data paths onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let rebase = |p: &mut Option<PathBuf>| {
            if let Some(path) = p {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        };
        rebase(&mut self.data.reference_embeddings);
        rebase(&mut self.data.food_references);
        rebase(&mut self.data.dishes);
        rebase(&mut self.data.ingredients);
        rebase(&mut self.regressor.weights_path);
    }
}

fn validation<E: std::fmt::Display>(section: &'static str) -> impl Fn(E) -> ConfigLoadError {
    move |err| ConfigLoadError::Validation(format!("{section}: {err}"))
}

/// How the fallback lookup builds its query vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackQuery {
    /// Ask the vision-language model for a keyword and text-embed it.
    #[default]
    Describe,
    /// Query an image-space index with the image vector itself.
    ImageEmbedding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackYamlConfig {
    pub query: FallbackQuery,
    pub min_score: Option<f32>,
    pub describe_prompt: String,
}

impl Default for FallbackYamlConfig {
    fn default() -> Self {
        Self {
            query: FallbackQuery::Describe,
            min_score: None,
            describe_prompt: "Name the food or drink (or both) in this photo. Then give one simple \
                              search keyword for it on its own line, formatted as: Keyword: <keyword>"
                .to_string(),
        }
    }
}

impl FallbackYamlConfig {
    pub fn matcher(&self) -> FallbackConfig {
        FallbackConfig {
            min_score: self.min_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllergyConfig {
    /// Prompt sent to the classifier. `{dish}` and `{allergy}` are substituted.
    pub prompt_template: String,
}

impl Default for AllergyConfig {
    fn default() -> Self {
        Self {
            prompt_template: "A user with the allergy \"{allergy}\" wants to eat \"{dish}\". \
                              Answer with exactly one word: compatible or incompatible."
                .to_string(),
        }
    }
}

impl AllergyConfig {
    pub fn render(&self, dish: &str, allergy: &str) -> String {
        self.prompt_template
            .replace("{dish}", dish)
            .replace("{allergy}", allergy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodCheckConfig {
    pub enabled: bool,
    pub prompt: String,
}

impl Default for FoodCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prompt: "Look at the photo. Is it something a person can eat or drink? \
                     Reply FOOD if it is and NOT_FOOD if it is not. No explanation."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddersConfig {
    pub image: EmbedderConfig,
    pub text: EmbedderConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RegressorBackend {
    /// MLP head loaded from a JSON weight export.
    #[default]
    Mlp,
    /// Constant outputs; for local development without weights.
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressorConfig {
    pub backend: RegressorBackend,
    pub weights_path: Option<PathBuf>,
    /// Outputs of the `fixed` backend, in `mass, calories, fat, carb, protein` order.
    pub fixed_outputs: [f32; 5],
}

impl Default for RegressorConfig {
    fn default() -> Self {
        Self {
            backend: RegressorBackend::Mlp,
            weights_path: None,
            fixed_outputs: [250.0, 320.0, 12.0, 40.0, 15.0],
        }
    }
}

impl RegressorConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.fixed_outputs.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigLoadError::Validation(
                "regressor.fixed_outputs must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Locations of the startup tables. Unset entries load as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub reference_embeddings: Option<PathBuf>,
    /// Inferred from the file extension when unset.
    pub reference_format: Option<ReferenceFormat>,
    pub food_references: Option<PathBuf>,
    pub dishes: Option<PathBuf>,
    pub ingredients: Option<PathBuf>,
}

impl DataConfig {
    pub fn reference_format(&self) -> Option<ReferenceFormat> {
        self.reference_format
            .or_else(|| self.reference_embeddings.as_deref().map(ReferenceFormat::from_path))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub embed_ms: u64,
    pub classify_ms: u64,
    pub describe_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embed_ms: 10_000,
            classify_ms: 20_000,
            describe_ms: 30_000,
        }
    }
}

impl TimeoutConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.embed_ms == 0 || self.classify_ms == 0 || self.describe_ms == 0 {
            return Err(ConfigLoadError::Validation(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn embed(&self) -> Duration {
        Duration::from_millis(self.embed_ms)
    }

    pub fn classify(&self) -> Duration {
        Duration::from_millis(self.classify_ms)
    }

    pub fn describe(&self) -> Duration {
        Duration::from_millis(self.describe_ms)
    }
}
