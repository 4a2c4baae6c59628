//! Configuration types for dish-name canonicalization.
//!
//! [`CanonicalizeConfig`] controls how free text is folded into the form used
//! for catalog keys and incoming descriptions. Both sides of a comparison must
//! be normalized with the same configuration, so the config carries a
//! `version` that is bumped whenever the output for some input changes.
//!
//! # Examples
//!
//! ```rust
//! use canonical::CanonicalizeConfig;
//!
//! let config = CanonicalizeConfig::default();
//! assert_eq!(config.version, 1);
//! assert!(config.strip_diacritics);
//! assert!(!config.collapse_whitespace);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::CanonicalError;

/// Configuration for the dish-name normalizer.
///
/// The defaults implement the reference behavior: canonical decomposition,
/// combining marks dropped, lowercase, everything outside `[a-z0-9]` and
/// whitespace replaced by a space, edges trimmed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CanonicalizeConfig {
    /// Version of the normalization rules. Must be >= 1.
    pub version: u32,
    /// Decompose (NFD) and drop combining marks, so `"ở"` becomes `"o"`.
    pub strip_diacritics: bool,
    /// Apply Unicode lowercasing before the ASCII filter.
    pub lowercase: bool,
    /// Collapse internal runs of whitespace into a single ASCII space.
    pub collapse_whitespace: bool,
    /// Map stroked letters without a canonical decomposition (`đ`, `Đ`) to
    /// their base letter instead of replacing them with a space.
    pub fold_stroked_letters: bool,
}

impl Default for CanonicalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            strip_diacritics: true,
            lowercase: true,
            collapse_whitespace: false,
            fold_stroked_letters: false,
        }
    }
}

impl CanonicalizeConfig {
    /// Reject configurations that cannot produce stable keys.
    pub fn validate(&self) -> Result<(), CanonicalError> {
        if self.version == 0 {
            return Err(CanonicalError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = CanonicalizeConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.lowercase);
        assert!(!cfg.fold_stroked_letters);
    }

    #[test]
    fn version_zero_rejected() {
        let cfg = CanonicalizeConfig {
            version: 0,
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(CanonicalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: CanonicalizeConfig =
            serde_json::from_str(r#"{"collapse_whitespace": true}"#).unwrap();
        assert!(cfg.collapse_whitespace);
        assert_eq!(cfg.version, 1);
        assert!(cfg.strip_diacritics);
    }
}
