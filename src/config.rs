//! Training and serving configuration.
//!
//! Every field has a default, so a partial JSON file only overrides what it
//! names:
//!
//! ```json
//! { "seed": 7, "forest": { "n_estimators": 100 } }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PredictorError, Result};

/// Plausibility bounds applied by the domain filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterBounds {
    /// Rows must have area strictly above this many square feet.
    pub min_area_exclusive: f64,
    /// Minimum area of a one-bedroom unit.
    pub single_bedroom_min_area: f64,
    /// Minimum area per bedroom for units with two or more bedrooms.
    pub per_bedroom_min_area: f64,
    /// Lowest plausible rent per square foot.
    pub min_rent_per_sqft: f64,
    /// Highest plausible rent per square foot.
    pub max_rent_per_sqft: f64,
    /// Villas need at least this many bedrooms.
    pub villa_min_bedrooms: u32,
}

impl Default for FilterBounds {
    fn default() -> Self {
        Self {
            min_area_exclusive: 300.0,
            single_bedroom_min_area: 450.0,
            per_bedroom_min_area: 350.0,
            min_rent_per_sqft: 8.0,
            max_rent_per_sqft: 150.0,
            villa_min_bedrooms: 2,
        }
    }
}

/// Hyperparameters of the bagged regression-tree ensemble.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub bootstrap: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 350,
            max_depth: 18,
            min_samples_split: 2,
            min_samples_leaf: 1,
            bootstrap: true,
        }
    }
}

/// Configuration of a training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation.
    pub test_ratio: f64,
    /// Seed for the split and for every tree's bootstrap sample.
    pub seed: u64,
    /// Localities seen fewer times than this are bucketed to `Other`.
    pub min_locality_support: usize,
    /// Runs with fewer surviving rows abort.
    pub min_rows: usize,
    pub forest: ForestConfig,
    pub bounds: FilterBounds,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            seed: 42,
            min_locality_support: 40,
            min_rows: 500,
            forest: ForestConfig::default(),
            bounds: FilterBounds::default(),
        }
    }
}

impl TrainingConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot produce a model.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_ratio > 0.0 && self.test_ratio < 1.0) {
            return Err(PredictorError::InvalidParameter(format!(
                "test_ratio must be in (0, 1), got {}",
                self.test_ratio
            )));
        }
        if self.forest.n_estimators == 0 {
            return Err(PredictorError::InvalidParameter(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if self.forest.max_depth == 0 {
            return Err(PredictorError::InvalidParameter(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.forest.min_samples_leaf == 0 || self.forest.min_samples_split < 2 {
            return Err(PredictorError::InvalidParameter(
                "min_samples_leaf must be >= 1 and min_samples_split >= 2".to_string(),
            ));
        }
        if self.bounds.min_rent_per_sqft > self.bounds.max_rent_per_sqft {
            return Err(PredictorError::InvalidParameter(
                "min_rent_per_sqft exceeds max_rent_per_sqft".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration of the prediction service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Path of the trained artifact, loaded once at startup.
    pub artifact_path: PathBuf,
    /// Prefix used when formatting the confidence range.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

/// Rupee sign.
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

impl ServiceConfig {
    pub fn new<P: Into<PathBuf>>(artifact_path: P) -> Self {
        Self {
            artifact_path: artifact_path.into(),
            currency_symbol: default_currency_symbol(),
        }
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_training_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.forest.n_estimators, 350);
        assert_eq!(config.forest.max_depth, 18);
        assert_eq!(config.seed, 42);
        assert_eq!(config.min_rows, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "seed": 7, "forest": {{ "n_estimators": 10 }} }}"#).unwrap();

        let config = TrainingConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.forest.n_estimators, 10);
        assert_eq!(config.forest.max_depth, 18);
        assert_eq!(config.bounds, FilterBounds::default());
    }

    #[test]
    fn test_invalid_test_ratio_rejected() {
        let config = TrainingConfig {
            test_ratio: 1.5,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PredictorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_service_config_currency() {
        let config = ServiceConfig::new("model.bin");
        assert_eq!(config.currency_symbol, "₹");
        let config = config.with_currency_symbol("Rs ");
        assert_eq!(config.currency_symbol, "Rs ");
    }
}
