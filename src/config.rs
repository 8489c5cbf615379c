//! Evaluation configuration.
//!
//! Settings shared by the CLI and library callers: the probability sum
//! tolerance used by the diversity accumulator, the default batch size, and
//! the default OOD dataset identifier. Values come from defaults, an optional
//! YAML file, and environment variable overrides, in that order.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::datasets::OodPair;
use crate::metrics::{AveragePairwiseDiversity, DEFAULT_SUM_TOLERANCE};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid YAML.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration for an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Allowed deviation of each probability vector's sum from 1.
    pub sum_tolerance: f64,
    /// Examples per batch fed to the diversity accumulator.
    pub batch_size: usize,
    /// Registry identifier of the OOD dataset to evaluate.
    pub dataset: String,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            sum_tolerance: DEFAULT_SUM_TOLERANCE,
            batch_size: 256,
            dataset: OodPair::Cifar10VsCifar100.name().to_string(),
        }
    }
}

impl EvalConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a YAML file; missing keys take their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Creates configuration from environment variables over the defaults.
    ///
    /// # Environment Variables
    ///
    /// - `ROBUSTNESS_SUM_TOLERANCE`: Probability sum tolerance (default: 0.001)
    /// - `ROBUSTNESS_BATCH_SIZE`: Diversity batch size (default: 256)
    /// - `ROBUSTNESS_DATASET`: OOD dataset identifier (default: cifar10_vs_cifar100)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Overrides fields from environment variables.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Overrides fields from any key lookup, then validates.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("ROBUSTNESS_SUM_TOLERANCE") {
            self.sum_tolerance = parse_env_value(&val, "ROBUSTNESS_SUM_TOLERANCE")?;
        }

        if let Some(val) = lookup("ROBUSTNESS_BATCH_SIZE") {
            self.batch_size = parse_env_value(&val, "ROBUSTNESS_BATCH_SIZE")?;
        }

        if let Some(val) = lookup("ROBUSTNESS_DATASET") {
            self.dataset = val;
        }

        self.validate()?;
        Ok(self)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sum_tolerance > 0.0 && self.sum_tolerance < 1.0) {
            return Err(ConfigError::InvalidValue {
                key: "sum_tolerance".to_string(),
                message: "must be between 0.0 and 1.0 (exclusive)".to_string(),
            });
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "batch_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        self.ood_pair()?;
        Ok(())
    }

    /// The configured dataset as a registry entry.
    pub fn ood_pair(&self) -> Result<OodPair, ConfigError> {
        self.dataset
            .parse::<OodPair>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "dataset".to_string(),
                message: e.to_string(),
            })
    }

    /// An empty diversity accumulator using this configuration's tolerance.
    pub fn diversity_accumulator(&self) -> AveragePairwiseDiversity {
        AveragePairwiseDiversity::new().with_sum_tolerance(self.sum_tolerance)
    }

    /// Builder method to set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder method to set the sum tolerance.
    pub fn with_sum_tolerance(mut self, tolerance: f64) -> Self {
        self.sum_tolerance = tolerance;
        self
    }
}

/// Parse a string value into the target type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = EvalConfig::default();
        assert!((config.sum_tolerance - 1e-3).abs() < f64::EPSILON);
        assert_eq!(config.batch_size, 256);
        assert_eq!(config.dataset, "cifar10_vs_cifar100");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = EvalConfig::new()
            .apply_overrides(lookup_from(&[
                ("ROBUSTNESS_BATCH_SIZE", "32"),
                ("ROBUSTNESS_DATASET", "cifar100_vs_cifar10"),
            ]))
            .expect("valid overrides");
        assert_eq!(config.batch_size, 32);
        assert_eq!(
            config.ood_pair().expect("registered"),
            OodPair::Cifar100VsCifar10
        );
    }

    #[test]
    fn test_unparseable_override() {
        let err = EvalConfig::new()
            .apply_overrides(lookup_from(&[("ROBUSTNESS_SUM_TOLERANCE", "tight")]))
            .expect_err("not a number");
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "ROBUSTNESS_SUM_TOLERANCE"));
    }

    #[test]
    fn test_validation_failures() {
        assert!(EvalConfig::new().with_batch_size(0).validate().is_err());
        assert!(EvalConfig::new().with_sum_tolerance(0.0).validate().is_err());

        let mut config = EvalConfig::new();
        config.dataset = "svhn_vs_cifar10".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_yaml_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "batch_size: 64").expect("write");

        let config = EvalConfig::from_yaml_file(file.path()).expect("valid yaml");
        assert_eq!(config.batch_size, 64);
        assert_eq!(config.dataset, "cifar10_vs_cifar100");
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let err = EvalConfig::from_yaml_file("/nonexistent/robustness.yaml")
            .expect_err("file does not exist");
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_diversity_accumulator_uses_tolerance() {
        let config = EvalConfig::new().with_sum_tolerance(0.5);
        let mut diversity = config.diversity_accumulator();
        let probs = ndarray::Array3::from_elem((2, 1, 2), 0.4);
        assert!(diversity.add_batch(probs.view(), 2).is_ok());
    }
}
