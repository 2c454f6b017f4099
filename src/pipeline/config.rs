//! Curation run configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `CURATE_*` environment variables. The CLI applies its flags last and calls
//! [`CurationConfig::validate`] before running anything.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::categories::RuleSet;
use crate::diversity::{ClusterConfig, SamplingStrategy};
use crate::patterns::{MinerConfig, MAX_ITEMSET_LEN};
use crate::quality::{HeuristicWeights, DEFAULT_MIN_APPLICATION_AREAS, DEFAULT_MIN_TOTAL_TOKENS};

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// The configuration file is not valid YAML for this schema.
    #[error("Invalid configuration file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for a curation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    // Sampling
    /// Number of records in the curated subset.
    pub target_size: usize,
    pub strategy: SamplingStrategy,
    /// Seed shared by every randomized stage.
    pub seed: u64,

    // Quality
    pub min_total_tokens: u32,
    pub min_application_areas: usize,
    pub caption_min_chars: usize,
    pub caption_max_chars: usize,
    pub sample_weights: HeuristicWeights,

    // Text
    /// Keywords kept per caption.
    pub max_keywords: usize,

    // Analysis stages
    pub mining: MinerConfig,
    pub clustering: ClusterConfig,
    pub categories: RuleSet,
    pub themes: RuleSet,

    /// Score and extract with rayon.
    pub parallel: bool,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            target_size: 50_000,
            strategy: SamplingStrategy::Cluster,
            seed: 42,

            min_total_tokens: DEFAULT_MIN_TOTAL_TOKENS,
            min_application_areas: DEFAULT_MIN_APPLICATION_AREAS,
            caption_min_chars: 20,
            caption_max_chars: 2000,
            sample_weights: HeuristicWeights::default(),

            max_keywords: 20,

            mining: MinerConfig::default(),
            clustering: ClusterConfig::default(),
            categories: RuleSet::default_categories(),
            themes: RuleSet::default_themes(),

            parallel: true,
        }
    }
}

impl CurationConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a YAML file; missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Defaults overridden by the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides fields from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CURATE_TARGET_SIZE`: Curated subset size (default: 50000)
    /// - `CURATE_SEED`: Random seed (default: 42)
    /// - `CURATE_N_CLUSTERS`: Number of k-means clusters (default: 15)
    /// - `CURATE_MIN_TOTAL_TOKENS`: Minimum tokens to pass (default: 50)
    /// - `CURATE_MIN_APPLICATION_AREAS`: Minimum application areas to pass (default: 5)
    /// - `CURATE_PARALLEL`: Parallel scoring (default: true)
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(val) = lookup("CURATE_TARGET_SIZE") {
            self.target_size = parse_env_value(&val, "CURATE_TARGET_SIZE")?;
        }

        if let Some(val) = lookup("CURATE_SEED") {
            self.seed = parse_env_value(&val, "CURATE_SEED")?;
        }

        if let Some(val) = lookup("CURATE_N_CLUSTERS") {
            self.clustering.n_clusters = parse_env_value(&val, "CURATE_N_CLUSTERS")?;
        }

        if let Some(val) = lookup("CURATE_MIN_TOTAL_TOKENS") {
            self.min_total_tokens = parse_env_value(&val, "CURATE_MIN_TOTAL_TOKENS")?;
        }

        if let Some(val) = lookup("CURATE_MIN_APPLICATION_AREAS") {
            self.min_application_areas = parse_env_value(&val, "CURATE_MIN_APPLICATION_AREAS")?;
        }

        if let Some(val) = lookup("CURATE_PARALLEL") {
            self.parallel = parse_env_bool(&val, "CURATE_PARALLEL")?;
        }

        Ok(())
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "target_size must be greater than 0".to_string(),
            ));
        }

        if self.max_keywords == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_keywords must be greater than 0".to_string(),
            ));
        }

        if self.caption_min_chars > self.caption_max_chars {
            return Err(ConfigError::ValidationFailed(
                "caption_min_chars cannot exceed caption_max_chars".to_string(),
            ));
        }

        // Mining
        if !(0.0..=1.0).contains(&self.mining.min_support) || self.mining.min_support == 0.0 {
            return Err(ConfigError::ValidationFailed(
                "mining.min_support must be in (0.0, 1.0]".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.mining.min_confidence) {
            return Err(ConfigError::ValidationFailed(
                "mining.min_confidence must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !(2..=MAX_ITEMSET_LEN).contains(&self.mining.max_itemset_len) {
            return Err(ConfigError::ValidationFailed(format!(
                "mining.max_itemset_len must be between 2 and {MAX_ITEMSET_LEN}"
            )));
        }

        if !(0.0..=1.0).contains(&self.mining.min_edge_fraction) {
            return Err(ConfigError::ValidationFailed(
                "mining.min_edge_fraction must be between 0.0 and 1.0".to_string(),
            ));
        }

        // Clustering
        if self.clustering.n_clusters == 0 {
            return Err(ConfigError::ValidationFailed(
                "clustering.n_clusters must be greater than 0".to_string(),
            ));
        }

        if self.clustering.batch_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "clustering.batch_size must be greater than 0".to_string(),
            ));
        }

        if self.clustering.n_init == 0 {
            return Err(ConfigError::ValidationFailed(
                "clustering.n_init must be greater than 0".to_string(),
            ));
        }

        if self.clustering.max_features == 0 {
            return Err(ConfigError::ValidationFailed(
                "clustering.max_features must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.clustering.max_df) || self.clustering.max_df == 0.0 {
            return Err(ConfigError::ValidationFailed(
                "clustering.max_df must be in (0.0, 1.0]".to_string(),
            ));
        }

        if self.categories.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "categories cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set the target size.
    pub fn with_target_size(mut self, target_size: usize) -> Self {
        self.target_size = target_size;
        self
    }

    /// Builder method to set the sampling strategy.
    pub fn with_strategy(mut self, strategy: SamplingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_clusters(mut self, n_clusters: usize) -> Self {
        self.clustering.n_clusters = n_clusters;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = CurationConfig::default();
        assert_eq!(config.target_size, 50_000);
        assert_eq!(config.strategy, SamplingStrategy::Cluster);
        assert_eq!(config.seed, 42);
        assert_eq!(config.min_total_tokens, 50);
        assert_eq!(config.min_application_areas, 5);
        assert_eq!(config.clustering.n_clusters, 15);
        assert_eq!(config.mining.sample_size, 50_000);
        assert!(config.parallel);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "
target_size: 300
strategy: category
clustering:
  n_clusters: 4
mining:
  min_confidence: 0.6
categories:
  - label: sea
    keywords: [ocean, beach]
";
        let config = CurationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.target_size, 300);
        assert_eq!(config.strategy, SamplingStrategy::Category);
        assert_eq!(config.clustering.n_clusters, 4);
        assert_eq!(config.clustering.batch_size, 1000);
        assert!((config.mining.min_confidence - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.mining.top_rules, 50);
        assert_eq!(config.categories.len(), 1);
        assert_eq!(config.themes, RuleSet::default_themes());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(CurationConfig::from_yaml_str("  \n").unwrap(), CurationConfig::default());
    }

    #[test]
    fn test_invalid_yaml() {
        let result = CurationConfig::from_yaml_str("target_size: lots");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curate.yaml");
        std::fs::write(&path, "seed: 7\nparallel: false\n").unwrap();

        let config = CurationConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert!(!config.parallel);

        let missing = CurationConfig::from_yaml_file(&dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CURATE_TARGET_SIZE", "1200"),
            ("CURATE_SEED", "9"),
            ("CURATE_N_CLUSTERS", "8"),
            ("CURATE_MIN_TOTAL_TOKENS", "30"),
            ("CURATE_MIN_APPLICATION_AREAS", "3"),
            ("CURATE_PARALLEL", "off"),
        ]
        .into_iter()
        .collect();

        let mut config = CurationConfig::default();
        config
            .apply_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.target_size, 1200);
        assert_eq!(config.seed, 9);
        assert_eq!(config.clustering.n_clusters, 8);
        assert_eq!(config.min_total_tokens, 30);
        assert_eq!(config.min_application_areas, 3);
        assert!(!config.parallel);
    }

    #[test]
    fn test_env_invalid_value() {
        let mut config = CurationConfig::default();
        let err = config
            .apply_vars(|k| (k == "CURATE_TARGET_SIZE").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("CURATE_TARGET_SIZE"));
    }

    #[test]
    fn test_validation_zero_target() {
        let result = CurationConfig::default().with_target_size(0).validate();
        assert!(result.unwrap_err().to_string().contains("target_size"));
    }

    #[test]
    fn test_validation_zero_clusters() {
        let result = CurationConfig::default().with_n_clusters(0).validate();
        assert!(result.unwrap_err().to_string().contains("n_clusters"));
    }

    #[test]
    fn test_validation_out_of_range_support() {
        let mut config = CurationConfig::default();
        config.mining.min_support = 1.5;
        assert!(config.validate().unwrap_err().to_string().contains("min_support"));

        config.mining.min_support = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_itemset_len_bounds() {
        let mut config = CurationConfig::default();
        config.mining.max_itemset_len = MAX_ITEMSET_LEN;
        assert!(config.validate().is_ok());

        config.mining.max_itemset_len = MAX_ITEMSET_LEN + 1;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("max_itemset_len"));

        config.mining.max_itemset_len = 40;
        assert!(config.validate().is_err());

        config.mining.max_itemset_len = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_out_of_range_max_df() {
        let mut config = CurationConfig::default();
        config.clustering.max_df = 2.0;
        assert!(config.validate().unwrap_err().to_string().contains("max_df"));
    }

    #[test]
    fn test_validation_caption_bounds() {
        let mut config = CurationConfig::default();
        config.caption_min_chars = 3000;
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("caption_min_chars"));
    }

    #[test]
    fn test_parse_env_bool() {
        assert!(parse_env_bool("true", "test").unwrap());
        assert!(parse_env_bool("1", "test").unwrap());
        assert!(parse_env_bool("YES", "test").unwrap());
        assert!(!parse_env_bool("false", "test").unwrap());
        assert!(!parse_env_bool("0", "test").unwrap());
        assert!(parse_env_bool("maybe", "test").is_err());
    }
}
