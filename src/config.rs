//! Pipeline configuration
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`)
//! 3. Environment variables: `DESIGNPREF__<SECTION>__<KEY>`, e.g.
//!    `DESIGNPREF__DATASET__SEED=7`

use crate::dataset::DatasetConfig;
use crate::error::{DesignPrefError, Result};
use crate::generator::GeneratorConfig;
use crate::reward::RewardWeights;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the keyword store location
pub const KEYWORDS_ENV: &str = "DESIGNPREF_KEYWORDS";

const SPLIT_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Learned keywords below this accuracy lose reward
    pub min_accuracy: f64,
    pub keyword_store: Option<PathBuf>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_accuracy: 0.6,
            keyword_store: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub reward: RewardWeights,
    pub generator: GeneratorConfig,
    pub dataset: DatasetConfig,
    pub classifier: ClassifierConfig,
}

impl PipelineConfig {
    /// Defaults, then `path` if given, then `DESIGNPREF__*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&PipelineConfig::default())?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix("DESIGNPREF")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(DesignPrefError::ConfigValidation(msg));

        let d = &self.dataset;
        for (name, value) in [
            ("train_split", d.train_split),
            ("val_split", d.val_split),
            ("test_split", d.test_split),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return invalid(format!("dataset.{} must be between 0 and 1, got {}", name, value));
            }
        }
        let sum = d.train_split + d.val_split + d.test_split;
        if (sum - 1.0).abs() > SPLIT_TOLERANCE {
            return invalid(format!("dataset splits must sum to 1.0, got {:.3}", sum));
        }

        let g = &self.generator;
        if g.confidence_threshold_low > g.confidence_threshold_high {
            return invalid(format!(
                "generator.confidence_threshold_low ({}) exceeds confidence_threshold_high ({})",
                g.confidence_threshold_low, g.confidence_threshold_high
            ));
        }
        if !(0.0..=1.0).contains(&g.synthetic_weight) {
            return invalid(format!(
                "generator.synthetic_weight must be between 0 and 1, got {}",
                g.synthetic_weight
            ));
        }

        let r = &self.reward;
        for (name, value) in [
            ("preference_weight", r.preference_weight),
            ("change_weight", r.change_weight),
            ("temporal_weight", r.temporal_weight),
        ] {
            if value < 0.0 {
                return invalid(format!("reward.{} must not be negative, got {}", name, value));
            }
        }

        Ok(())
    }

    /// Keyword store path: flag, then `DESIGNPREF_KEYWORDS`, then config,
    /// then the per-user data directory
    pub fn keyword_store_path(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| std::env::var_os(KEYWORDS_ENV).map(PathBuf::from))
            .or_else(|| self.classifier.keyword_store.clone())
            .unwrap_or_else(default_keyword_store)
    }
}

/// `<data_local_dir>/designpref/keywords.json`
pub fn default_keyword_store() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("designpref")
        .join("keywords.json")
}
