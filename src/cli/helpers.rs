//! Shared helpers for CLI commands

use anyhow::{Context, Result};
use designpref_core::{types::Rule, PipelineConfig, SharedClassifier, TraceBatch};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Global options every command sees
pub struct GlobalArgs {
    pub config: Option<PathBuf>,
    pub keywords: Option<PathBuf>,
}

impl GlobalArgs {
    pub fn load_config(&self) -> Result<PipelineConfig> {
        PipelineConfig::load(self.config.as_deref()).context("Failed to load configuration")
    }

    pub fn keyword_store(&self, config: &PipelineConfig) -> PathBuf {
        config.keyword_store_path(self.keywords.as_deref())
    }

    /// Classifier seeded from the keyword store (fresh if the store is absent)
    pub fn open_classifier(&self, config: &PipelineConfig) -> Result<(SharedClassifier, PathBuf)> {
        let store = self.keyword_store(config);
        debug!("Using keyword store {}", store.display());
        let classifier = SharedClassifier::load_from(&store)
            .with_context(|| format!("Failed to load keyword store {}", store.display()))?;
        Ok((classifier, store))
    }
}

/// All rules across batches, in input order
pub fn flatten_rules(batches: &[TraceBatch]) -> Vec<Rule> {
    batches.iter().flat_map(|b| b.rules.iter().cloned()).collect()
}

/// Comma-separated strategy names, trimmed
pub fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

pub fn ensure_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("{} not found: {}", what, path.display());
    }
    Ok(())
}
