//! Learned keyword commands

use super::helpers::{ensure_exists, flatten_rules, print_json, GlobalArgs};
use anyhow::{Context, Result};
use designpref_core::{dataset::loader, GeneratorConfig, SyntheticPreferenceGenerator};
use serde_json::json;
use std::path::Path;
use tracing::info;

/// Handle `keywords learn`
///
/// Seeds keywords from labelled rules, scores them against the same rules and
/// persists the updated store.
pub fn learn(global: &GlobalArgs, rules: &Path) -> Result<()> {
    ensure_exists(rules, "Rules file")?;
    let config = global.load_config()?;
    let (classifier, store) = global.open_classifier(&config)?;
    let generator = SyntheticPreferenceGenerator::new(GeneratorConfig::default(), classifier);

    let batches = loader::load_rule_batches(rules)
        .with_context(|| format!("Failed to read rules from {}", rules.display()))?;
    let all_rules = flatten_rules(&batches);

    let learned = generator.learn_keywords_from_rules(&all_rules)?;
    let calibration = generator.calibrate_keywords(&all_rules)?;
    generator.update_keyword_rewards(config.classifier.min_accuracy)?;
    generator
        .save_learned_keywords(&store)
        .with_context(|| format!("Failed to save keyword store {}", store.display()))?;

    info!("Saved keyword store to {}", store.display());
    println!(
        "Learned {} keywords; calibration {}/{} correct",
        learned, calibration.correct, calibration.evaluated
    );
    Ok(())
}

/// Handle `keywords show`
///
/// Prints learned keywords with their rewards and the effective keyword
/// lists the classifier matches against on this platform.
pub fn show(global: &GlobalArgs, platform: &str, dimension: Option<&str>) -> Result<()> {
    let config = global.load_config()?;
    let (classifier, _) = global.open_classifier(&config)?;
    let guard = classifier.read()?;

    let mut effective = guard.all_keywords(Some(platform));
    if let Some(dim) = dimension {
        effective.retain(|name, _| name == dim);
    }
    print_json(&json!({
        "platform": platform,
        "learned": guard.platform_keywords(platform, dimension),
        "effective": effective,
    }))
}
