//! Synthetic preference generation command

use super::helpers::{ensure_exists, split_names, GlobalArgs};
use anyhow::{Context, Result};
use designpref_core::{
    dataset::{loader, write_jsonl},
    format_for_dpo, group_statistics, Strategy, SyntheticPreferenceGenerator,
};
use std::path::Path;
use tracing::info;

/// Handle `generate`
pub fn handle(
    global: &GlobalArgs,
    rules: &Path,
    output: &Path,
    strategies: Option<&str>,
    no_grouping: bool,
) -> Result<()> {
    ensure_exists(rules, "Rules file")?;
    let config = global.load_config()?;
    let (classifier, _) = global.open_classifier(&config)?;

    let mut generator_config = config.generator.clone();
    if no_grouping {
        generator_config = generator_config.ungrouped();
    }
    let generator = SyntheticPreferenceGenerator::new(generator_config, classifier);

    let requested = strategies.map(|list| Strategy::parse_list(&split_names(list)));
    if requested.as_ref().is_some_and(|s| s.is_empty()) {
        anyhow::bail!("No known strategies in '{}'", strategies.unwrap_or_default());
    }

    let batches = loader::load_rule_batches(rules)
        .with_context(|| format!("Failed to read rules from {}", rules.display()))?;
    let pairs = generator.generate_from_trace_batch(&batches, requested.as_deref())?;

    let examples = format_for_dpo(&pairs, true, !no_grouping);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_jsonl(output, &examples)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Wrote {} preference pairs to {}", examples.len(), output.display());
    println!("Generated {} preference pairs", examples.len());
    for (group, stats) in group_statistics(&pairs) {
        println!("  {}: {}", group, stats.count);
    }
    Ok(())
}
