//! Dataset statistics command

use super::helpers::{ensure_exists, print_json};
use anyhow::{Context, Result};
use designpref_core::{
    dataset::loader::read_jsonl_lenient,
    metrics::{preference_quality, rule_quality},
    DpoExample, Rule,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;

/// Handle `stats`
///
/// Reports preference quality over the pairs and rule quality over the
/// distinct rules they reference.
pub fn handle(pairs: &Path) -> Result<()> {
    ensure_exists(pairs, "Pairs file")?;
    let examples: Vec<DpoExample> = read_jsonl_lenient(pairs)
        .with_context(|| format!("Failed to read pairs from {}", pairs.display()))?;

    let mut rules: BTreeMap<&str, &Rule> = BTreeMap::new();
    for example in &examples {
        for rule in [&example.preferred, &example.rejected] {
            rules.entry(rule.rule_id.as_str()).or_insert(rule);
        }
    }
    let rules: Vec<Rule> = rules.into_values().cloned().collect();

    print_json(&json!({
        "file": pairs.display().to_string(),
        "preferences": preference_quality(&examples),
        "rules": rule_quality(&rules),
    }))
}
