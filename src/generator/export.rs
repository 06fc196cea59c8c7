//! DPO record format and per-group statistics over generated pairs

use crate::types::{PreferencePair, PreferenceSource, Rule, TraceContext};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Record type written for synthetic (batch generated) pairs
pub const BATCH_IMPORT: &str = "batch_import";

/// Record type written for pairs observed from live suggestions
pub const AUTO_SUGGESTION: &str = "auto_suggestion";

/// One line of a DPO training file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DpoExample {
    pub input: TraceContext,
    pub preferred: Rule,
    pub rejected: Rule,
    /// "synthetic" for generated pairs, otherwise the pair's own source
    pub source: String,
    #[serde(rename = "type")]
    pub example_type: String,
    pub synthetic: bool,
    /// Strategy or feedback channel that produced the pair
    pub strategy: PreferenceSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_group: Option<String>,
}

impl DpoExample {
    pub fn from_pair(pair: &PreferencePair, include_weight: bool, include_grouping: bool) -> Self {
        let (source, example_type) = if pair.synthetic {
            ("synthetic".to_string(), BATCH_IMPORT)
        } else {
            (pair.source.to_string(), AUTO_SUGGESTION)
        };
        let group = |label: &Option<String>| {
            if include_grouping {
                label.clone()
            } else {
                None
            }
        };

        Self {
            input: pair.trace_context.clone().unwrap_or_default(),
            preferred: pair.preferred.clone(),
            rejected: pair.rejected.clone(),
            source,
            example_type: example_type.to_string(),
            synthetic: pair.synthetic,
            strategy: pair.source,
            weight: include_weight.then_some(pair.weight),
            dimension_group: group(&pair.dimension_group),
            platform_group: group(&pair.platform_group),
            artifact_group: group(&pair.artifact_group),
        }
    }
}

/// Format pairs for DPO training
///
/// Weights are emitted for synthetic pairs only, and only when requested.
pub fn format_for_dpo(
    pairs: &[PreferencePair],
    include_weights: bool,
    include_grouping: bool,
) -> Vec<DpoExample> {
    pairs
        .iter()
        .map(|pair| {
            DpoExample::from_pair(pair, include_weights && pair.synthetic, include_grouping)
        })
        .collect()
}

/// Counts and labels for one group of pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub count: usize,
    pub sources: BTreeMap<PreferenceSource, usize>,
    pub dimensions: BTreeSet<String>,
    pub platforms: BTreeSet<String>,
    pub artifacts: BTreeSet<String>,
}

/// Statistics per group key
///
/// The key joins whichever group labels the pair carries; pairs without
/// labels fall under "ungrouped".
pub fn group_statistics(pairs: &[PreferencePair]) -> BTreeMap<String, GroupStats> {
    let mut stats: BTreeMap<String, GroupStats> = BTreeMap::new();

    for pair in pairs {
        let labels: Vec<&str> = [&pair.dimension_group, &pair.platform_group, &pair.artifact_group]
            .into_iter()
            .filter_map(|label| label.as_deref())
            .collect();
        let key = if labels.is_empty() {
            "ungrouped".to_string()
        } else {
            labels.join(":")
        };

        let entry = stats.entry(key).or_default();
        entry.count += 1;
        *entry.sources.entry(pair.source).or_default() += 1;
        if let Some(d) = &pair.dimension_group {
            entry.dimensions.insert(d.clone());
        }
        if let Some(p) = &pair.platform_group {
            entry.platforms.insert(p.clone());
        }
        if let Some(a) = &pair.artifact_group {
            entry.artifacts.insert(a.clone());
        }
    }
    stats
}
