//! Synthetic preference generation
//!
//! Turns a pool of candidate rules (with no user feedback) into preference
//! pairs. The pool is partitioned by design dimension, platform and artifact
//! type, and six heuristics run inside each partition:
//!
//! 1. confidence: high-confidence rules over low-confidence rules
//! 2. quality: well-formed, grounded rules over thin ones
//! 3. completeness: full platform context over partial or missing
//! 4. novelty: novel patterns over near-duplicates
//! 5. frequency: common patterns over rare ones
//! 6. constitutional: iteration-aware, purposeful rules (boosted weight)
//!
//! Pairs are deduplicated on the ordered (preferred, rejected) id pair; the
//! first pair generated for a key wins.
//!
//! Pair generation holds a read lock on the shared classifier for the
//! duration of the partitioning step only.

pub mod export;
pub mod grouping;
pub mod scoring;
pub mod strategies;

use crate::classifier::{CalibrationSummary, SharedClassifier};
use crate::error::Result;
use crate::types::{PreferencePair, Rule, TraceBatch, TraceContext};
use grouping::{partition, GroupingMode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use strategies::Strategy;
use tracing::{debug, info};

pub use export::{format_for_dpo, group_statistics, DpoExample, GroupStats};

/// Thresholds, weights and grouping switches for the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub confidence_threshold_high: f64,
    pub confidence_threshold_low: f64,
    /// Novelty needed for the quality score's novelty bonus
    pub min_novelty_score: f64,
    /// Weight of every synthetic pair (constitutional pairs get a boost)
    pub synthetic_weight: f64,
    pub group_by_dimension: bool,
    pub group_by_platform: bool,
    pub group_by_artifact: bool,
    /// Strategy names run by default; unknown names are ignored
    pub strategies: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold_high: 0.7,
            confidence_threshold_low: 0.4,
            min_novelty_score: 0.3,
            synthetic_weight: 0.3,
            group_by_dimension: true,
            group_by_platform: true,
            group_by_artifact: true,
            strategies: Strategy::ALL.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GeneratorConfig {
    pub fn grouping(&self) -> GroupingMode {
        GroupingMode {
            by_dimension: self.group_by_dimension,
            by_platform: self.group_by_platform,
            by_artifact: self.group_by_artifact,
        }
    }

    /// Disable all grouping: the whole pool is one group
    pub fn ungrouped(mut self) -> Self {
        self.group_by_dimension = false;
        self.group_by_platform = false;
        self.group_by_artifact = false;
        self
    }
}

/// Keep the first pair for every (preferred, rejected) id pair
pub fn deduplicate_pairs(pairs: Vec<PreferencePair>) -> Vec<PreferencePair> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    pairs
        .into_iter()
        .filter(|pair| {
            seen.insert((
                pair.preferred.rule_id.clone(),
                pair.rejected.rule_id.clone(),
            ))
        })
        .collect()
}

/// Generates synthetic preference pairs from rule pools
#[derive(Debug, Clone)]
pub struct SyntheticPreferenceGenerator {
    config: GeneratorConfig,
    default_strategies: Vec<Strategy>,
    classifier: SharedClassifier,
}

impl SyntheticPreferenceGenerator {
    pub fn new(config: GeneratorConfig, classifier: SharedClassifier) -> Self {
        let default_strategies = Strategy::parse_list(&config.strategies);
        Self {
            config,
            default_strategies,
            classifier,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn classifier(&self) -> &SharedClassifier {
        &self.classifier
    }

    /// Generate deduplicated pairs from one rule pool
    ///
    /// `strategies` defaults to the configured strategy list.
    pub fn generate_preferences(
        &self,
        rules: &[Rule],
        trace_context: Option<&TraceContext>,
        strategies: Option<&[Strategy]>,
    ) -> Result<Vec<PreferencePair>> {
        let strategies = strategies.unwrap_or(&self.default_strategies);

        let groups = {
            let classifier = self.classifier.read()?;
            partition(rules, &classifier, self.config.grouping())
        };
        debug!("Partitioned {} rules into {} groups", rules.len(), groups.len());

        let mut pairs = Vec::new();
        for group in &groups {
            let key = group.labels.key();
            if group.rules.len() < 2 {
                debug!("Skipping group {} with {} rule(s)", key, group.rules.len());
                continue;
            }

            for strategy in Strategy::ALL.iter().filter(|s| strategies.contains(s)) {
                let (preferred, rejected) = strategy.split(&group.rules, &self.config);
                let weight = strategy.weight(self.config.synthetic_weight);
                let before = pairs.len();

                for p in &preferred {
                    for r in &rejected {
                        if p.rule_id == r.rule_id {
                            continue;
                        }
                        pairs.push(PreferencePair {
                            preferred: (*p).clone(),
                            rejected: (*r).clone(),
                            source: strategy.source(),
                            synthetic: true,
                            weight,
                            trace_context: trace_context.cloned(),
                            dimension_group: group.labels.dimension.clone(),
                            platform_group: group.labels.platform.clone(),
                            artifact_group: group.labels.artifact.clone(),
                        });
                    }
                }

                debug!(
                    "Group {}: {} {} pairs",
                    key,
                    pairs.len() - before,
                    strategy
                );
            }
        }

        let generated = pairs.len();
        let pairs = deduplicate_pairs(pairs);
        debug!(
            "Generated {} pairs ({} after deduplication)",
            generated,
            pairs.len()
        );
        Ok(pairs)
    }

    /// Generate pairs for each trace in order, tagging them with the trace id
    pub fn generate_from_trace_batch(
        &self,
        batches: &[TraceBatch],
        strategies: Option<&[Strategy]>,
    ) -> Result<Vec<PreferencePair>> {
        let mut all_pairs = Vec::new();
        for batch in batches {
            let context = TraceContext::for_trace(batch.trace_id.clone());
            let pairs = self.generate_preferences(&batch.rules, Some(&context), strategies)?;
            all_pairs.extend(pairs);
        }
        info!(
            "Generated {} synthetic pairs from {} traces",
            all_pairs.len(),
            batches.len()
        );
        Ok(all_pairs)
    }

    /// Seed classifier keywords from rules with a dimension and platform context
    pub fn learn_keywords_from_rules(&self, rules: &[Rule]) -> Result<usize> {
        let labelled: Vec<Rule> = rules
            .iter()
            .filter(|r| r.design_dimension.is_some() && r.platform_context.is_some())
            .cloned()
            .collect();
        self.classifier.learn_from_rules(&labelled)
    }

    pub fn calibrate_keywords(&self, rules: &[Rule]) -> Result<CalibrationSummary> {
        self.classifier.calibrate(rules)
    }

    pub fn update_keyword_rewards(&self, min_accuracy: f64) -> Result<()> {
        self.classifier.update_rewards(min_accuracy)
    }

    pub fn platform_keywords(
        &self,
        platform: &str,
        dimension: Option<&str>,
    ) -> Result<BTreeMap<String, BTreeMap<String, f64>>> {
        Ok(self.classifier.read()?.platform_keywords(platform, dimension))
    }

    pub fn save_learned_keywords(&self, path: &Path) -> Result<()> {
        self.classifier.save(path)
    }

    pub fn load_learned_keywords(&self, path: &Path) -> Result<()> {
        self.classifier.load(path)
    }
}
