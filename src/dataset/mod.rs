//! Training dataset assembly
//!
//! Real pairs (derived from logged interactions) and synthetic pairs are
//! merged, deduplicated with real pairs taking precedence, optionally
//! shuffled with a seeded RNG, split into train/val/test and written as
//! line-delimited JSON next to a `metadata.json` summary.

pub mod loader;

use crate::error::Result;
use crate::generator::{deduplicate_pairs, DpoExample, SyntheticPreferenceGenerator};
use crate::types::{
    PreferenceEvent, PreferencePair, PreferenceSource, Rule, TraceBatch, TraceContext,
    UserResponse,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Platform assumed for events that do not record one
pub const DEFAULT_PLATFORM: &str = "figma";

/// Split ratios and merge options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub train_split: f64,
    pub val_split: f64,
    pub test_split: f64,
    pub shuffle: bool,
    pub seed: u64,
    /// Maximum number of rules fed to the synthetic generator
    pub synthetic_limit: Option<usize>,
    pub include_synthetic: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            train_split: 0.8,
            val_split: 0.1,
            test_split: 0.1,
            shuffle: true,
            seed: 42,
            synthetic_limit: Some(1000),
            include_synthetic: true,
        }
    }
}

/// Train/val/test partitions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSplit {
    pub train: Vec<DpoExample>,
    pub val: Vec<DpoExample>,
    pub test: Vec<DpoExample>,
}

/// Summary written to `metadata.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub total_pairs: usize,
    pub real_pairs: usize,
    pub synthetic_pairs: usize,
    pub train_count: usize,
    pub val_count: usize,
    pub test_count: usize,
    pub train_split: f64,
    pub val_split: f64,
    pub test_split: f64,
}

/// Input context recorded for a real pair
fn event_input(event: &PreferenceEvent, snapshot: &Value) -> TraceContext {
    let trace = &event.trace_context;
    let mut input = TraceContext {
        user_intent: trace.user_intent.clone(),
        component_id: trace.component_id.clone(),
        platform: Some(
            trace
                .platform
                .clone()
                .unwrap_or_else(|| DEFAULT_PLATFORM.to_string()),
        ),
        ..Default::default()
    };
    input
        .extra
        .insert("snapshot_id".to_string(), Value::from(event.snapshot_id.clone()));
    input
        .extra
        .insert("artifact_id".to_string(), Value::from(event.artifact_id.clone()));
    input.extra.insert(
        "component_type".to_string(),
        snapshot
            .pointer("/metadata/artifact_type")
            .cloned()
            .unwrap_or(Value::Null),
    );
    input
}

/// Preference pairs from one logged event
///
/// Accepted (or modified) rules are preferred over every other suggestion;
/// a rejected rule loses to every other suggestion.
fn pairs_from_event(event: &PreferenceEvent, snapshot: &Value) -> Vec<PreferencePair> {
    let response = event.user_action.response;
    let Some(chosen_id) = event.user_action.rule_id.as_deref() else {
        debug!("Event on {} has no chosen rule", event.snapshot_id);
        return Vec::new();
    };

    let rules = loader::typed_rules(event.suggested_rules.clone());
    let Some(chosen) = rules.iter().find(|r| r.rule_id == chosen_id) else {
        warn!(
            "Chosen rule {} not among suggestions for snapshot {}",
            chosen_id, event.snapshot_id
        );
        return Vec::new();
    };

    let input = event_input(event, snapshot);
    let platform = input.platform.clone();
    let others = rules.iter().filter(|r| r.rule_id != chosen_id);

    let make = |preferred: &Rule, rejected: &Rule, labelled: &Rule| PreferencePair {
        preferred: preferred.clone(),
        rejected: rejected.clone(),
        source: PreferenceSource::UserFeedback,
        synthetic: false,
        weight: 1.0,
        trace_context: Some(input.clone()),
        dimension_group: labelled.design_dimension.clone(),
        platform_group: platform.clone(),
        artifact_group: None,
    };

    match response {
        UserResponse::Accepted | UserResponse::Modified => {
            others.map(|other| make(chosen, other, chosen)).collect()
        }
        UserResponse::Rejected => others.map(|other| make(other, chosen, other)).collect(),
        UserResponse::Ignored => Vec::new(),
    }
}

/// Real preference pairs from logged events
///
/// Skips ignored events, events with fewer than two suggestions and events
/// whose snapshot is missing.
pub fn real_pairs_from_events(
    events: &[PreferenceEvent],
    snapshots: &HashMap<String, Value>,
) -> Vec<PreferencePair> {
    let mut pairs = Vec::new();
    let mut missing_snapshots = 0;

    for event in events {
        if event.user_action.response == UserResponse::Ignored || event.suggested_rules.len() < 2 {
            continue;
        }
        let Some(snapshot) = snapshots.get(&event.snapshot_id) else {
            missing_snapshots += 1;
            debug!("Skipping event: snapshot {} not found", event.snapshot_id);
            continue;
        };
        pairs.extend(pairs_from_event(event, snapshot));
    }

    if missing_snapshots > 0 {
        warn!("Skipped {} events with missing snapshots", missing_snapshots);
    }
    info!(
        "Created {} preference pairs from {} events",
        pairs.len(),
        events.len()
    );
    pairs
}

/// Write one JSON document per line
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Merges, splits and writes training datasets
#[derive(Debug, Clone, Default)]
pub struct DatasetAssembler {
    config: DatasetConfig,
}

impl DatasetAssembler {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    /// Synthetic pairs over the first `synthetic_limit` rules of all batches
    pub fn synthetic_pairs(
        &self,
        generator: &SyntheticPreferenceGenerator,
        batches: &[TraceBatch],
    ) -> Result<Vec<PreferencePair>> {
        if !self.config.include_synthetic {
            return Ok(Vec::new());
        }
        let limit = self.config.synthetic_limit.unwrap_or(usize::MAX);
        let rules: Vec<Rule> = batches
            .iter()
            .flat_map(|b| b.rules.iter().cloned())
            .take(limit)
            .collect();
        if rules.is_empty() {
            info!("No rules available, skipping synthetic pairs");
            return Ok(Vec::new());
        }
        generator.generate_preferences(&rules, None, None)
    }

    /// Merge real then synthetic pairs and deduplicate, real pairs first
    ///
    /// Returns the DPO records and the number of real records kept.
    pub fn merge(
        &self,
        real: Vec<PreferencePair>,
        synthetic: Vec<PreferencePair>,
    ) -> (Vec<DpoExample>, usize) {
        let mut all = real;
        if self.config.include_synthetic {
            all.extend(synthetic);
        }
        let merged = deduplicate_pairs(all);
        let real_count = merged.iter().filter(|p| !p.synthetic).count();
        let examples = merged
            .iter()
            .map(|pair| DpoExample::from_pair(pair, true, true))
            .collect();
        (examples, real_count)
    }

    /// Shuffle (when enabled) and split by the configured ratios
    pub fn split(&self, mut examples: Vec<DpoExample>) -> DatasetSplit {
        if self.config.shuffle {
            let mut rng = StdRng::seed_from_u64(self.config.seed);
            examples.shuffle(&mut rng);
        }

        let total = examples.len();
        let train_end = ((total as f64 * self.config.train_split) as usize).min(total);
        let val_end = (train_end + (total as f64 * self.config.val_split) as usize).min(total);

        let test = examples.split_off(val_end);
        let val = examples.split_off(train_end);
        debug!(
            "Split {} examples: {} train, {} val, {} test",
            total,
            examples.len(),
            val.len(),
            test.len()
        );
        DatasetSplit {
            train: examples,
            val,
            test,
        }
    }

    /// Merge, split and write `train/val/test.jsonl` plus `metadata.json`
    pub fn export(
        &self,
        real: Vec<PreferencePair>,
        synthetic: Vec<PreferencePair>,
        output_dir: &Path,
    ) -> Result<DatasetMetadata> {
        let (examples, real_count) = self.merge(real, synthetic);
        let total = examples.len();
        if total == 0 {
            warn!("No preference pairs to export");
        }

        let split = self.split(examples);
        fs::create_dir_all(output_dir)?;
        write_jsonl(&output_dir.join("train.jsonl"), &split.train)?;
        write_jsonl(&output_dir.join("val.jsonl"), &split.val)?;
        write_jsonl(&output_dir.join("test.jsonl"), &split.test)?;

        let metadata = DatasetMetadata {
            run_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            total_pairs: total,
            real_pairs: real_count,
            synthetic_pairs: total - real_count,
            train_count: split.train.len(),
            val_count: split.val.len(),
            test_count: split.test.len(),
            train_split: self.config.train_split,
            val_split: self.config.val_split,
            test_split: self.config.test_split,
        };
        fs::write(
            output_dir.join("metadata.json"),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        info!(
            "Exported {} pairs ({} real, {} synthetic) to {}",
            total,
            real_count,
            total - real_count,
            output_dir.display()
        );
        Ok(metadata)
    }
}
