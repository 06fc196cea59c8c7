//! Line-delimited JSON loaders and snapshot sources
//!
//! Bulk loaders skip malformed lines: each bad line is logged with its
//! 1-based line number and loading continues.

use crate::error::{DesignPrefError, Result};
use crate::types::{PreferenceEvent, Rule, RuleRecord, TraceBatch};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Index file written alongside snapshot directories
const SNAPSHOT_INDEX_FILE: &str = "_index.json";

/// Parse every non-blank line of `path`, skipping lines that fail
pub fn read_jsonl_lenient<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)?;
    let mut records = Vec::new();
    let mut skipped = 0;

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                warn!(
                    "{}",
                    DesignPrefError::Parse {
                        line: idx + 1,
                        message: format!("{}: {}", path.display(), e),
                    }
                );
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} malformed lines in {}", skipped, path.display());
    }
    Ok(records)
}

#[derive(Debug, Deserialize)]
struct RuleBatchLine {
    #[serde(default)]
    trace_id: Option<String>,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default)]
    intent_rules: Vec<RuleRecord>,
}

impl RuleBatchLine {
    fn trace_id(&self) -> String {
        self.trace_id
            .clone()
            .or_else(|| {
                self.metadata
                    .as_ref()
                    .and_then(|m| m.get("batch_id"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Convert boundary records into typed rules, dropping invalid ones
pub fn typed_rules(records: Vec<RuleRecord>) -> Vec<Rule> {
    records
        .into_iter()
        .filter_map(|record| match Rule::try_from(record) {
            Ok(rule) => Some(rule),
            Err(e) => {
                warn!("Skipping rule: {}", e);
                None
            }
        })
        .collect()
}

/// Load rule batches, one `{trace_id, intent_rules}` record per line
pub fn load_rule_batches(path: &Path) -> Result<Vec<TraceBatch>> {
    let lines: Vec<RuleBatchLine> = read_jsonl_lenient(path)?;
    let batches: Vec<TraceBatch> = lines
        .into_iter()
        .map(|line| TraceBatch {
            trace_id: line.trace_id(),
            rules: typed_rules(line.intent_rules),
        })
        .collect();

    info!(
        "Loaded {} rules in {} batches from {}",
        batches.iter().map(|b| b.rules.len()).sum::<usize>(),
        batches.len(),
        path.display()
    );
    Ok(batches)
}

/// Load preference events, one per line
pub fn load_events(path: &Path) -> Result<Vec<PreferenceEvent>> {
    let events: Vec<PreferenceEvent> = read_jsonl_lenient(path)?;
    info!("Loaded {} preference events from {}", events.len(), path.display());
    Ok(events)
}

/// Snapshot id recorded in a snapshot's metadata
pub fn snapshot_id(snapshot: &Value) -> Option<&str> {
    snapshot
        .pointer("/metadata/snapshot_id")
        .and_then(Value::as_str)
}

/// One place snapshots can be loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// Directory of `*.json` snapshot files, scanned recursively
    Directory(PathBuf),
    /// One snapshot per line
    JsonLines(PathBuf),
}

impl SnapshotSource {
    /// Directory or JSONL file, by what exists at `path`
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            SnapshotSource::Directory(path)
        } else {
            SnapshotSource::JsonLines(path)
        }
    }

    /// snapshot_id -> snapshot
    pub fn load(&self) -> Result<HashMap<String, Value>> {
        let mut snapshots = HashMap::new();
        match self {
            SnapshotSource::Directory(dir) => {
                if !dir.is_dir() {
                    return Err(DesignPrefError::Other(format!(
                        "Snapshot directory not found: {}",
                        dir.display()
                    )));
                }
                scan_snapshot_dir(dir, &mut snapshots)?;
            }
            SnapshotSource::JsonLines(path) => {
                for snapshot in read_jsonl_lenient::<Value>(path)? {
                    if let Some(id) = snapshot_id(&snapshot).map(str::to_string) {
                        snapshots.insert(id, snapshot);
                    }
                }
            }
        }
        Ok(snapshots)
    }
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotSource::Directory(p) => write!(f, "directory {}", p.display()),
            SnapshotSource::JsonLines(p) => write!(f, "jsonl {}", p.display()),
        }
    }
}

fn scan_snapshot_dir(dir: &Path, snapshots: &mut HashMap<String, Value>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| {
        DesignPrefError::Other(format!("Failed to read directory {:?}: {}", dir, e))
    })?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            scan_snapshot_dir(&path, snapshots)?;
            continue;
        }
        let is_json = path.extension().and_then(|s| s.to_str()) == Some("json");
        let is_index = path.file_name().and_then(|s| s.to_str()) == Some(SNAPSHOT_INDEX_FILE);
        if !is_json || is_index {
            continue;
        }

        let parsed = fs::read_to_string(&path)
            .map_err(DesignPrefError::from)
            .and_then(|content| Ok(serde_json::from_str::<Value>(&content)?));
        match parsed {
            Ok(snapshot) => {
                if let Some(id) = snapshot_id(&snapshot).map(str::to_string) {
                    snapshots.insert(id, snapshot);
                }
            }
            Err(e) => warn!("Skipping snapshot {}: {}", path.display(), e),
        }
    }
    Ok(())
}

/// Try each source in order; the first successful, non-empty load wins
pub fn load_snapshots(sources: &[SnapshotSource]) -> HashMap<String, Value> {
    for source in sources {
        match source.load() {
            Ok(snapshots) if !snapshots.is_empty() => {
                info!("Loaded {} snapshots from {}", snapshots.len(), source);
                return snapshots;
            }
            Ok(_) => debug!("No snapshots in {}, trying next source", source),
            Err(e) => warn!("Failed to load snapshots from {}: {}", source, e),
        }
    }
    warn!("No snapshots loaded from {} source(s)", sources.len());
    HashMap::new()
}
