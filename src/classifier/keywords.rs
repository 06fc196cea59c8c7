//! Learned keyword tables keyed by (platform, dimension)
//!
//! Both tables only create an entry on an explicit write. Reads of a missing
//! platform or dimension return `None` and leave the table untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Composite table key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionKey {
    pub platform: String,
    pub dimension: String,
}

impl DimensionKey {
    pub fn new(platform: &str, dimension: &str) -> Self {
        Self {
            platform: platform.to_string(),
            dimension: dimension.to_string(),
        }
    }
}

/// Nested platform -> dimension -> keyword -> value form used on disk
type Nested<V> = BTreeMap<String, BTreeMap<String, BTreeMap<String, V>>>;

fn nest<V: Clone>(entries: &BTreeMap<DimensionKey, BTreeMap<String, V>>) -> Nested<V> {
    let mut nested: Nested<V> = BTreeMap::new();
    for (key, keywords) in entries {
        nested
            .entry(key.platform.clone())
            .or_default()
            .insert(key.dimension.clone(), keywords.clone());
    }
    nested
}

fn flatten<V>(nested: Nested<V>) -> BTreeMap<DimensionKey, BTreeMap<String, V>> {
    let mut entries = BTreeMap::new();
    for (platform, dimensions) in nested {
        for (dimension, keywords) in dimensions {
            entries.insert(
                DimensionKey {
                    platform: platform.clone(),
                    dimension,
                },
                keywords,
            );
        }
    }
    entries
}

/// Keyword -> reward score, per (platform, dimension)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Nested<f64>", into = "Nested<f64>")]
pub struct KeywordTable {
    entries: BTreeMap<DimensionKey, BTreeMap<String, f64>>,
}

impl From<Nested<f64>> for KeywordTable {
    fn from(nested: Nested<f64>) -> Self {
        Self {
            entries: flatten(nested),
        }
    }
}

impl From<KeywordTable> for Nested<f64> {
    fn from(table: KeywordTable) -> Self {
        nest(&table.entries)
    }
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keywords for one (platform, dimension), if any were ever written
    pub fn get(&self, platform: &str, dimension: &str) -> Option<&BTreeMap<String, f64>> {
        self.entries.get(&DimensionKey::new(platform, dimension))
    }

    pub fn score(&self, platform: &str, dimension: &str, keyword: &str) -> Option<f64> {
        self.get(platform, dimension)
            .and_then(|keywords| keywords.get(keyword).copied())
    }

    /// Insert a candidate keyword at 0.0 unless it is already tracked
    pub fn seed(&mut self, platform: &str, dimension: &str, keyword: &str) -> bool {
        let keywords = self
            .entries
            .entry(DimensionKey::new(platform, dimension))
            .or_default();
        if keywords.contains_key(keyword) {
            return false;
        }
        keywords.insert(keyword.to_string(), 0.0);
        true
    }

    pub fn set(&mut self, platform: &str, dimension: &str, keyword: &str, score: f64) {
        self.entries
            .entry(DimensionKey::new(platform, dimension))
            .or_default()
            .insert(keyword.to_string(), score);
    }

    pub fn remove(&mut self, platform: &str, dimension: &str, keyword: &str) -> Option<f64> {
        self.entries
            .get_mut(&DimensionKey::new(platform, dimension))
            .and_then(|keywords| keywords.remove(keyword))
    }

    pub fn has_platform(&self, platform: &str) -> bool {
        self.entries.keys().any(|k| k.platform == platform)
    }

    /// All platforms with at least one entry, sorted
    pub fn platforms(&self) -> Vec<&str> {
        let mut platforms: Vec<&str> = self.entries.keys().map(|k| k.platform.as_str()).collect();
        platforms.dedup();
        platforms
    }

    /// dimension -> keywords for a platform
    pub fn dimensions(&self, platform: &str) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.entries
            .iter()
            .filter(|(key, _)| key.platform == platform)
            .map(|(key, keywords)| (key.dimension.clone(), keywords.clone()))
            .collect()
    }

    /// Number of (platform, dimension, keyword) entries
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }
}

/// Classification outcome counters for one keyword
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordStats {
    #[serde(default)]
    pub correct: u64,
    #[serde(default)]
    pub total: u64,
}

impl KeywordStats {
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64)
        }
    }
}

/// Keyword -> outcome counters, per (platform, predicted dimension)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Nested<KeywordStats>", into = "Nested<KeywordStats>")]
pub struct PerformanceTable {
    entries: BTreeMap<DimensionKey, BTreeMap<String, KeywordStats>>,
}

impl From<Nested<KeywordStats>> for PerformanceTable {
    fn from(nested: Nested<KeywordStats>) -> Self {
        Self {
            entries: flatten(nested),
        }
    }
}

impl From<PerformanceTable> for Nested<KeywordStats> {
    fn from(table: PerformanceTable) -> Self {
        nest(&table.entries)
    }
}

impl PerformanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, platform: &str, dimension: &str, keyword: &str) -> Option<KeywordStats> {
        self.entries
            .get(&DimensionKey::new(platform, dimension))
            .and_then(|keywords| keywords.get(keyword).copied())
    }

    pub fn record(&mut self, platform: &str, dimension: &str, keyword: &str, correct: bool) {
        let stats = self
            .entries
            .entry(DimensionKey::new(platform, dimension))
            .or_default()
            .entry(keyword.to_string())
            .or_default();
        stats.total += 1;
        if correct {
            stats.correct += 1;
        }
    }

    /// Iterate (key, keyword, stats) in key order
    pub fn iter(&self) -> impl Iterator<Item = (&DimensionKey, &str, KeywordStats)> {
        self.entries.iter().flat_map(|(key, keywords)| {
            keywords
                .iter()
                .map(move |(keyword, stats)| (key, keyword.as_str(), *stats))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_do_not_create_entries() {
        let table = KeywordTable::new();
        assert!(table.get("figma", "layout").is_none());
        assert!(table.score("figma", "layout", "grid").is_none());
        assert!(table.is_empty());

        let mut table = KeywordTable::new();
        assert!(table.remove("figma", "layout", "grid").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_seed_keeps_existing_score() {
        let mut table = KeywordTable::new();
        assert!(table.seed("figma", "spacing", "gutter"));
        table.set("figma", "spacing", "gutter", 0.9);
        assert!(!table.seed("figma", "spacing", "gutter"));
        assert_eq!(table.score("figma", "spacing", "gutter"), Some(0.9));
    }

    #[test]
    fn test_nested_json_shape() {
        let mut table = KeywordTable::new();
        table.set("figma", "spacing", "gutter", 0.75);
        table.set("canva", "color", "tint", 0.6);

        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["figma"]["spacing"]["gutter"], 0.75);
        assert_eq!(value["canva"]["color"]["tint"], 0.6);

        let back: KeywordTable = serde_json::from_value(value).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.platforms(), vec!["canva", "figma"]);
    }

    #[test]
    fn test_performance_counters() {
        let mut perf = PerformanceTable::new();
        perf.record("figma", "layout", "grid", true);
        perf.record("figma", "layout", "grid", false);

        let stats = perf.get("figma", "layout", "grid").unwrap();
        assert_eq!((stats.correct, stats.total), (1, 2));
        assert!((stats.accuracy().unwrap() - 0.5).abs() < 0.001);
        assert_eq!(KeywordStats::default().accuracy(), None);
    }

    #[test]
    fn test_performance_missing_counts_default_to_zero() {
        let perf: PerformanceTable =
            serde_json::from_str(r#"{"figma": {"layout": {"grid": {"correct": 3}}}}"#).unwrap();
        let stats = perf.get("figma", "layout", "grid").unwrap();
        assert_eq!((stats.correct, stats.total), (3, 0));
    }
}
