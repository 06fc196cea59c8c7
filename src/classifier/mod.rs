//! Platform-aware design dimension classifier
//!
//! Maps a rule description to one of a fixed set of design dimensions.
//!
//! # Resolution order
//!
//! 1. Explicit dimension (ground truth, confidence 1.0)
//! 2. Keyword scoring: curated base keywords score 1.0 each, learned
//!    platform keywords add their reward score. Confidence = min(1, best / 3).
//!    Equal scores resolve to the lexicographically smallest dimension.
//! 3. Scope mapping (confidence 0.5)
//! 4. "general" fallback (confidence 0.3)
//!
//! # Learning loop
//!
//! `learn_from_rules` seeds candidate keywords at 0.0, `calibrate` replays
//! labelled rules through the keyword path to fill the performance counters,
//! and `update_rewards` promotes keywords whose accuracy clears the floor and
//! evicts the rest.
//!
//! The classifier is a plain value. Share it across threads through
//! [`SharedClassifier`], which serializes writers behind an `RwLock`.

pub mod keywords;

use crate::error::{DesignPrefError, Result};
use crate::types::{Rule, RuleScope};
use keywords::{KeywordTable, PerformanceTable};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Curated base keywords per dimension
pub static BASE_DIMENSIONS: Lazy<BTreeMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let mut dims: BTreeMap<&'static str, &'static [&'static str]> = BTreeMap::new();
        dims.insert(
            "layout",
            &[
                "layout",
                "grid",
                "alignment",
                "position",
                "arrangement",
                "structure",
                "composition",
            ],
        );
        dims.insert(
            "interaction",
            &[
                "interaction",
                "flow",
                "navigation",
                "click",
                "hover",
                "transition",
                "state",
                "behavior",
            ],
        );
        dims.insert(
            "content",
            &[
                "content",
                "text",
                "copy",
                "message",
                "information",
                "data",
                "label",
            ],
        );
        dims.insert(
            "visual_hierarchy",
            &[
                "hierarchy",
                "emphasis",
                "prominence",
                "importance",
                "level",
                "rank",
            ],
        );
        dims.insert(
            "spacing",
            &[
                "spacing",
                "margin",
                "padding",
                "gap",
                "rhythm",
                "whitespace",
                "distance",
            ],
        );
        dims.insert(
            "typography",
            &[
                "typography",
                "font",
                "type",
                "text style",
                "letter",
                "line height",
                "kerning",
            ],
        );
        dims.insert(
            "color",
            &[
                "color",
                "palette",
                "hue",
                "saturation",
                "contrast",
                "tone",
                "shade",
            ],
        );
        dims.insert(
            "visual_elements",
            &[
                "shadow",
                "border",
                "radius",
                "gradient",
                "effect",
                "filter",
                "opacity",
            ],
        );
        dims
    });

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "her", "was", "one", "our",
    "out", "day", "get", "has", "him", "his", "how", "its", "may", "new", "now", "old", "see",
    "two", "way", "who", "boy", "did", "use", "she",
];

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w{3,}\b").expect("Valid word regex"));

/// Dimension used when a scope is known but no keyword matched
pub fn scope_dimension(scope: RuleScope) -> &'static str {
    match scope {
        RuleScope::Structural | RuleScope::Compositional => "layout",
        RuleScope::Relational => "interaction",
        RuleScope::ArtifactProperty => "visual_elements",
    }
}

/// Distinct words of three or more characters, lower-cased
fn description_words(description: &str) -> BTreeSet<String> {
    let lower = description.to_lowercase();
    WORD_RE
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// How a classification was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMethod {
    Explicit,
    Keywords,
    Scope,
    Fallback,
}

impl fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationMethod::Explicit => write!(f, "explicit"),
            ClassificationMethod::Keywords => write!(f, "keywords"),
            ClassificationMethod::Scope => write!(f, "scope"),
            ClassificationMethod::Fallback => write!(f, "fallback"),
        }
    }
}

/// Result of dimension classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub dimension: String,
    pub confidence: f64,
    pub method: ClassificationMethod,
    pub matched_keywords: Vec<String>,
    pub platform: Option<String>,
}

impl ClassificationResult {
    fn without_matches(
        dimension: &str,
        confidence: f64,
        method: ClassificationMethod,
        platform: Option<&str>,
    ) -> Self {
        Self {
            dimension: dimension.to_string(),
            confidence,
            method,
            matched_keywords: Vec::new(),
            platform: platform.map(str::to_string),
        }
    }
}

/// Counts from one calibration pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalibrationSummary {
    pub evaluated: usize,
    pub correct: usize,
}

/// On-disk form of the learned state
#[derive(Debug, Default, Serialize, Deserialize)]
struct KeywordStore {
    #[serde(default)]
    platform_keywords: KeywordTable,
    #[serde(default)]
    keyword_performance: PerformanceTable,
}

/// Keyword classifier with platform-specific learned keywords
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DimensionClassifier {
    platform_keywords: KeywordTable,
    keyword_performance: PerformanceTable,
}

impl DimensionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a description into a design dimension
    pub fn classify(
        &self,
        description: &str,
        scope: Option<RuleScope>,
        explicit_dimension: Option<&str>,
        platform: Option<&str>,
    ) -> ClassificationResult {
        if let Some(dimension) = explicit_dimension.filter(|d| !d.is_empty()) {
            return ClassificationResult::without_matches(
                dimension,
                1.0,
                ClassificationMethod::Explicit,
                platform,
            );
        }

        let lower = description.to_lowercase();
        let mut best: Option<(&str, f64, Vec<String>)> = None;

        for (dimension, base_keywords) in BASE_DIMENSIONS.iter() {
            let mut score = 0.0;
            let mut matched = Vec::new();

            for keyword in base_keywords.iter() {
                if lower.contains(keyword) {
                    score += 1.0;
                    matched.push(keyword.to_string());
                }
            }

            if let Some(learned) = platform.and_then(|p| self.platform_keywords.get(p, dimension))
            {
                for (keyword, reward) in learned {
                    if lower.contains(keyword.as_str()) {
                        score += reward;
                        matched.push(format!("{}({:.2})", keyword, reward));
                    }
                }
            }

            // Strict comparison keeps the first (smallest) name on ties
            if score > 0.0 && best.as_ref().map_or(true, |(_, s, _)| score > *s) {
                best = Some((*dimension, score, matched));
            }
        }

        match (best, scope) {
            (Some((dimension, score, matched)), _) => ClassificationResult {
                dimension: dimension.to_string(),
                confidence: (score / 3.0).min(1.0),
                method: ClassificationMethod::Keywords,
                matched_keywords: matched,
                platform: platform.map(str::to_string),
            },
            (None, Some(scope)) => ClassificationResult::without_matches(
                scope_dimension(scope),
                0.5,
                ClassificationMethod::Scope,
                platform,
            ),
            (None, None) => ClassificationResult::without_matches(
                "general",
                0.3,
                ClassificationMethod::Fallback,
                platform,
            ),
        }
    }

    /// Classify a typed rule, passing its explicit dimension and known platform
    pub fn classify_rule(&self, rule: &Rule) -> ClassificationResult {
        let platform = rule.platform();
        let platform = (platform != "unknown").then_some(platform.as_str());
        self.classify(
            &rule.description,
            Some(rule.scope),
            rule.design_dimension.as_deref(),
            platform,
        )
    }

    /// Seed zero-reward candidate keywords from rules with an explicit dimension
    ///
    /// Returns the number of new (platform, dimension, keyword) entries.
    pub fn learn_from_rules(&mut self, rules: &[Rule]) -> usize {
        let mut seeded = 0;
        for rule in rules {
            let Some(dimension) = rule.design_dimension.as_deref().filter(|d| !d.is_empty())
            else {
                continue;
            };
            if rule.description.is_empty() {
                continue;
            }

            let platform = rule.platform();
            for word in description_words(&rule.description) {
                if STOP_WORDS.contains(&word.as_str()) {
                    continue;
                }
                if self.platform_keywords.seed(&platform, dimension, &word) {
                    seeded += 1;
                }
            }
        }
        debug!(
            "Seeded {} candidate keywords from {} rules",
            seeded,
            rules.len()
        );
        seeded
    }

    /// Record one classification outcome for every word of a description
    pub fn track_performance(
        &mut self,
        description: &str,
        predicted_dimension: &str,
        ground_truth_dimension: &str,
        platform: Option<&str>,
    ) {
        let Some(platform) = platform else {
            return;
        };
        let correct = predicted_dimension == ground_truth_dimension;
        for word in description_words(description) {
            self.keyword_performance
                .record(platform, predicted_dimension, &word, correct);
        }
    }

    /// Replay labelled rules through the keyword path and track the outcomes
    pub fn calibrate(&mut self, rules: &[Rule]) -> CalibrationSummary {
        let mut summary = CalibrationSummary::default();
        for rule in rules {
            let Some(truth) = rule.design_dimension.as_deref().filter(|d| !d.is_empty()) else {
                continue;
            };
            let platform = rule.platform();
            if platform == "unknown" {
                continue;
            }

            let result = self.classify(&rule.description, Some(rule.scope), None, Some(&platform));
            self.track_performance(&rule.description, &result.dimension, truth, Some(&platform));

            summary.evaluated += 1;
            if result.dimension == truth {
                summary.correct += 1;
            }
        }
        debug!(
            "Calibrated on {} rules ({} correct)",
            summary.evaluated, summary.correct
        );
        summary
    }

    /// Promote keywords meeting `min_accuracy` to reward = accuracy, evict the rest
    pub fn update_rewards(&mut self, min_accuracy: f64) {
        let mut promoted = 0;
        let mut evicted = 0;

        let outcomes: Vec<_> = self
            .keyword_performance
            .iter()
            .filter_map(|(key, keyword, stats)| {
                stats
                    .accuracy()
                    .map(|acc| (key.clone(), keyword.to_string(), acc))
            })
            .collect();

        for (key, keyword, accuracy) in outcomes {
            if accuracy >= min_accuracy {
                self.platform_keywords
                    .set(&key.platform, &key.dimension, &keyword, accuracy);
                promoted += 1;
            } else if self
                .platform_keywords
                .remove(&key.platform, &key.dimension, &keyword)
                .is_some()
            {
                evicted += 1;
            }
        }

        info!(
            "Updated keyword rewards: {} promoted, {} evicted (min accuracy {:.2})",
            promoted, evicted, min_accuracy
        );
    }

    /// Learned keywords for a platform, optionally restricted to one dimension
    pub fn platform_keywords(
        &self,
        platform: &str,
        dimension: Option<&str>,
    ) -> BTreeMap<String, BTreeMap<String, f64>> {
        if !self.platform_keywords.has_platform(platform) {
            return BTreeMap::new();
        }
        match dimension {
            Some(dimension) => {
                let keywords = self
                    .platform_keywords
                    .get(platform, dimension)
                    .cloned()
                    .unwrap_or_default();
                BTreeMap::from([(dimension.to_string(), keywords)])
            }
            None => self.platform_keywords.dimensions(platform),
        }
    }

    /// Base keywords plus learned keywords scoring above 0.5
    pub fn all_keywords(&self, platform: Option<&str>) -> BTreeMap<String, Vec<String>> {
        let mut dimensions: BTreeMap<String, Vec<String>> = BASE_DIMENSIONS
            .iter()
            .map(|(dim, kws)| (dim.to_string(), kws.iter().map(|k| k.to_string()).collect()))
            .collect();

        let platforms: Vec<&str> = match platform {
            Some(p) => vec![p],
            None => self.platform_keywords.platforms(),
        };

        for plat in platforms {
            for (dimension, learned) in self.platform_keywords.dimensions(plat) {
                let Some(list) = dimensions.get_mut(&dimension) else {
                    continue;
                };
                for (keyword, score) in learned {
                    if score > 0.5 && !list.contains(&keyword) {
                        list.push(keyword);
                    }
                }
            }
        }
        dimensions
    }

    pub fn learned_keyword_count(&self) -> usize {
        self.platform_keywords.len()
    }

    /// Write the learned state as JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let store = KeywordStore {
            platform_keywords: self.platform_keywords.clone(),
            keyword_performance: self.keyword_performance.clone(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&store)?)?;
        debug!("Saved learned keywords to {}", path.display());
        Ok(())
    }

    /// Replace the learned state from JSON; a missing file leaves it unchanged
    pub fn load(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            debug!(
                "No keyword store at {}, keeping current state",
                path.display()
            );
            return Ok(());
        }
        let content = std::fs::read_to_string(path)?;
        let store: KeywordStore = serde_json::from_str(&content)?;
        self.platform_keywords = store.platform_keywords;
        self.keyword_performance = store.keyword_performance;
        info!(
            "Loaded {} learned keywords from {}",
            self.platform_keywords.len(),
            path.display()
        );
        Ok(())
    }
}

/// Thread-safe handle to a classifier: concurrent reads, one writer at a time
#[derive(Debug, Clone, Default)]
pub struct SharedClassifier {
    inner: Arc<RwLock<DimensionClassifier>>,
}

impl SharedClassifier {
    pub fn new(classifier: DimensionClassifier) -> Self {
        Self {
            inner: Arc::new(RwLock::new(classifier)),
        }
    }

    /// Construct and load persisted state from `path` if it exists
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut classifier = DimensionClassifier::new();
        classifier.load(path)?;
        Ok(Self::new(classifier))
    }

    pub fn read(&self) -> Result<RwLockReadGuard<'_, DimensionClassifier>> {
        self.inner
            .read()
            .map_err(|e| DesignPrefError::LockPoisoned(format!("Failed to lock classifier: {}", e)))
    }

    pub fn write(&self) -> Result<RwLockWriteGuard<'_, DimensionClassifier>> {
        self.inner
            .write()
            .map_err(|e| DesignPrefError::LockPoisoned(format!("Failed to lock classifier: {}", e)))
    }

    pub fn classify(
        &self,
        description: &str,
        scope: Option<RuleScope>,
        explicit_dimension: Option<&str>,
        platform: Option<&str>,
    ) -> Result<ClassificationResult> {
        Ok(self
            .read()?
            .classify(description, scope, explicit_dimension, platform))
    }

    pub fn learn_from_rules(&self, rules: &[Rule]) -> Result<usize> {
        Ok(self.write()?.learn_from_rules(rules))
    }

    pub fn calibrate(&self, rules: &[Rule]) -> Result<CalibrationSummary> {
        Ok(self.write()?.calibrate(rules))
    }

    pub fn update_rewards(&self, min_accuracy: f64) -> Result<()> {
        self.write()?.update_rewards(min_accuracy);
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.read()?.save(path)
    }

    pub fn load(&self, path: &Path) -> Result<()> {
        self.write()?.load(path)
    }
}
