//! The six heuristic pairing strategies
//!
//! Each strategy splits a group into a preferred set and a rejected set. The
//! sets are disjoint by construction; every (preferred, rejected) combination
//! becomes a pair, so the cost per group is O(|preferred| x |rejected|).

use super::scoring::{constitutional_score, quality_score};
use super::GeneratorConfig;
use crate::error::{DesignPrefError, Result};
use crate::types::{PatternFrequency, PreferenceSource, Rule};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Weight multiplier for constitutional pairs
pub const CONSTITUTIONAL_BOOST: f64 = 1.2;

const QUALITY_HIGH: f64 = 0.8;
const QUALITY_LOW: f64 = 0.5;
const NOVELTY_HIGH: f64 = 0.7;
const NOVELTY_LOW: f64 = 0.3;
const NOVELTY_DEFAULT: f64 = 0.5;
const CONSTITUTIONAL_HIGH: f64 = 0.7;
const CONSTITUTIONAL_LOW: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strategy {
    Confidence,
    Quality,
    Completeness,
    Novelty,
    Frequency,
    Constitutional,
}

impl Strategy {
    /// All strategies in generation order
    pub const ALL: [Strategy; 6] = [
        Strategy::Confidence,
        Strategy::Quality,
        Strategy::Completeness,
        Strategy::Novelty,
        Strategy::Frequency,
        Strategy::Constitutional,
    ];

    pub fn as_str(&self) -> &'static str {
        self.source().as_str()
    }

    pub fn source(&self) -> PreferenceSource {
        match self {
            Strategy::Confidence => PreferenceSource::Confidence,
            Strategy::Quality => PreferenceSource::Quality,
            Strategy::Completeness => PreferenceSource::Completeness,
            Strategy::Novelty => PreferenceSource::Novelty,
            Strategy::Frequency => PreferenceSource::Frequency,
            Strategy::Constitutional => PreferenceSource::Constitutional,
        }
    }

    /// Parse a list of names, dropping unknown ones
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Vec<Strategy> {
        let mut strategies = Vec::new();
        for name in names {
            match name.as_ref().trim().parse::<Strategy>() {
                Ok(strategy) if !strategies.contains(&strategy) => strategies.push(strategy),
                Ok(_) => {}
                Err(_) => debug!("Ignoring unknown strategy: {}", name.as_ref()),
            }
        }
        strategies
    }

    /// Pair weight under this strategy
    pub fn weight(&self, synthetic_weight: f64) -> f64 {
        match self {
            Strategy::Constitutional => (synthetic_weight * CONSTITUTIONAL_BOOST).min(1.0),
            _ => synthetic_weight,
        }
    }

    /// Split a group into (preferred, rejected)
    pub fn split<'a>(
        &self,
        rules: &[&'a Rule],
        config: &GeneratorConfig,
    ) -> (Vec<&'a Rule>, Vec<&'a Rule>) {
        let mut preferred = Vec::new();
        let mut rejected = Vec::new();

        for &rule in rules {
            match self.verdict(rule, config) {
                Some(true) => preferred.push(rule),
                Some(false) => rejected.push(rule),
                None => {}
            }
        }
        (preferred, rejected)
    }

    /// Some(true) for preferred, Some(false) for rejected, None for neither
    fn verdict(&self, rule: &Rule, config: &GeneratorConfig) -> Option<bool> {
        match self {
            Strategy::Confidence => by_thresholds(
                rule.confidence,
                config.confidence_threshold_high,
                config.confidence_threshold_low,
            ),
            Strategy::Quality => by_thresholds(
                quality_score(rule, config.min_novelty_score),
                QUALITY_HIGH,
                QUALITY_LOW,
            ),
            Strategy::Completeness => Some(
                rule.platform_context
                    .as_ref()
                    .is_some_and(|pc| pc.is_complete()),
            ),
            Strategy::Novelty => rule.training_metadata.as_ref().and_then(|tm| {
                by_thresholds(
                    tm.novelty_score.unwrap_or(NOVELTY_DEFAULT),
                    NOVELTY_HIGH,
                    NOVELTY_LOW,
                )
            }),
            Strategy::Frequency => rule.training_metadata.as_ref().and_then(|tm| {
                match tm.pattern_frequency.unwrap_or(PatternFrequency::Uncommon) {
                    PatternFrequency::Common => Some(true),
                    PatternFrequency::Rare => Some(false),
                    _ => None,
                }
            }),
            Strategy::Constitutional => by_thresholds(
                constitutional_score(rule),
                CONSTITUTIONAL_HIGH,
                CONSTITUTIONAL_LOW,
            ),
        }
    }
}

/// Preferred at or above `high`, rejected at or below `low`
///
/// When `low >= high` a value can satisfy both; preferred wins so the sets
/// stay disjoint.
fn by_thresholds(value: f64, high: f64, low: f64) -> Option<bool> {
    if value >= high {
        Some(true)
    } else if value <= low {
        Some(false)
    } else {
        None
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = DesignPrefError;

    fn from_str(s: &str) -> Result<Self> {
        Strategy::ALL
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| DesignPrefError::Other(format!("Unknown strategy: {}", s)))
    }
}
