//! Summary quality metrics for rule sets and preference datasets

use crate::generator::DpoExample;
use crate::types::Rule;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleQualityMetrics {
    pub total_rules: usize,
    pub avg_confidence: f64,
    pub min_confidence: f64,
    pub max_confidence: f64,
    pub scope_distribution: BTreeMap<String, usize>,
    pub abstraction_distribution: BTreeMap<String, usize>,
    /// Share of rules with a grounded platform context
    pub completeness_score: f64,
    /// Mean novelty over rules that carry a novelty score
    pub novelty_score: f64,
    pub quality_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreferenceQualityMetrics {
    pub total_pairs: usize,
    pub avg_confidence_gap: f64,
    pub min_confidence_gap: f64,
    pub max_confidence_gap: f64,
    pub source_distribution: BTreeMap<String, usize>,
    /// Weights rounded to one decimal
    pub weight_distribution: BTreeMap<String, usize>,
    pub quality_score: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

pub fn rule_quality(rules: &[Rule]) -> RuleQualityMetrics {
    let confidences: Vec<f64> = rules.iter().map(|r| r.confidence).collect();
    let (min_confidence, max_confidence) = min_max(&confidences);
    let avg_confidence = mean(&confidences);

    let mut scope_distribution = BTreeMap::new();
    let mut abstraction_distribution = BTreeMap::new();
    for rule in rules {
        *scope_distribution
            .entry(rule.scope.to_string())
            .or_insert(0) += 1;
        *abstraction_distribution
            .entry(rule.abstraction_level.to_string())
            .or_insert(0) += 1;
    }

    let grounded = rules
        .iter()
        .filter(|r| r.platform_context.as_ref().is_some_and(|pc| pc.is_grounded()))
        .count();
    let completeness_score = if rules.is_empty() {
        0.0
    } else {
        grounded as f64 / rules.len() as f64
    };

    let novelty: Vec<f64> = rules
        .iter()
        .filter_map(|r| r.training_metadata.as_ref()?.novelty_score)
        .collect();
    let novelty_score = mean(&novelty);

    let quality_score = if rules.is_empty() {
        0.0
    } else {
        0.4 * avg_confidence + 0.3 * completeness_score + 0.3 * novelty_score
    };

    RuleQualityMetrics {
        total_rules: rules.len(),
        avg_confidence,
        min_confidence,
        max_confidence,
        scope_distribution,
        abstraction_distribution,
        completeness_score,
        novelty_score,
        quality_score,
    }
}

/// Metrics over exported DPO records
///
/// The confidence gap is preferred minus rejected confidence. The score is
/// the mean of the gaps with negative gaps counted as zero, clamped to [0, 1].
pub fn preference_quality(examples: &[DpoExample]) -> PreferenceQualityMetrics {
    let gaps: Vec<f64> = examples
        .iter()
        .map(|e| e.preferred.confidence - e.rejected.confidence)
        .collect();
    let (min_confidence_gap, max_confidence_gap) = min_max(&gaps);

    let mut source_distribution = BTreeMap::new();
    let mut weight_distribution = BTreeMap::new();
    for example in examples {
        *source_distribution
            .entry(example.strategy.to_string())
            .or_insert(0) += 1;
        let bucket = format!("{:.1}", example.weight.unwrap_or(1.0));
        *weight_distribution.entry(bucket).or_insert(0) += 1;
    }

    let positive: Vec<f64> = gaps.iter().map(|g| g.max(0.0)).collect();

    PreferenceQualityMetrics {
        total_pairs: examples.len(),
        avg_confidence_gap: mean(&gaps),
        min_confidence_gap,
        max_confidence_gap,
        source_distribution,
        weight_distribution,
        quality_score: mean(&positive).clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AbstractionLevel, PlatformContext, PreferencePair, PreferenceSource, RuleScope,
        TrainingMetadata,
    };

    fn rule(id: &str, confidence: f64) -> Rule {
        Rule::new(
            id,
            "Align icons",
            RuleScope::Structural,
            AbstractionLevel::Specific,
            confidence,
        )
    }

    #[test]
    fn test_empty_inputs_are_zero() {
        assert_eq!(rule_quality(&[]), RuleQualityMetrics::default());
        assert_eq!(preference_quality(&[]), PreferenceQualityMetrics::default());
    }

    #[test]
    fn test_rule_quality() {
        let rules = vec![
            rule("a", 0.9)
                .with_platform_context(PlatformContext::new("figma", "plugin_api"))
                .with_training_metadata(TrainingMetadata {
                    novelty_score: Some(0.6),
                    ..Default::default()
                }),
            Rule::new(
                "b",
                "Group cards",
                RuleScope::Relational,
                AbstractionLevel::General,
                0.5,
            ),
        ];
        let metrics = rule_quality(&rules);

        assert_eq!(metrics.total_rules, 2);
        assert!((metrics.avg_confidence - 0.7).abs() < 0.001);
        assert!((metrics.min_confidence - 0.5).abs() < 0.001);
        assert!((metrics.completeness_score - 0.5).abs() < 0.001);
        assert!((metrics.novelty_score - 0.6).abs() < 0.001);
        assert!((metrics.quality_score - (0.28 + 0.15 + 0.18)).abs() < 0.001);
        assert_eq!(metrics.scope_distribution["relational"], 1);
        assert_eq!(metrics.abstraction_distribution["specific"], 1);
    }

    #[test]
    fn test_preference_quality() {
        let pair = |hi: f64, lo: f64, weight: f64| {
            let pair = PreferencePair {
                preferred: rule("p", hi),
                rejected: rule("r", lo),
                source: PreferenceSource::Confidence,
                synthetic: true,
                weight,
                trace_context: None,
                dimension_group: None,
                platform_group: None,
                artifact_group: None,
            };
            DpoExample::from_pair(&pair, true, false)
        };
        let examples = vec![pair(0.9, 0.3, 0.3), pair(0.4, 0.6, 0.36)];
        let metrics = preference_quality(&examples);

        assert!((metrics.avg_confidence_gap - 0.2).abs() < 0.001);
        assert!((metrics.min_confidence_gap + 0.2).abs() < 0.001);
        assert!((metrics.quality_score - 0.3).abs() < 0.001);
        assert_eq!(metrics.source_distribution["confidence"], 2);
        assert_eq!(metrics.weight_distribution["0.3"], 1);
        assert_eq!(metrics.weight_distribution["0.4"], 1);
    }
}
