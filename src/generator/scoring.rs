//! Heuristic rule scores used by the quality and constitutional strategies

use crate::types::Rule;

/// Description phrases that signal iterative refinement
pub const ITERATION_KEYWORDS: &[&str] = &[
    "iterative", "refine", "adjust", "return", "revisit", "again", "further", "continue",
    "polish", "tweak",
];

/// Description phrases that explain purpose rather than mechanics
pub const SEMANTIC_KEYWORDS: &[&str] = &[
    "for",
    "to improve",
    "to enhance",
    "for readability",
    "for hierarchy",
    "alignment",
    "consistency",
    "balance",
    "emphasis",
    "clarity",
];

const MAX_DESCRIPTION_CHARS: usize = 150;
const MAX_DESCRIPTION_WORDS: usize = 20;

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

/// Schema, description, grounding and metadata quality in [0, 1]
pub fn quality_score(rule: &Rule, min_novelty_score: f64) -> f64 {
    let mut score = 0.0;

    if !rule.rule_id.is_empty() && !rule.description.is_empty() {
        score += 0.2;
    }

    if rule.description.chars().count() <= MAX_DESCRIPTION_CHARS
        && rule.word_count() <= MAX_DESCRIPTION_WORDS
    {
        score += 0.2;
    }

    if let Some(pc) = &rule.platform_context {
        if pc.is_grounded() {
            score += 0.2;
        }
        if pc.has_endpoint_or_source() {
            score += 0.1;
        }
    }

    if let Some(tm) = &rule.training_metadata {
        if tm.is_suitable() {
            score += 0.2;
        }
        if tm.novelty_score.unwrap_or(0.0) >= min_novelty_score {
            score += 0.1;
        }
    }

    score
}

/// Iteration awareness, semantic depth and grounding in [0, 1]
pub fn constitutional_score(rule: &Rule) -> f64 {
    let mut score = 0.0;
    let description = rule.description.to_lowercase();

    if contains_any(&description, ITERATION_KEYWORDS) {
        score += 0.25;
    }
    if contains_any(&description, SEMANTIC_KEYWORDS) {
        score += 0.25;
    }

    if let Some(pc) = &rule.platform_context {
        if pc.is_grounded() {
            score += 0.15;
        }
        if pc.has_endpoint_or_source() {
            score += 0.1;
        }
    }

    if let Some(tm) = &rule.training_metadata {
        score += 0.15 * tm.constitutional_signals.len().min(2) as f64;
        if tm.iteration_detected() {
            score += 0.15;
        }
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AbstractionLevel, PlatformContext, RuleScope, TrainingMetadata};
    use serde_json::json;

    fn rule(description: &str) -> Rule {
        Rule::new(
            "r1",
            description,
            RuleScope::Structural,
            AbstractionLevel::Specific,
            0.5,
        )
    }

    #[test]
    fn test_quality_bare_rule() {
        assert!((quality_score(&rule("Align icons"), 0.3) - 0.4).abs() < 0.001);
    }

    #[test]
    fn test_quality_long_description_loses_points() {
        let long = "word ".repeat(25);
        assert!((quality_score(&rule(&long), 0.3) - 0.2).abs() < 0.001);
    }

    #[test]
    fn test_quality_fully_grounded() {
        let mut pc = PlatformContext::new("figma", "plugin_api");
        pc.api_endpoints = Some(json!(["figma.currentPage.selection"]));
        let tm = TrainingMetadata {
            suitable_for_training: Some(true),
            novelty_score: Some(0.3),
            ..Default::default()
        };
        let r = rule("Align icons")
            .with_platform_context(pc)
            .with_training_metadata(tm);
        assert!((quality_score(&r, 0.3) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_quality_missing_novelty_counts_as_zero() {
        let tm = TrainingMetadata {
            suitable_for_training: Some(true),
            ..Default::default()
        };
        let r = rule("Align icons").with_training_metadata(tm);
        assert!((quality_score(&r, 0.3) - 0.6).abs() < 0.001);
        assert!((quality_score(&r, 0.0) - 0.7).abs() < 0.001);
    }

    #[test]
    fn test_constitutional_components() {
        assert!(constitutional_score(&rule("Make it blue")).abs() < 0.001);
        assert!((constitutional_score(&rule("Refine the card")) - 0.25).abs() < 0.001);
        assert!(
            (constitutional_score(&rule("Refine padding for readability")) - 0.5).abs() < 0.001
        );

        let tm = TrainingMetadata {
            constitutional_signals: vec!["iteration".into(), "correlation".into(), "x".into()],
            iteration_detected: Some(true),
            ..Default::default()
        };
        let r = rule("Refine padding for readability")
            .with_platform_context(PlatformContext::new("figma", "plugin_api"))
            .with_training_metadata(tm);
        // 0.5 + 0.15 + 0.3 + 0.15 caps at 1.0
        assert!((constitutional_score(&r) - 1.0).abs() < 0.001);
    }
}
