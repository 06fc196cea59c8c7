//! Common test utilities and helpers
#![allow(dead_code)]

use designpref_core::types::{
    AbstractionLevel, PlatformContext, Rule, RuleScope, TrainingMetadata,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

pub fn rule(id: &str, description: &str, confidence: f64) -> Rule {
    Rule::new(
        id,
        description,
        RuleScope::Structural,
        AbstractionLevel::Specific,
        confidence,
    )
}

/// A rule with platform context and training metadata filled in
pub fn complete_rule(id: &str, dimension: &str, confidence: f64, novelty: f64) -> Rule {
    rule(id, &format!("Keep {} consistent across cards", dimension), confidence)
        .with_design_dimension(dimension)
        .with_platform_context(PlatformContext::new("figma", "plugin_api"))
        .with_training_metadata(TrainingMetadata {
            novelty_score: Some(novelty),
            ..Default::default()
        })
}

pub fn rule_json(id: &str, dimension: &str, confidence: f64) -> Value {
    json!({
        "rule_id": id,
        "description": format!("Use consistent {} between items", dimension),
        "scope": "structural",
        "abstraction_level": "specific",
        "triggering_actions": ["resize"],
        "confidence": confidence,
        "dimension": dimension,
        "platform_context": {"platform": "figma", "extraction_method": "plugin_api"}
    })
}

pub fn write_lines(path: &Path, lines: &[Value]) {
    let body: String = lines.iter().map(|l| format!("{}\n", l)).collect();
    fs::write(path, body).expect("Failed to write fixture");
}

pub fn read_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .expect("Failed to read output")
        .lines()
        .map(|l| serde_json::from_str(l).expect("Invalid JSON line"))
        .collect()
}

/// Small pools of rules with assorted confidences and metadata
pub fn arb_rules() -> impl Strategy<Value = Vec<Rule>> {
    prop::collection::vec(
        (
            0u8..6,
            0.0f64..=1.0,
            prop::option::of(0.0f64..=1.0),
            any::<bool>(),
        ),
        0..12,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (word, confidence, novelty, complete))| {
                let words = ["padding", "color", "font", "align", "radius", "layout"];
                let mut r = rule(
                    &format!("r{}", i),
                    &format!("Adjust {} on the card", words[word as usize]),
                    confidence,
                );
                if complete {
                    r = r.with_platform_context(PlatformContext::new("figma", "plugin_api"));
                }
                if let Some(novelty) = novelty {
                    r = r.with_training_metadata(TrainingMetadata {
                        novelty_score: Some(novelty),
                        ..Default::default()
                    });
                }
                r
            })
            .collect()
    })
}
