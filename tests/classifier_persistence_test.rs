//! Keyword learning through the generator, persisted and reloaded from disk

mod common;

use designpref_core::types::{PlatformContext, Rule};
use designpref_core::{GeneratorConfig, SharedClassifier, SyntheticPreferenceGenerator};
use tempfile::TempDir;

fn labelled(id: &str, description: &str, dimension: &str) -> Rule {
    common::rule(id, description, 0.8)
        .with_design_dimension(dimension)
        .with_platform_context(PlatformContext::new("Figma", "plugin_api"))
}

#[test]
fn learned_keywords_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("store").join("keywords.json");

    let generator =
        SyntheticPreferenceGenerator::new(GeneratorConfig::default(), SharedClassifier::default());
    let rules = vec![
        labelled("r1", "Widen gutter padding", "spacing"),
        labelled("r2", "Tighten gutter margin", "spacing"),
        common::rule("r3", "Unlabelled gutter rule", 0.5),
    ];

    let before = generator
        .classifier()
        .classify("Widen the gutter", None, None, Some("figma"))
        .unwrap();
    assert_eq!(before.dimension, "general");

    assert!(generator.learn_keywords_from_rules(&rules).unwrap() > 0);
    let summary = generator.calibrate_keywords(&rules).unwrap();
    assert_eq!((summary.evaluated, summary.correct), (2, 2));
    generator.update_keyword_rewards(0.6).unwrap();
    generator.save_learned_keywords(&store).unwrap();

    let learned = generator.platform_keywords("figma", Some("spacing")).unwrap();
    assert!((learned["spacing"]["gutter"] - 1.0).abs() < 0.001);

    let restored = SharedClassifier::load_from(&store).unwrap();
    let after = restored
        .classify("Widen the gutter", None, None, Some("figma"))
        .unwrap();
    assert_eq!(after.dimension, "spacing");

    // Learned keywords are per platform
    let elsewhere = restored
        .classify("Widen the gutter", None, None, Some("sketch"))
        .unwrap();
    assert_eq!(elsewhere.dimension, "general");
}

#[test]
fn loading_missing_store_starts_fresh() {
    let dir = TempDir::new().unwrap();
    let generator =
        SyntheticPreferenceGenerator::new(GeneratorConfig::default(), SharedClassifier::default());
    generator
        .load_learned_keywords(&dir.path().join("absent.json"))
        .unwrap();
    assert!(generator.platform_keywords("figma", None).unwrap().is_empty());
}
