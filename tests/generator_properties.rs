//! Property-based tests for synthetic preference generation
//!
//! Generated pairs never compare a rule with itself, carry no duplicate
//! (preferred, rejected) ids, and regenerate identically from the same input.

mod common;

use common::arb_rules;
use designpref_core::generator::deduplicate_pairs;
use designpref_core::{
    GeneratorConfig, PreferenceSource, SharedClassifier, Strategy, SyntheticPreferenceGenerator,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn generator(config: GeneratorConfig) -> SyntheticPreferenceGenerator {
    SyntheticPreferenceGenerator::new(config, SharedClassifier::default())
}

#[test]
fn confidence_strategy_prefers_confident_rule() {
    let rules = vec![
        common::rule("test_rule_1", "Align icons to the grid", 0.9),
        common::rule("test_rule_2", "Maybe nudge things", 0.3),
    ];
    let pairs = generator(GeneratorConfig::default().ungrouped())
        .generate_preferences(&rules, None, Some(&[Strategy::Confidence]))
        .unwrap();

    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].preferred.rule_id, "test_rule_1");
    assert_eq!(pairs[0].rejected.rule_id, "test_rule_2");
    assert_eq!(pairs[0].source, PreferenceSource::Confidence);
    assert!(pairs[0].synthetic);
    assert!((pairs[0].weight - 0.3).abs() < 0.001);
}

#[test]
fn empty_and_singleton_pools_yield_nothing() {
    let gen = generator(GeneratorConfig::default());
    assert!(gen.generate_preferences(&[], None, None).unwrap().is_empty());
    let one = vec![common::rule("only", "Align icons", 0.9)];
    assert!(gen.generate_preferences(&one, None, None).unwrap().is_empty());
}

proptest! {
    #[test]
    fn prop_no_self_pairs(rules in arb_rules(), grouped in any::<bool>()) {
        let config = if grouped {
            GeneratorConfig::default()
        } else {
            GeneratorConfig::default().ungrouped()
        };
        let pairs = generator(config).generate_preferences(&rules, None, None).unwrap();
        for pair in &pairs {
            prop_assert_ne!(&pair.preferred.rule_id, &pair.rejected.rule_id);
            prop_assert!(pair.synthetic);
            prop_assert!((0.0..=1.0).contains(&pair.weight));
        }
    }

    #[test]
    fn prop_pair_keys_unique(rules in arb_rules()) {
        let pairs = generator(GeneratorConfig::default().ungrouped())
            .generate_preferences(&rules, None, None)
            .unwrap();
        let keys: HashSet<(String, String)> = pairs
            .iter()
            .map(|p| (p.preferred.rule_id.clone(), p.rejected.rule_id.clone()))
            .collect();
        prop_assert_eq!(keys.len(), pairs.len());
    }

    #[test]
    fn prop_generation_is_deterministic(rules in arb_rules()) {
        let gen = generator(GeneratorConfig::default());
        let first = gen.generate_preferences(&rules, None, None).unwrap();
        let second = gen.generate_preferences(&rules, None, None).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_deduplication_is_idempotent(rules in arb_rules()) {
        let pairs = generator(GeneratorConfig::default().ungrouped())
            .generate_preferences(&rules, None, None)
            .unwrap();
        let mut doubled = pairs.clone();
        doubled.extend(pairs.clone());
        prop_assert_eq!(deduplicate_pairs(doubled), pairs);
    }
}
