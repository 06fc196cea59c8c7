//! Property-based tests for the reward model and environment
//!
//! Checks that the composite reward always equals the sum of its weighted
//! components, stays inside the advertised range, and that the temporal
//! signal never increases within the 1-5s window or within the slow tail.

use designpref_core::environment::types::{Action, ActionType, Observation};
use designpref_core::{ChangeRecord, DesignEnvironment, RewardModel, RewardWeights, UserResponse};
use proptest::prelude::*;
use serde_json::json;

fn arb_response() -> impl Strategy<Value = UserResponse> {
    prop_oneof![
        Just(UserResponse::Accepted),
        Just(UserResponse::Rejected),
        Just(UserResponse::Modified),
        Just(UserResponse::Ignored),
    ]
}

fn arb_changes() -> impl Strategy<Value = Vec<ChangeRecord>> {
    prop::collection::vec(
        any::<bool>().prop_map(|property| {
            if property {
                ChangeRecord::property("fill")
            } else {
                ChangeRecord {
                    change_type: Some("added".to_string()),
                    change_scope: Some("node".to_string()),
                    ..Default::default()
                }
            }
        }),
        0..25,
    )
}

fn arb_weights() -> impl Strategy<Value = RewardWeights> {
    (0.0f64..2.0, 0.0f64..2.0, 0.0f64..2.0).prop_map(|(p, c, t)| RewardWeights {
        preference_weight: p,
        change_weight: c,
        temporal_weight: t,
    })
}

#[test]
fn worked_example_accepted_quick_small_edit() {
    let model = RewardModel::default();
    let changes = vec![ChangeRecord::property("fill"), ChangeRecord::property("stroke")];
    let action = Action::new(ActionType::SuggestRule, Vec::new());
    let reward = model.compute_reward(
        &action,
        UserResponse::Accepted,
        Some(&changes),
        Some(2000.0),
    );

    // 1.0 + 0.5 * (0.2 + 0.08) + 0.2 * 0.75
    assert!((reward.value - 1.29).abs() < 0.001);
    assert_eq!(reward.metadata.num_changes, 2);
}

#[test]
fn temporal_reward_restarts_past_the_window() {
    // The window closes at zero and the slow tail starts again near one
    assert_eq!(RewardModel::temporal_reward(Some(5000.0)), 0.0);
    assert!((RewardModel::temporal_reward(Some(5001.0)) - 0.9999).abs() < 1e-9);
    assert!(RewardModel::temporal_reward(Some(15_000.0)).abs() < 1e-12);
}

proptest! {
    #[test]
    fn prop_reward_is_sum_of_components(
        weights in arb_weights(),
        response in arb_response(),
        changes in arb_changes(),
        duration in prop::option::of(0.0f64..30_000.0),
    ) {
        let model = RewardModel::new(weights);
        let action = Action::no_suggestion();
        let reward = model.compute_reward(&action, response, Some(&changes), duration);
        let c = &reward.components;
        let sum = c.preference + c.change_magnitude + c.temporal;
        prop_assert!((reward.value - sum).abs() < 1e-9);

        let (min, max) = model.reward_range();
        prop_assert!(reward.value >= min - 1e-9);
        prop_assert!(reward.value <= max + 1e-9);
    }

    #[test]
    fn prop_temporal_reward_monotonic_in_window(
        a in 1000.0f64..=5000.0,
        b in 1000.0f64..=5000.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let fast = RewardModel::temporal_reward(Some(lo));
        let slow = RewardModel::temporal_reward(Some(hi));
        prop_assert!((0.0..=1.0).contains(&fast));
        prop_assert!(slow <= fast + 1e-12);
    }

    #[test]
    fn prop_temporal_reward_monotonic_in_slow_tail(
        a in 5000.001f64..60_000.0,
        b in 5000.001f64..60_000.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let fast = RewardModel::temporal_reward(Some(lo));
        let slow = RewardModel::temporal_reward(Some(hi));
        prop_assert!((0.0..=1.0).contains(&fast));
        prop_assert!(slow <= fast + 1e-12);
    }

    #[test]
    fn prop_change_reward_bounded(changes in arb_changes()) {
        let value = RewardModel::change_reward(&changes);
        prop_assert!((0.0..=1.2 + 1e-12).contains(&value));
    }

    #[test]
    fn prop_compute_reward_is_pure(
        response in arb_response(),
        changes in arb_changes(),
        duration in prop::option::of(0.0f64..30_000.0),
    ) {
        let model = RewardModel::default();
        let action = Action::no_suggestion();
        let first = model.compute_reward(&action, response, Some(&changes), duration);
        let second = model.compute_reward(&action, response, Some(&changes), duration);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_episode_total_matches_rewards(
        responses in prop::collection::vec(arb_response(), 1..15),
    ) {
        let mut env = DesignEnvironment::default();
        env.reset(Observation::new("s1", "file-1", json!({})));

        let mut sum = 0.0;
        for (i, response) in responses.iter().enumerate() {
            let result = env
                .step(Action::no_suggestion(), *response, None, None, None)
                .unwrap();
            sum += result.reward.value;
            prop_assert_eq!(result.done, *response == UserResponse::Accepted || i + 1 >= 10);
        }
        prop_assert!((env.total_reward() - sum).abs() < 1e-9);
        prop_assert_eq!(env.episode_rewards().len(), responses.len());
    }
}
