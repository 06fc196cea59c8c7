//! Multi-factor reward for a single user interaction
//!
//! The reward is the sum of three weighted components:
//! - preference: accepted +1.0, rejected -1.0, modified +0.5, ignored 0.0
//! - change_magnitude: min(changes / 10, 1) plus 0.2 * min(property changes / 5, 1)
//! - temporal: 1.0 at 1s decaying to 0.0 at 5s, a flat 0.5 below 1s, and a
//!   slower decay to 0.0 at 15s above the window
//!
//! The total is never clamped.

use crate::environment::types::Action;
use crate::types::{ChangeRecord, UserResponse};
use serde::{Deserialize, Serialize};

/// Source tag attached to every computed reward
pub const COMPOSITE_SOURCE: &str = "composite";

/// Largest unweighted change-magnitude component
pub const MAX_CHANGE_REWARD: f64 = 1.2;

/// Weights applied to each reward component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub preference_weight: f64,
    pub change_weight: f64,
    pub temporal_weight: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            preference_weight: 1.0,
            change_weight: 0.5,
            temporal_weight: 0.2,
        }
    }
}

/// Weighted component breakdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardComponents {
    pub preference: f64,
    pub change_magnitude: f64,
    pub temporal: f64,
}

impl RewardComponents {
    pub fn total(&self) -> f64 {
        self.preference + self.change_magnitude + self.temporal
    }
}

/// Echo of the inputs a reward was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardMetadata {
    pub user_response: UserResponse,
    pub num_suggestions: usize,
    pub num_changes: usize,
    pub duration_ms: Option<f64>,
}

/// Output of the reward model for one interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub value: f64,
    pub source: String,
    pub components: RewardComponents,
    pub metadata: RewardMetadata,
}

/// Stateless reward model
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RewardModel {
    weights: RewardWeights,
}

impl RewardModel {
    pub fn new(weights: RewardWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> RewardWeights {
        self.weights
    }

    /// Unweighted preference signal
    pub fn preference_reward(response: UserResponse) -> f64 {
        match response {
            UserResponse::Accepted => 1.0,
            UserResponse::Rejected => -1.0,
            UserResponse::Modified => 0.5,
            UserResponse::Ignored => 0.0,
        }
    }

    /// Unweighted change magnitude, in [0, 1.2]
    pub fn change_reward(changes: &[ChangeRecord]) -> f64 {
        if changes.is_empty() {
            return 0.0;
        }
        let mut reward = (changes.len() as f64 / 10.0).min(1.0);

        let property_changes = changes.iter().filter(|c| c.is_property_scope()).count();
        if property_changes > 0 {
            reward += 0.2 * (property_changes as f64 / 5.0).min(1.0);
        }
        reward
    }

    /// Unweighted temporal signal, in [0, 1]
    pub fn temporal_reward(duration_ms: Option<f64>) -> f64 {
        match duration_ms {
            None => 0.0,
            Some(d) if d < 1000.0 => 0.5,
            Some(d) if d <= 5000.0 => 1.0 - (d - 1000.0) / 4000.0,
            Some(d) => (1.0 - (d - 5000.0) / 10000.0).max(0.0),
        }
    }

    /// Compute the composite reward for one interaction
    pub fn compute_reward(
        &self,
        action: &Action,
        user_response: UserResponse,
        changes: Option<&[ChangeRecord]>,
        duration_ms: Option<f64>,
    ) -> Reward {
        let changes = changes.unwrap_or(&[]);

        let components = RewardComponents {
            preference: Self::preference_reward(user_response) * self.weights.preference_weight,
            change_magnitude: Self::change_reward(changes) * self.weights.change_weight,
            temporal: Self::temporal_reward(duration_ms) * self.weights.temporal_weight,
        };

        Reward {
            value: components.total(),
            source: COMPOSITE_SOURCE.to_string(),
            components,
            metadata: RewardMetadata {
                user_response,
                num_suggestions: action.suggested_rules.len(),
                num_changes: changes.len(),
                duration_ms,
            },
        }
    }

    /// (min, max) reward reachable under the configured weights
    pub fn reward_range(&self) -> (f64, f64) {
        let w = &self.weights;
        let min = -w.preference_weight;
        let max = w.preference_weight + MAX_CHANGE_REWARD * w.change_weight + w.temporal_weight;
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::types::ActionType;

    fn action(n: usize) -> Action {
        Action::new(ActionType::SuggestMultiple, vec![Default::default(); n])
    }

    #[test]
    fn test_accepted_with_two_second_decision() {
        let model = RewardModel::default();
        let reward = model.compute_reward(&action(2), UserResponse::Accepted, None, Some(2000.0));

        assert!((reward.components.preference - 1.0).abs() < 0.001);
        assert!(reward.components.change_magnitude.abs() < 0.001);
        assert!((reward.components.temporal - 0.15).abs() < 0.001);
        assert!((reward.value - 1.15).abs() < 0.001);
        assert_eq!(reward.source, "composite");
        assert_eq!(reward.metadata.num_suggestions, 2);
        assert_eq!(reward.metadata.num_changes, 0);
    }

    #[test]
    fn test_preference_signals() {
        assert_eq!(RewardModel::preference_reward(UserResponse::Rejected), -1.0);
        assert_eq!(RewardModel::preference_reward(UserResponse::Modified), 0.5);
        assert_eq!(RewardModel::preference_reward(UserResponse::Ignored), 0.0);
    }

    #[test]
    fn test_change_magnitude_with_property_bonus() {
        let mut changes = vec![ChangeRecord::property("fontSize"); 3];
        changes.push(ChangeRecord {
            change_scope: Some("node".to_string()),
            ..Default::default()
        });
        // 4 / 10 + 0.2 * 3 / 5
        assert!((RewardModel::change_reward(&changes) - 0.52).abs() < 0.001);

        let many = vec![ChangeRecord::property("x"); 20];
        assert!((RewardModel::change_reward(&many) - MAX_CHANGE_REWARD).abs() < 0.001);
        assert_eq!(RewardModel::change_reward(&[]), 0.0);
    }

    #[test]
    fn test_temporal_brackets() {
        assert_eq!(RewardModel::temporal_reward(None), 0.0);
        assert_eq!(RewardModel::temporal_reward(Some(200.0)), 0.5);
        assert!((RewardModel::temporal_reward(Some(1000.0)) - 1.0).abs() < 0.001);
        assert!(RewardModel::temporal_reward(Some(5000.0)).abs() < 0.001);
        assert!((RewardModel::temporal_reward(Some(10000.0)) - 0.5).abs() < 0.001);
        assert_eq!(RewardModel::temporal_reward(Some(30000.0)), 0.0);
    }

    #[test]
    fn test_total_is_not_clamped() {
        let model = RewardModel::new(RewardWeights {
            preference_weight: 2.0,
            change_weight: 1.0,
            temporal_weight: 1.0,
        });
        let changes = vec![ChangeRecord::property("x"); 10];
        let reward = model.compute_reward(
            &action(1),
            UserResponse::Accepted,
            Some(&changes),
            Some(1000.0),
        );
        assert!((reward.value - 4.2).abs() < 0.001);
        assert!((reward.value - reward.components.total()).abs() < 1e-12);
    }

    #[test]
    fn test_reward_range() {
        let (min, max) = RewardModel::default().reward_range();
        assert!((min + 1.0).abs() < 0.001);
        assert!((max - 1.8).abs() < 0.001);
    }
}
