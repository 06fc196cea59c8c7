//! Episodic environment over suggestion interactions
//!
//! States: uninitialized -> ready (after `reset`) -> stepping -> done.
//! An episode ends when the user accepts a suggestion or after
//! [`MAX_EPISODE_STEPS`] steps, whichever comes first. Every call is
//! synchronous and completes before returning.

pub mod converters;
pub mod types;

use crate::error::{DesignPrefError, Result};
use crate::reward::{Reward, RewardModel, RewardWeights};
use crate::types::{ChangeRecord, UserResponse};
use serde_json::{json, Value};
use tracing::debug;
use types::{
    Action, ActionType, Observation, StepInfo, StepResult, TrainingStep, TrainingStepMetadata,
};

/// Hard cap on steps per episode
pub const MAX_EPISODE_STEPS: usize = 10;

/// Default maximum number of rules in one action
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Design-tool environment: observations are snapshots, actions are suggestions
#[derive(Debug, Clone)]
pub struct DesignEnvironment {
    reward_model: RewardModel,
    max_suggestions: usize,
    current_observation: Option<Observation>,
    last_action: Option<Action>,
    last_user_response: Option<UserResponse>,
    last_changes: Option<Vec<ChangeRecord>>,
    episode_step: usize,
    episode_rewards: Vec<f64>,
}

impl Default for DesignEnvironment {
    fn default() -> Self {
        Self::new(RewardWeights::default())
    }
}

impl DesignEnvironment {
    pub fn new(weights: RewardWeights) -> Self {
        Self::with_max_suggestions(weights, DEFAULT_MAX_SUGGESTIONS)
    }

    pub fn with_max_suggestions(weights: RewardWeights, max_suggestions: usize) -> Self {
        Self {
            reward_model: RewardModel::new(weights),
            max_suggestions,
            current_observation: None,
            last_action: None,
            last_user_response: None,
            last_changes: None,
            episode_step: 0,
            episode_rewards: Vec::new(),
        }
    }

    pub fn reward_model(&self) -> &RewardModel {
        &self.reward_model
    }

    /// Start a new episode at `observation`
    pub fn reset(&mut self, observation: Observation) -> &Observation {
        self.last_action = None;
        self.last_user_response = None;
        self.last_changes = None;
        self.episode_step = 0;
        self.episode_rewards.clear();
        self.current_observation.insert(observation)
    }

    /// Apply one user response to a suggestion
    pub fn step(
        &mut self,
        action: Action,
        user_response: UserResponse,
        changes: Option<Vec<ChangeRecord>>,
        duration_ms: Option<f64>,
        next_observation: Option<Observation>,
    ) -> Result<StepResult> {
        if self.current_observation.is_none() {
            return Err(DesignPrefError::InvalidState(
                "Environment not reset. Call reset() first.".to_string(),
            ));
        }

        self.episode_step += 1;
        let reward =
            self.reward_model
                .compute_reward(&action, user_response, changes.as_deref(), duration_ms);
        self.episode_rewards.push(reward.value);

        if let Some(next) = next_observation {
            self.current_observation = Some(next);
        }

        let done =
            user_response == UserResponse::Accepted || self.episode_step >= MAX_EPISODE_STEPS;

        let info = StepInfo {
            episode_step: self.episode_step,
            total_reward: self.total_reward(),
            action_type: action.action_type,
            user_response,
            num_changes: changes.as_ref().map_or(0, Vec::len),
        };

        debug!(
            "Step {}: {} -> reward {:.3} (done: {})",
            self.episode_step, user_response, reward.value, done
        );

        self.last_action = Some(action);
        self.last_user_response = Some(user_response);
        self.last_changes = changes;

        let observation = self
            .current_observation
            .clone()
            .ok_or_else(|| DesignPrefError::InvalidState("Observation missing".to_string()))?;

        Ok(StepResult {
            observation,
            reward,
            done,
            info,
        })
    }

    pub fn episode_step(&self) -> usize {
        self.episode_step
    }

    pub fn total_reward(&self) -> f64 {
        self.episode_rewards.iter().sum()
    }

    pub fn episode_rewards(&self) -> &[f64] {
        &self.episode_rewards
    }

    pub fn current_observation(&self) -> Option<&Observation> {
        self.current_observation.as_ref()
    }

    pub fn last_action(&self) -> Option<&Action> {
        self.last_action.as_ref()
    }

    pub fn last_user_response(&self) -> Option<UserResponse> {
        self.last_user_response
    }

    pub fn last_changes(&self) -> Option<&[ChangeRecord]> {
        self.last_changes.as_deref()
    }

    /// Structure of an observation, for consumers that need a schema
    pub fn observation_space(&self) -> Value {
        json!({
            "snapshot_id": {"type": "string"},
            "artifact_id": {"type": "string"},
            "snapshot": {"type": "object"},
            "previous_snapshot": {"type": "object", "optional": true},
            "user_intent": {"type": "string", "optional": true},
            "component_id": {"type": "string", "optional": true},
            "component_type": {"type": "string", "optional": true},
            "platform": {"type": "string", "optional": true},
            "interaction_history": {"type": "object", "optional": true},
            "temporal_context": {"type": "object", "optional": true},
        })
    }

    /// Structure of an action
    pub fn action_space(&self) -> Value {
        let action_types: Vec<String> = ActionType::ALL.iter().map(|a| a.to_string()).collect();
        json!({
            "action_type": {"type": "enum", "values": action_types},
            "suggested_rules": {
                "type": "array",
                "max_length": self.max_suggestions,
                "item_type": {
                    "rule_id": "string",
                    "description": "string",
                    "confidence": "float",
                    "scope": "string",
                    "dimension": "string",
                },
            },
            "confidence_scores": {
                "type": "array",
                "max_length": self.max_suggestions,
                "item_type": "float",
            },
            "reasoning": {"type": "string", "optional": true},
        })
    }

    pub fn reward_range(&self) -> (f64, f64) {
        self.reward_model.reward_range()
    }

    /// Package one transition with the current episode counters
    pub fn format_for_training(
        &self,
        observation: Observation,
        action: Action,
        reward: Reward,
        next_observation: Option<Observation>,
    ) -> TrainingStep {
        TrainingStep {
            input: observation,
            action,
            reward,
            next_observation,
            metadata: TrainingStepMetadata {
                episode_step: self.episode_step,
                total_reward: self.total_reward(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn observation(id: &str) -> Observation {
        Observation::new(id, "artifact-1", json!({"metadata": {"snapshot_id": id}}))
    }

    #[test]
    fn test_step_before_reset_fails() {
        let mut env = DesignEnvironment::default();
        let result = env.step(Action::no_suggestion(), UserResponse::Ignored, None, None, None);
        assert!(matches!(result, Err(DesignPrefError::InvalidState(_))));
        assert_eq!(env.episode_step(), 0);
    }

    #[test]
    fn test_accept_ends_episode() {
        let mut env = DesignEnvironment::default();
        env.reset(observation("s1"));

        let result = env
            .step(Action::no_suggestion(), UserResponse::Rejected, None, Some(2000.0), None)
            .unwrap();
        assert!(!result.done);
        assert_eq!(result.info.episode_step, 1);

        let result = env
            .step(
                Action::no_suggestion(),
                UserResponse::Accepted,
                None,
                Some(2000.0),
                Some(observation("s2")),
            )
            .unwrap();
        assert!(result.done);
        assert_eq!(result.observation.snapshot_id, "s2");
        // -1.0 + 0.15 then 1.0 + 0.15
        assert!((result.info.total_reward - 0.3).abs() < 0.001);
        assert_eq!(env.last_user_response(), Some(UserResponse::Accepted));
    }

    #[test]
    fn test_step_cap() {
        let mut env = DesignEnvironment::default();
        env.reset(observation("s1"));

        for i in 1..MAX_EPISODE_STEPS {
            let result = env
                .step(Action::no_suggestion(), UserResponse::Ignored, None, None, None)
                .unwrap();
            assert!(!result.done, "episode ended early at step {}", i);
        }
        let result = env
            .step(Action::no_suggestion(), UserResponse::Ignored, None, None, None)
            .unwrap();
        assert!(result.done);
        assert_eq!(result.info.episode_step, MAX_EPISODE_STEPS);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut env = DesignEnvironment::default();
        env.reset(observation("s1"));
        let changes = vec![ChangeRecord::property("opacity")];
        let result = env
            .step(Action::no_suggestion(), UserResponse::Modified, Some(changes), None, None)
            .unwrap();
        assert_eq!(result.info.num_changes, 1);
        assert_eq!(env.episode_rewards().len(), 1);

        let obs = env.reset(observation("s9"));
        assert_eq!(obs.snapshot_id, "s9");
        assert_eq!(env.episode_step(), 0);
        assert!(env.episode_rewards().is_empty());
        assert!(env.last_action().is_none());
        assert!(env.last_changes().is_none());
    }

    #[test]
    fn test_spaces_and_training_format() {
        let env = DesignEnvironment::default();
        assert_eq!(env.action_space()["suggested_rules"]["max_length"], 5);
        assert_eq!(env.action_space()["action_type"]["values"][1], "suggest_multiple");
        assert_eq!(env.observation_space()["snapshot"]["type"], "object");

        let reward = env.reward_model().compute_reward(
            &Action::no_suggestion(),
            UserResponse::Accepted,
            None,
            None,
        );
        let step =
            env.format_for_training(observation("s1"), Action::no_suggestion(), reward, None);
        assert_eq!(step.metadata.episode_step, 0);
        assert!(step.next_observation.is_none());

        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["action"]["action_type"], "no_suggestion");
        assert_eq!(value["reward"]["metadata"]["user_response"], "accepted");
    }
}
