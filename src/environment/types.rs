//! Observation, action and step types for the design environment

use crate::reward::Reward;
use crate::types::{RuleRecord, TraceContext, UserResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of suggestion the agent made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SuggestRule,
    SuggestMultiple,
    NoSuggestion,
}

impl ActionType {
    pub const ALL: [ActionType; 3] = [
        ActionType::SuggestRule,
        ActionType::SuggestMultiple,
        ActionType::NoSuggestion,
    ];

    /// Single or multiple suggestion, by rule count
    pub fn for_rule_count(count: usize) -> Self {
        if count > 1 {
            ActionType::SuggestMultiple
        } else {
            ActionType::SuggestRule
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::SuggestRule => write!(f, "suggest_rule"),
            ActionType::SuggestMultiple => write!(f, "suggest_multiple"),
            ActionType::NoSuggestion => write!(f, "no_suggestion"),
        }
    }
}

/// Time deltas observed around an interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalContext {
    pub time_since_last_snapshot_ms: Option<f64>,
    pub time_since_selection_ms: Option<f64>,
}

/// What the agent sees: the current snapshot and its context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub snapshot_id: String,
    pub artifact_id: String,
    /// Opaque design-document snapshot
    pub snapshot: Value,
    #[serde(default)]
    pub previous_snapshot: Option<Value>,
    #[serde(default)]
    pub user_intent: Option<String>,
    #[serde(default)]
    pub component_id: Option<String>,
    #[serde(default)]
    pub component_type: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub interaction_history: TraceContext,
    #[serde(default)]
    pub temporal_context: TemporalContext,
}

impl Observation {
    pub fn new(
        snapshot_id: impl Into<String>,
        artifact_id: impl Into<String>,
        snapshot: Value,
    ) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            artifact_id: artifact_id.into(),
            snapshot,
            ..Default::default()
        }
    }
}

/// The agent's suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub action_type: ActionType,
    pub suggested_rules: Vec<RuleRecord>,
    #[serde(default)]
    pub confidence_scores: Vec<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl Action {
    pub fn new(action_type: ActionType, suggested_rules: Vec<RuleRecord>) -> Self {
        Self {
            action_type,
            suggested_rules,
            confidence_scores: Vec::new(),
            reasoning: None,
        }
    }

    pub fn no_suggestion() -> Self {
        Self::new(ActionType::NoSuggestion, Vec::new())
    }
}

/// Per-step bookkeeping returned alongside the reward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub episode_step: usize,
    pub total_reward: f64,
    pub action_type: ActionType,
    pub user_response: UserResponse,
    pub num_changes: usize,
}

/// Result of one environment step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: Reward,
    pub done: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStepMetadata {
    pub episode_step: usize,
    pub total_reward: f64,
}

/// One (observation, action, reward) record ready for export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStep {
    pub input: Observation,
    pub action: Action,
    pub reward: Reward,
    pub next_observation: Option<Observation>,
    pub metadata: TrainingStepMetadata,
}
