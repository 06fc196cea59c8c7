//! Conversion from logged preference events to environment transitions

use super::types::{Action, ActionType, Observation, TemporalContext, TrainingStep};
use super::DesignEnvironment;
use crate::reward::{Reward, RewardModel, RewardWeights};
use crate::types::{ChangeRecord, PreferenceEvent};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Confidence used for suggested rules that carry no match score
const DEFAULT_MATCH_SCORE: f64 = 0.5;

/// Artifact type recorded in a snapshot's metadata, if any
pub fn snapshot_artifact_type(snapshot: &Value) -> Option<String> {
    snapshot
        .pointer("/metadata/artifact_type")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Build the (observation, action, reward) triple for one logged event
pub fn from_preference_event(
    event: &PreferenceEvent,
    snapshot: Value,
    previous_snapshot: Option<Value>,
    changes: Option<&[ChangeRecord]>,
    weights: RewardWeights,
) -> (Observation, Action, Reward) {
    let trace = &event.trace_context;

    let observation = Observation {
        snapshot_id: event.snapshot_id.clone(),
        artifact_id: event.artifact_id.clone(),
        component_type: snapshot_artifact_type(&snapshot),
        snapshot,
        previous_snapshot,
        user_intent: trace.user_intent.clone(),
        component_id: trace.component_id.clone(),
        platform: trace.platform.clone(),
        interaction_history: trace.clone(),
        temporal_context: TemporalContext {
            time_since_last_snapshot_ms: trace.time_since_last_snapshot_ms,
            time_since_selection_ms: trace.time_since_selection_ms,
        },
    };

    let action = Action {
        action_type: ActionType::for_rule_count(event.suggested_rules.len()),
        confidence_scores: event
            .suggested_rules
            .iter()
            .map(|r| r.match_score.unwrap_or(DEFAULT_MATCH_SCORE))
            .collect(),
        suggested_rules: event.suggested_rules.clone(),
        reasoning: None,
    };

    let reward = RewardModel::new(weights).compute_reward(
        &action,
        event.user_action.response,
        changes,
        event.user_action.duration_ms,
    );

    (observation, action, reward)
}

/// Convert a sequence of events into training steps
///
/// Events whose snapshot is missing are skipped. The previous snapshot is
/// linked through `trace_context.previous_snapshot_id`.
pub fn trajectories_from_events(
    events: &[PreferenceEvent],
    snapshots: &HashMap<String, Value>,
    changes: &HashMap<String, Vec<ChangeRecord>>,
    weights: RewardWeights,
) -> Vec<TrainingStep> {
    let env = DesignEnvironment::new(weights);
    let mut steps = Vec::new();

    for event in events {
        let Some(snapshot) = snapshots.get(&event.snapshot_id) else {
            warn!(
                "Skipping event for snapshot {}: snapshot not found",
                event.snapshot_id
            );
            continue;
        };

        let previous = event
            .trace_context
            .previous_snapshot_id
            .as_ref()
            .and_then(|id| snapshots.get(id))
            .cloned();
        let snapshot_changes = changes
            .get(&event.snapshot_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let (observation, action, reward) = from_preference_event(
            event,
            snapshot.clone(),
            previous,
            Some(snapshot_changes),
            weights,
        );
        steps.push(env.format_for_training(observation, action, reward, None));
    }

    debug!("Built {} trajectory steps from {} events", steps.len(), events.len());
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RuleRecord, UserResponse};
    use serde_json::json;

    fn event(snapshot_id: &str, response: &str, rules: usize) -> PreferenceEvent {
        let suggested: Vec<Value> = (0..rules)
            .map(|i| {
                json!({
                    "rule_id": format!("r{}", i),
                    "description": "Tighten spacing",
                    "match_score": 0.8
                })
            })
            .collect();
        serde_json::from_value(json!({
            "snapshot_id": snapshot_id,
            "artifact_id": "file-1",
            "suggested_rules": suggested,
            "user_action": {"type": response, "rule_id": "r0", "duration_ms": 2000.0},
            "trace_context": {
                "user_intent": "clean up the card",
                "component_id": "1:23",
                "time_since_selection_ms": 450.0,
                "previous_snapshot_id": "s0"
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_from_preference_event() {
        let snapshot = json!({"metadata": {"snapshot_id": "s1", "artifact_type": "frame"}});
        let (obs, action, reward) = from_preference_event(
            &event("s1", "accepted", 2),
            snapshot,
            None,
            None,
            RewardWeights::default(),
        );

        assert_eq!(obs.user_intent.as_deref(), Some("clean up the card"));
        assert_eq!(obs.component_type.as_deref(), Some("frame"));
        assert_eq!(obs.temporal_context.time_since_selection_ms, Some(450.0));
        assert_eq!(obs.temporal_context.time_since_last_snapshot_ms, None);
        assert_eq!(action.action_type, ActionType::SuggestMultiple);
        assert_eq!(action.confidence_scores, vec![0.8, 0.8]);
        assert_eq!(reward.metadata.user_response, UserResponse::Accepted);
        assert!((reward.value - 1.15).abs() < 0.001);
    }

    #[test]
    fn test_missing_match_score_defaults() {
        let mut ev = event("s1", "rejected", 0);
        ev.suggested_rules.push(RuleRecord {
            rule_id: Some("r9".to_string()),
            ..Default::default()
        });
        let (_, action, _) =
            from_preference_event(&ev, Value::Null, None, None, RewardWeights::default());
        assert_eq!(action.action_type, ActionType::SuggestRule);
        assert_eq!(action.confidence_scores, vec![0.5]);
    }

    #[test]
    fn test_trajectories_skip_missing_snapshots() {
        let mut snapshots = HashMap::new();
        snapshots.insert("s0".to_string(), json!({"metadata": {"snapshot_id": "s0"}}));
        snapshots.insert("s1".to_string(), json!({"metadata": {"snapshot_id": "s1"}}));

        let mut changes = HashMap::new();
        changes.insert("s1".to_string(), vec![ChangeRecord::property("fill")]);

        let events = vec![event("s1", "modified", 2), event("missing", "accepted", 2)];
        let steps =
            trajectories_from_events(&events, &snapshots, &changes, RewardWeights::default());

        assert_eq!(steps.len(), 1);
        let step = &steps[0];
        assert!(step.input.previous_snapshot.is_some());
        assert_eq!(step.reward.metadata.num_changes, 1);
        assert_eq!(step.metadata.episode_step, 0);
    }
}
