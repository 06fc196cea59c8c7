//! Core data types for the designpref pipeline
//!
//! This module defines the rule, interaction and preference-pair structures
//! that flow between the classifier, the reward model, the environment and
//! the synthetic preference generator. Two representations of a rule exist:
//! [`RuleRecord`] is the loose, all-optional shape read from logs and rule
//! batches, and [`Rule`] is the fully typed entity used everywhere else.

use crate::error::{DesignPrefError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Structural reach of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    ArtifactProperty,
    Structural,
    Relational,
    Compositional,
}

impl RuleScope {
    pub const ALL: [RuleScope; 4] = [
        RuleScope::ArtifactProperty,
        RuleScope::Structural,
        RuleScope::Relational,
        RuleScope::Compositional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleScope::ArtifactProperty => "artifact_property",
            RuleScope::Structural => "structural",
            RuleScope::Relational => "relational",
            RuleScope::Compositional => "compositional",
        }
    }
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleScope {
    type Err = DesignPrefError;

    fn from_str(s: &str) -> Result<Self> {
        RuleScope::ALL
            .iter()
            .copied()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| DesignPrefError::InvalidRule(format!("Invalid scope: {}", s)))
    }
}

/// How general a rule is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstractionLevel {
    Specific,
    Intermediate,
    General,
}

impl AbstractionLevel {
    pub const ALL: [AbstractionLevel; 3] = [
        AbstractionLevel::Specific,
        AbstractionLevel::Intermediate,
        AbstractionLevel::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AbstractionLevel::Specific => "specific",
            AbstractionLevel::Intermediate => "intermediate",
            AbstractionLevel::General => "general",
        }
    }
}

impl fmt::Display for AbstractionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbstractionLevel {
    type Err = DesignPrefError;

    fn from_str(s: &str) -> Result<Self> {
        AbstractionLevel::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| {
                DesignPrefError::InvalidRule(format!("Invalid abstraction_level: {}", s))
            })
    }
}

/// How often a rule's pattern shows up in the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternFrequency {
    Common,
    Uncommon,
    Rare,
    #[serde(other)]
    Unknown,
}

/// Where a rule was observed and how it was extracted
///
/// `platform` and `extraction_method` distinguish a missing key (`None`) from
/// a key present with a null value (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformContext {
    #[serde(
        default,
        deserialize_with = "present_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub platform: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,

    #[serde(
        default,
        deserialize_with = "present_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub extraction_method: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoints: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_source: Option<Value>,

    /// Any other keys, kept verbatim for export
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PlatformContext {
    pub fn new(platform: &str, extraction_method: &str) -> Self {
        Self {
            platform: Some(Some(platform.to_string())),
            extraction_method: Some(Some(extraction_method.to_string())),
            ..Default::default()
        }
    }

    pub fn platform_name(&self) -> Option<&str> {
        self.platform.as_ref().and_then(|p| p.as_deref())
    }

    pub fn extraction_method_name(&self) -> Option<&str> {
        self.extraction_method.as_ref().and_then(|m| m.as_deref())
    }

    /// Both `platform` and `extraction_method` keys are present, even if null
    pub fn is_complete(&self) -> bool {
        self.platform.is_some() && self.extraction_method.is_some()
    }

    /// Both `platform` and `extraction_method` carry a non-empty value
    pub fn is_grounded(&self) -> bool {
        non_empty(self.platform_name()) && non_empty(self.extraction_method_name())
    }

    /// An endpoint list or a data source is recorded
    pub fn has_endpoint_or_source(&self) -> bool {
        self.api_endpoints.as_ref().is_some_and(is_truthy)
            || self.data_source.as_ref().is_some_and(is_truthy)
    }
}

/// Training-related annotations attached by the rule generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub novelty_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_frequency: Option<PatternFrequency>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suitable_for_training: Option<bool>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constitutional_signals: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration_detected: Option<bool>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TrainingMetadata {
    pub fn is_suitable(&self) -> bool {
        self.suitable_for_training.unwrap_or(false)
    }

    pub fn iteration_detected(&self) -> bool {
        self.iteration_detected.unwrap_or(false)
    }
}

/// A candidate design-improvement suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub rule_id: String,
    pub description: String,
    pub scope: RuleScope,
    pub abstraction_level: AbstractionLevel,
    #[serde(default)]
    pub triggering_actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_properties: Option<Vec<String>>,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_context: Option<PlatformContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_metadata: Option<TrainingMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_dimension: Option<String>,
    /// Keys outside the rule schema, such as `match_score`, kept for export
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Rule {
    /// Create a rule with the required fields and no optional context
    pub fn new(
        rule_id: impl Into<String>,
        description: impl Into<String>,
        scope: RuleScope,
        abstraction_level: AbstractionLevel,
        confidence: f64,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            description: description.into(),
            scope,
            abstraction_level,
            triggering_actions: Vec::new(),
            artifact_properties: None,
            confidence,
            platform_context: None,
            training_metadata: None,
            design_dimension: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_platform_context(mut self, context: PlatformContext) -> Self {
        self.platform_context = Some(context);
        self
    }

    pub fn with_training_metadata(mut self, metadata: TrainingMetadata) -> Self {
        self.training_metadata = Some(metadata);
        self
    }

    pub fn with_artifact_properties(mut self, properties: Vec<String>) -> Self {
        self.artifact_properties = Some(properties);
        self
    }

    pub fn with_design_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.design_dimension = Some(dimension.into());
        self
    }

    /// Lower-cased platform name, or "unknown"
    pub fn platform(&self) -> String {
        self.platform_context
            .as_ref()
            .and_then(|pc| pc.platform_name())
            .filter(|p| !p.is_empty())
            .map(|p| p.to_lowercase())
            .unwrap_or_else(|| "unknown".to_string())
    }

    pub fn word_count(&self) -> usize {
        self.description.split_whitespace().count()
    }
}

const MATCH_SCORE_KEY: &str = "match_score";
const DIMENSION_KEY: &str = "dimension";

/// Loosely-typed rule as it appears in rule batches and interaction logs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstraction_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggering_actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_properties: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_context: Option<PlatformContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_metadata: Option<TrainingMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_dimension: Option<String>,
    /// Short dimension label used by suggestion logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    /// Matcher score attached when the rule was suggested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TryFrom<RuleRecord> for Rule {
    type Error = DesignPrefError;

    fn try_from(record: RuleRecord) -> Result<Self> {
        let rule_id = record
            .rule_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DesignPrefError::InvalidRule("Missing rule_id".to_string()))?;

        let scope = match record.scope.as_deref() {
            Some(s) => s.parse()?,
            None => RuleScope::Structural,
        };
        let abstraction_level = match record.abstraction_level.as_deref() {
            Some(s) => s.parse()?,
            None => AbstractionLevel::Intermediate,
        };

        let mut extra = record.extra;
        if let Some(score) = record.match_score {
            extra.insert(MATCH_SCORE_KEY.to_string(), Value::from(score));
        }
        if let Some(dimension) = &record.dimension {
            extra.insert(DIMENSION_KEY.to_string(), Value::from(dimension.as_str()));
        }

        Ok(Rule {
            rule_id,
            description: record.description.unwrap_or_default(),
            scope,
            abstraction_level,
            triggering_actions: record.triggering_actions.unwrap_or_default(),
            artifact_properties: record.artifact_properties,
            confidence: record.confidence.unwrap_or(0.5),
            platform_context: record.platform_context,
            training_metadata: record.training_metadata,
            design_dimension: record.design_dimension.or(record.dimension),
            extra,
        })
    }
}

impl From<&Rule> for RuleRecord {
    fn from(rule: &Rule) -> Self {
        let mut extra = rule.extra.clone();
        let match_score = extra.remove(MATCH_SCORE_KEY).and_then(|v| v.as_f64());
        let dimension = extra
            .remove(DIMENSION_KEY)
            .and_then(|v| v.as_str().map(str::to_string));

        RuleRecord {
            rule_id: Some(rule.rule_id.clone()),
            description: Some(rule.description.clone()),
            scope: Some(rule.scope.to_string()),
            abstraction_level: Some(rule.abstraction_level.to_string()),
            triggering_actions: Some(rule.triggering_actions.clone()),
            artifact_properties: rule.artifact_properties.clone(),
            confidence: Some(rule.confidence),
            platform_context: rule.platform_context.clone(),
            training_metadata: rule.training_metadata.clone(),
            design_dimension: rule.design_dimension.clone(),
            dimension,
            match_score,
            extra,
        }
    }
}

/// Context of the trace that produced a set of rules or an interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_since_last_snapshot_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_since_selection_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_snapshot_id: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TraceContext {
    pub fn for_trace(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: Some(trace_id.into()),
            ..Default::default()
        }
    }
}

/// Rules generated from one trace
#[derive(Debug, Clone, PartialEq)]
pub struct TraceBatch {
    pub trace_id: String,
    pub rules: Vec<Rule>,
}

/// What produced a preference pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceSource {
    Confidence,
    Quality,
    Completeness,
    Novelty,
    Frequency,
    Constitutional,
    UserFeedback,
}

impl PreferenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceSource::Confidence => "confidence",
            PreferenceSource::Quality => "quality",
            PreferenceSource::Completeness => "completeness",
            PreferenceSource::Novelty => "novelty",
            PreferenceSource::Frequency => "frequency",
            PreferenceSource::Constitutional => "constitutional",
            PreferenceSource::UserFeedback => "user_feedback",
        }
    }
}

impl fmt::Display for PreferenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (preferred, rejected) training example
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferencePair {
    pub preferred: Rule,
    pub rejected: Rule,
    pub source: PreferenceSource,
    pub synthetic: bool,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_context: Option<TraceContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_group: Option<String>,
}

impl PreferencePair {
    /// Ordered key used for deduplication
    pub fn key(&self) -> (&str, &str) {
        (&self.preferred.rule_id, &self.rejected.rule_id)
    }
}

/// How the user responded to a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserResponse {
    Accepted,
    #[serde(alias = "dismissed")]
    Rejected,
    Modified,
    #[default]
    Ignored,
}

impl UserResponse {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserResponse::Accepted => "accepted",
            UserResponse::Rejected => "rejected",
            UserResponse::Modified => "modified",
            UserResponse::Ignored => "ignored",
        }
    }
}

impl fmt::Display for UserResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The action recorded for an interaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserAction {
    #[serde(rename = "type", default)]
    pub response: UserResponse,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
}

/// A single change produced by the diffing system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

impl ChangeRecord {
    pub fn property(name: &str) -> Self {
        Self {
            change_type: Some("modified".to_string()),
            change_scope: Some("property".to_string()),
            property_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn is_property_scope(&self) -> bool {
        self.change_scope.as_deref() == Some("property")
    }
}

/// One observed user response to a set of suggested rules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub snapshot_id: String,
    #[serde(default)]
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default)]
    pub suggested_rules: Vec<RuleRecord>,
    #[serde(default)]
    pub user_action: UserAction,
    #[serde(default)]
    pub trace_context: TraceContext,
}

/// Loose JSON truthiness: null, false, 0, "" and empty containers are false
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.is_empty())
}

/// Deserialize a key that may hold null, keeping the fact that it was present
fn present_key<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
