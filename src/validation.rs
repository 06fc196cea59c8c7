//! Schema checks for rule records and DPO preference pairs
//!
//! Checks run on raw JSON so that every problem in a record is reported,
//! not just the first one serde would stop at.

use crate::error::{DesignPrefError, Result};
use crate::types::{AbstractionLevel, RuleScope};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Longest allowed rule description, in words
pub const MAX_DESCRIPTION_WORDS: usize = 20;

const REQUIRED_RULE_FIELDS: [&str; 6] = [
    "rule_id",
    "description",
    "scope",
    "abstraction_level",
    "triggering_actions",
    "confidence",
];

const REQUIRED_PAIR_FIELDS: [&str; 3] = ["input", "preferred", "rejected"];

fn in_unit_range(value: &Value) -> bool {
    value.as_f64().is_some_and(|v| (0.0..=1.0).contains(&v))
}

/// Every problem found in a rule record; empty when valid
pub fn validate_rule(rule: &Value) -> Vec<String> {
    let Some(fields) = rule.as_object() else {
        return vec!["Rule must be a JSON object".to_string()];
    };
    let mut errors: Vec<String> = REQUIRED_RULE_FIELDS
        .iter()
        .filter(|field| !fields.contains_key(**field))
        .map(|field| format!("Missing required field: {}", field))
        .collect();

    if let Some(confidence) = fields.get("confidence") {
        if !in_unit_range(confidence) {
            errors.push(format!("Invalid confidence: {} (must be 0.0-1.0)", confidence));
        }
    }

    if let Some(description) = fields.get("description") {
        match description.as_str() {
            Some(text) => {
                let words = text.split_whitespace().count();
                if words > MAX_DESCRIPTION_WORDS {
                    errors.push(format!(
                        "Description too long: {} words (max {})",
                        words, MAX_DESCRIPTION_WORDS
                    ));
                }
            }
            None => errors.push("description must be a string".to_string()),
        }
    }

    if let Some(scope) = fields.get("scope") {
        if scope.as_str().and_then(|s| s.parse::<RuleScope>().ok()).is_none() {
            let allowed: Vec<&str> = RuleScope::ALL.iter().map(|s| s.as_str()).collect();
            errors.push(format!("Invalid scope: {} (must be one of {:?})", scope, allowed));
        }
    }

    if let Some(level) = fields.get("abstraction_level") {
        if level
            .as_str()
            .and_then(|s| s.parse::<AbstractionLevel>().ok())
            .is_none()
        {
            errors.push(format!("Invalid abstraction_level: {}", level));
        }
    }

    if let Some(context) = fields.get("platform_context") {
        match context.as_object() {
            Some(pc) => {
                for key in ["platform", "extraction_method"] {
                    if !pc.contains_key(key) {
                        errors.push(format!("platform_context missing '{}'", key));
                    }
                }
            }
            None => errors.push("platform_context must be an object".to_string()),
        }
    }

    errors
}

/// Every problem found in a preference pair; empty when valid
pub fn validate_preference_pair(pair: &Value) -> Vec<String> {
    let Some(fields) = pair.as_object() else {
        return vec!["Preference pair must be a JSON object".to_string()];
    };
    let mut errors: Vec<String> = REQUIRED_PAIR_FIELDS
        .iter()
        .filter(|field| !fields.contains_key(**field))
        .map(|field| format!("Missing required field: {}", field))
        .collect();

    for (side, label) in [("preferred", "Preferred"), ("rejected", "Rejected")] {
        if let Some(rule) = fields.get(side) {
            errors.extend(
                validate_rule(rule)
                    .into_iter()
                    .map(|e| format!("{} rule: {}", label, e)),
            );
        }
    }

    if let Some(weight) = fields.get("weight") {
        if !in_unit_range(weight) {
            errors.push(format!("Invalid weight: {} (must be 0.0-1.0)", weight));
        }
    }

    errors
}

/// Errors for one invalid item of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemErrors {
    pub index: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub errors: Vec<ItemErrors>,
}

impl BatchReport {
    pub fn is_valid(&self) -> bool {
        self.invalid == 0
    }

    /// Fail with the first invalid item, numbered from 1
    pub fn into_result(self) -> Result<Self> {
        match self.errors.first() {
            Some(item) => Err(DesignPrefError::Validation {
                line: item.index + 1,
                message: item.errors.join("; "),
            }),
            None => Ok(self),
        }
    }
}

/// Run `validator` over every item
pub fn validate_batch<F>(items: &[Value], validator: F) -> BatchReport
where
    F: Fn(&Value) -> Vec<String>,
{
    let mut report = BatchReport {
        total: items.len(),
        ..Default::default()
    };
    for (index, item) in items.iter().enumerate() {
        let errors = validator(item);
        if errors.is_empty() {
            report.valid += 1;
        } else {
            report.invalid += 1;
            report.errors.push(ItemErrors { index, errors });
        }
    }
    report
}

/// Parse every non-blank line, failing on the first malformed one
fn read_jsonl_strict(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| DesignPrefError::Parse {
                line: idx + 1,
                message: format!("Invalid JSON - {}", e),
            })
        })
        .collect()
}

/// Validate a rules file
///
/// Lines holding an `intent_rules` array contribute each of its rules;
/// any other line is taken as a single rule.
pub fn validate_rules_file(path: &Path) -> Result<BatchReport> {
    let mut rules = Vec::new();
    for line in read_jsonl_strict(path)? {
        match line.get("intent_rules").and_then(Value::as_array) {
            Some(batch) => rules.extend(batch.iter().cloned()),
            None => rules.push(line),
        }
    }
    Ok(validate_batch(&rules, validate_rule))
}

/// Validate a DPO preferences file
pub fn validate_preferences_file(path: &Path) -> Result<BatchReport> {
    let pairs = read_jsonl_strict(path)?;
    Ok(validate_batch(&pairs, validate_preference_pair))
}
