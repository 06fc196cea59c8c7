//! Partitioning of a rule pool by dimension, platform and artifact type

use crate::classifier::DimensionClassifier;
use crate::types::Rule;
use std::collections::HashMap;

/// Which labels participate in the group key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingMode {
    pub by_dimension: bool,
    pub by_platform: bool,
    pub by_artifact: bool,
}

impl GroupingMode {
    pub const ALL: GroupingMode = GroupingMode {
        by_dimension: true,
        by_platform: true,
        by_artifact: true,
    };

    pub const NONE: GroupingMode = GroupingMode {
        by_dimension: false,
        by_platform: false,
        by_artifact: false,
    };
}

/// Labels of one partition; only enabled labels are set
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupLabels {
    pub dimension: Option<String>,
    pub platform: Option<String>,
    pub artifact: Option<String>,
}

impl GroupLabels {
    /// "dimension:platform:artifact" over the set labels, or "all"
    pub fn key(&self) -> String {
        let parts: Vec<&str> = [&self.dimension, &self.platform, &self.artifact]
            .into_iter()
            .filter_map(|label| label.as_deref())
            .collect();
        if parts.is_empty() {
            "all".to_string()
        } else {
            parts.join(":")
        }
    }
}

/// Rules sharing the same labels, in input order
#[derive(Debug, Clone)]
pub struct RuleGroup<'a> {
    pub labels: GroupLabels,
    pub rules: Vec<&'a Rule>,
}

/// Artifact type from property names, then from the description
pub fn infer_artifact_type(rule: &Rule) -> &'static str {
    if let Some(properties) = rule.artifact_properties.as_ref().filter(|p| !p.is_empty()) {
        let lower: Vec<String> = properties.iter().map(|p| p.to_lowercase()).collect();
        let any = |needles: &[&str]| lower.iter().any(|p| needles.iter().any(|n| p.contains(n)));

        if any(&["text", "font"]) {
            return "text";
        } else if any(&["vector", "path"]) {
            return "vector";
        } else if any(&["frame", "container"]) {
            return "frame";
        } else if any(&["component"]) {
            return "component";
        }
    }

    let description = rule.description.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| description.contains(n));
    if has(&["text", "typography"]) {
        "text"
    } else if has(&["vector", "shape"]) {
        "vector"
    } else if has(&["frame", "container"]) {
        "frame"
    } else if has(&["component"]) {
        "component"
    } else {
        "general"
    }
}

/// Labels for a single rule under `mode`
pub fn labels_for(
    rule: &Rule,
    classifier: &DimensionClassifier,
    mode: GroupingMode,
) -> GroupLabels {
    GroupLabels {
        dimension: mode
            .by_dimension
            .then(|| classifier.classify_rule(rule).dimension),
        platform: mode.by_platform.then(|| rule.platform()),
        artifact: mode
            .by_artifact
            .then(|| infer_artifact_type(rule).to_string()),
    }
}

/// Partition rules into groups, ordered by first appearance
pub fn partition<'a>(
    rules: &'a [Rule],
    classifier: &DimensionClassifier,
    mode: GroupingMode,
) -> Vec<RuleGroup<'a>> {
    let mut groups: Vec<RuleGroup<'a>> = Vec::new();
    let mut index: HashMap<GroupLabels, usize> = HashMap::new();

    for rule in rules {
        let labels = labels_for(rule, classifier, mode);
        match index.get(&labels) {
            Some(&i) => groups[i].rules.push(rule),
            None => {
                index.insert(labels.clone(), groups.len());
                groups.push(RuleGroup {
                    labels,
                    rules: vec![rule],
                });
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AbstractionLevel, PlatformContext, RuleScope};

    fn rule(id: &str, description: &str) -> Rule {
        Rule::new(
            id,
            description,
            RuleScope::Structural,
            AbstractionLevel::Specific,
            0.5,
        )
    }

    #[test]
    fn test_artifact_from_properties_first() {
        let r = rule("r1", "Round the container corners")
            .with_artifact_properties(vec!["fontSize".to_string()]);
        assert_eq!(infer_artifact_type(&r), "text");

        let r = rule("r1", "Round the corners")
            .with_artifact_properties(vec!["vectorPaths".to_string()]);
        assert_eq!(infer_artifact_type(&r), "vector");
    }

    #[test]
    fn test_artifact_from_description() {
        assert_eq!(infer_artifact_type(&rule("r1", "Pad the container")), "frame");
        assert_eq!(infer_artifact_type(&rule("r1", "Simplify the shape")), "vector");
        assert_eq!(infer_artifact_type(&rule("r1", "Reuse the button component")), "component");
        assert_eq!(infer_artifact_type(&rule("r1", "Make it pop")), "general");

        // Unmatched properties fall through to the description
        let r = rule("r1", "Bigger typography")
            .with_artifact_properties(vec!["opacity".to_string()]);
        assert_eq!(infer_artifact_type(&r), "text");
    }

    #[test]
    fn test_group_keys() {
        let full = GroupLabels {
            dimension: Some("layout".into()),
            platform: Some("figma".into()),
            artifact: Some("frame".into()),
        };
        assert_eq!(full.key(), "layout:figma:frame");

        let partial = GroupLabels {
            platform: Some("figma".into()),
            artifact: Some("frame".into()),
            ..Default::default()
        };
        assert_eq!(partial.key(), "figma:frame");
        assert_eq!(GroupLabels::default().key(), "all");
    }

    #[test]
    fn test_partition_orders_by_first_appearance() {
        let classifier = DimensionClassifier::new();
        let figma = PlatformContext::new("Figma", "plugin_api");
        let rules = vec![
            rule("a", "Align to grid").with_platform_context(figma.clone()),
            rule("b", "Increase spacing"),
            rule("c", "Grid layout tweaks").with_platform_context(figma),
        ];

        let groups = partition(&rules, &classifier, GroupingMode::ALL);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].labels.key(), "layout:figma:general");
        assert_eq!(groups[0].rules.len(), 2);
        assert_eq!(groups[1].labels.key(), "spacing:unknown:general");

        let groups = partition(&rules, &classifier, GroupingMode::NONE);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].labels.key(), "all");
    }
}
