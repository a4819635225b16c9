// summary.rs — Reduce a plan document to bounded counts and details.
//
// Counts are exact (`len()` of each bucket, never sampled). Only the
// `details` lists are capped, at DETAIL_LIMIT entries per key, and only
// mutating actions on reviewable categories are itemized.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::document::{ChangeAction, ChangeBucket, ChangePlanDocument, ResourceCategory};

/// Maximum entries per `details` list.
pub const DETAIL_LIMIT: usize = 10;

/// Longest raw-item fallback rendering, in characters.
const RAW_FALLBACK_CHARS: usize = 80;

/// Exact per-action counts for one resource category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub new: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
    #[serde(rename = "noChange")]
    pub no_change: usize,
}

impl ActionCounts {
    fn of(bucket: &ChangeBucket) -> Self {
        Self {
            new: bucket.new.len(),
            update: bucket.update.len(),
            replace: bucket.replace.len(),
            delete: bucket.delete.len(),
            no_change: bucket.no_change_count(),
        }
    }
}

/// Bounded, JSON-serializable summary of a plan document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanSummary {
    #[serde(rename = "policyDefinitions")]
    pub policy_definitions: ActionCounts,
    #[serde(rename = "policySetDefinitions")]
    pub policy_set_definitions: ActionCounts,
    #[serde(rename = "policyAssignments")]
    pub policy_assignments: ActionCounts,
    #[serde(rename = "policyExemptions")]
    pub policy_exemptions: ActionCounts,
    /// `"<category>.<action>"` → up to [`DETAIL_LIMIT`] display strings,
    /// in document order. Keys with no items are omitted.
    pub details: BTreeMap<String, Vec<String>>,
}

impl PlanSummary {
    pub fn counts(&self, category: ResourceCategory) -> &ActionCounts {
        match category {
            ResourceCategory::Definitions => &self.policy_definitions,
            ResourceCategory::SetDefinitions => &self.policy_set_definitions,
            ResourceCategory::Assignments => &self.policy_assignments,
            ResourceCategory::Exemptions => &self.policy_exemptions,
        }
    }
}

/// Summarize a plan document. Pure: no I/O, deterministic for equal inputs.
pub fn summarize(document: &ChangePlanDocument) -> PlanSummary {
    let mut details = BTreeMap::new();
    for category in ResourceCategory::REVIEWABLE {
        let bucket = document.bucket(category);
        for action in ChangeAction::MUTATING {
            let items = bucket.items_for(action);
            if items.is_empty() {
                continue;
            }
            let rendered: Vec<String> = items
                .iter()
                .take(DETAIL_LIMIT)
                .map(display_string)
                .collect();
            details.insert(format!("{}.{}", category.key(), action.key()), rendered);
        }
    }

    PlanSummary {
        policy_definitions: ActionCounts::of(&document.policy_definitions),
        policy_set_definitions: ActionCounts::of(&document.policy_set_definitions),
        policy_assignments: ActionCounts::of(&document.policy_assignments),
        policy_exemptions: ActionCounts::of(&document.policy_exemptions),
        details,
    }
}

/// Render one change item for human review: `displayName`, else `name`,
/// else a truncated dump of the raw value. Always yields a printable
/// string, even for malformed items.
fn display_string(item: &Value) -> String {
    if let Some(name) = item.get("displayName").and_then(Value::as_str) {
        return name.to_string();
    }
    if let Some(name) = item.get("name").and_then(Value::as_str) {
        return name.to_string();
    }
    item.to_string().chars().take(RAW_FALLBACK_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> ChangePlanDocument {
        ChangePlanDocument::from_value(&value).unwrap()
    }

    #[test]
    fn counts_match_bucket_lengths_exactly() {
        let doc = parse(json!({
            "policyDefinitions": {
                "new": [{}, {}, {}],
                "update": [{}],
                "replace": [{}, {}],
                "delete": [],
                "noChange": [{}, {}, {}, {}],
            }
        }));
        let summary = summarize(&doc);
        assert_eq!(
            summary.policy_definitions,
            ActionCounts {
                new: 3,
                update: 1,
                replace: 2,
                delete: 0,
                no_change: 4
            }
        );
    }

    #[test]
    fn missing_category_reports_all_zero() {
        let summary = summarize(&parse(json!({
            "policyAssignments": { "new": [{}] }
        })));
        assert_eq!(summary.policy_exemptions, ActionCounts::default());
        assert_eq!(summary.policy_set_definitions, ActionCounts::default());
    }

    #[test]
    fn assignment_scenario_from_review_workflow() {
        let summary = summarize(&parse(json!({
            "policyAssignments": {
                "new": [{"displayName": "A"}, {"name": "B"}],
                "delete": [],
            }
        })));
        assert_eq!(summary.policy_assignments.new, 2);
        assert_eq!(summary.policy_assignments.delete, 0);
        assert_eq!(summary.policy_definitions, ActionCounts::default());
        assert_eq!(
            summary.details["policyAssignments.new"],
            vec!["A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn details_are_capped_but_counts_are_not() {
        let items: Vec<Value> = (0..1000)
            .map(|i| json!({"displayName": format!("policy-{i}")}))
            .collect();
        let summary = summarize(&parse(json!({
            "policyDefinitions": { "new": items }
        })));
        assert_eq!(summary.policy_definitions.new, 1000);
        let rendered = &summary.details["policyDefinitions.new"];
        assert_eq!(rendered.len(), DETAIL_LIMIT);
        assert_eq!(rendered[0], "policy-0");
        assert_eq!(rendered[9], "policy-9");
    }

    #[test]
    fn exemptions_are_counted_but_never_itemized() {
        let summary = summarize(&parse(json!({
            "policyExemptions": { "new": [{"displayName": "Exempt prod"}] }
        })));
        assert_eq!(summary.policy_exemptions.new, 1);
        assert!(summary.details.is_empty());
    }

    #[test]
    fn replace_and_no_change_are_never_itemized() {
        let summary = summarize(&parse(json!({
            "policyDefinitions": {
                "replace": [{"displayName": "R"}],
                "noChange": [{"displayName": "N"}],
            }
        })));
        assert!(summary.details.is_empty());
    }

    #[test]
    fn display_string_prefers_display_name_then_name() {
        assert_eq!(
            display_string(&json!({"displayName": "Pretty", "name": "ugly-id"})),
            "Pretty"
        );
        assert_eq!(display_string(&json!({"name": "ugly-id"})), "ugly-id");
    }

    #[test]
    fn malformed_item_degrades_to_truncated_raw_text() {
        let long_value = "x".repeat(300);
        let rendered = display_string(&json!({"weird": long_value}));
        assert_eq!(rendered.chars().count(), 80);
        assert!(rendered.starts_with("{\"weird\""));
    }

    #[test]
    fn non_object_items_still_render() {
        let summary = summarize(&parse(json!({
            "policyAssignments": { "new": [42, null, "plain"] }
        })));
        assert_eq!(
            summary.details["policyAssignments.new"],
            vec!["42", "null", "\"plain\""]
        );
    }

    #[test]
    fn summarize_is_deterministic() {
        let doc = parse(json!({
            "policyAssignments": {
                "new": [{"displayName": "A"}],
                "unchanged": [{}, {}],
            }
        }));
        assert_eq!(summarize(&doc), summarize(&doc));
    }

    #[test]
    fn serializes_to_the_documented_shape() {
        let summary = summarize(&parse(json!({
            "policyAssignments": { "new": [{"displayName": "A"}] }
        })));
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["policyAssignments"]["new"], 1);
        assert_eq!(value["policyAssignments"]["noChange"], 0);
        assert_eq!(value["details"]["policyAssignments.new"][0], "A");
    }
}
