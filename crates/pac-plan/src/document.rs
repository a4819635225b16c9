// document.rs — Lenient model of the generated plan document.
//
// The upstream format is loosely typed JSON: categories and action keys
// may be absent, and older plans use `unchanged` where newer ones write
// `noChange`. Every missing key defaults to empty rather than erroring;
// only a non-object top level is rejected.

use serde_json::{Map, Value};

use crate::error::PlanError;

/// The fixed set of resource categories a plan document may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceCategory {
    Definitions,
    SetDefinitions,
    Assignments,
    Exemptions,
}

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 4] = [
        ResourceCategory::Definitions,
        ResourceCategory::SetDefinitions,
        ResourceCategory::Assignments,
        ResourceCategory::Exemptions,
    ];

    /// Categories whose changes are surfaced in the review details.
    /// Exemptions are counted but never itemized.
    pub const REVIEWABLE: [ResourceCategory; 3] = [
        ResourceCategory::Definitions,
        ResourceCategory::SetDefinitions,
        ResourceCategory::Assignments,
    ];

    /// The key this category uses in plan documents and definition folders.
    pub fn key(self) -> &'static str {
        match self {
            ResourceCategory::Definitions => "policyDefinitions",
            ResourceCategory::SetDefinitions => "policySetDefinitions",
            ResourceCategory::Assignments => "policyAssignments",
            ResourceCategory::Exemptions => "policyExemptions",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

/// Action kinds a change bucket is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    New,
    Update,
    Replace,
    Delete,
    NoChange,
}

impl ChangeAction {
    /// Actions that mutate the environment; only these appear in details.
    pub const MUTATING: [ChangeAction; 3] =
        [ChangeAction::New, ChangeAction::Update, ChangeAction::Delete];

    pub fn key(self) -> &'static str {
        match self {
            ChangeAction::New => "new",
            ChangeAction::Update => "update",
            ChangeAction::Replace => "replace",
            ChangeAction::Delete => "delete",
            ChangeAction::NoChange => "noChange",
        }
    }
}

/// Change items for one resource category, bucketed by action kind.
///
/// `no_change` and `unchanged` are kept apart so precedence is explicit:
/// `noChange` wins when both keys are present in the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeBucket {
    pub new: Vec<Value>,
    pub update: Vec<Value>,
    pub replace: Vec<Value>,
    pub delete: Vec<Value>,
    pub no_change: Option<Vec<Value>>,
    pub unchanged: Option<Vec<Value>>,
}

impl ChangeBucket {
    fn from_value(value: Option<&Value>) -> Self {
        let Some(obj) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        Self {
            new: items(obj, "new"),
            update: items(obj, "update"),
            replace: items(obj, "replace"),
            delete: items(obj, "delete"),
            no_change: optional_items(obj, "noChange"),
            unchanged: optional_items(obj, "unchanged"),
        }
    }

    /// Items for a mutating action (empty slice for `NoChange`, which is
    /// never itemized).
    pub fn items_for(&self, action: ChangeAction) -> &[Value] {
        match action {
            ChangeAction::New => &self.new,
            ChangeAction::Update => &self.update,
            ChangeAction::Replace => &self.replace,
            ChangeAction::Delete => &self.delete,
            ChangeAction::NoChange => &[],
        }
    }

    /// Count of unchanged items, preferring the `noChange` key and falling
    /// back to the legacy `unchanged` spelling.
    pub fn no_change_count(&self) -> usize {
        self.no_change
            .as_ref()
            .or(self.unchanged.as_ref())
            .map_or(0, Vec::len)
    }
}

fn items(obj: &Map<String, Value>, key: &str) -> Vec<Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn optional_items(obj: &Map<String, Value>, key: &str) -> Option<Vec<Value>> {
    obj.get(key).and_then(Value::as_array).cloned()
}

/// A parsed plan document: one [`ChangeBucket`] per fixed resource category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangePlanDocument {
    pub policy_definitions: ChangeBucket,
    pub policy_set_definitions: ChangeBucket,
    pub policy_assignments: ChangeBucket,
    pub policy_exemptions: ChangeBucket,
}

impl ChangePlanDocument {
    /// Parse a plan document from raw JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, PlanError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| PlanError::MalformedPlan(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Parse a plan document from an already-decoded JSON value.
    pub fn from_value(value: &Value) -> Result<Self, PlanError> {
        let obj = value.as_object().ok_or_else(|| {
            PlanError::MalformedPlan("top level must be a JSON object".to_string())
        })?;
        Ok(Self {
            policy_definitions: ChangeBucket::from_value(obj.get("policyDefinitions")),
            policy_set_definitions: ChangeBucket::from_value(obj.get("policySetDefinitions")),
            policy_assignments: ChangeBucket::from_value(obj.get("policyAssignments")),
            policy_exemptions: ChangeBucket::from_value(obj.get("policyExemptions")),
        })
    }

    pub fn bucket(&self, category: ResourceCategory) -> &ChangeBucket {
        match category {
            ResourceCategory::Definitions => &self.policy_definitions,
            ResourceCategory::SetDefinitions => &self.policy_set_definitions,
            ResourceCategory::Assignments => &self.policy_assignments,
            ResourceCategory::Exemptions => &self.policy_exemptions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_categories_default_to_empty() {
        let doc = ChangePlanDocument::from_value(&json!({})).unwrap();
        for category in ResourceCategory::ALL {
            let bucket = doc.bucket(category);
            assert!(bucket.new.is_empty());
            assert_eq!(bucket.no_change_count(), 0);
        }
    }

    #[test]
    fn top_level_array_is_malformed() {
        let err = ChangePlanDocument::from_json_str("[1, 2]").unwrap_err();
        assert!(matches!(err, PlanError::MalformedPlan(_)));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = ChangePlanDocument::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, PlanError::MalformedPlan(_)));
    }

    #[test]
    fn no_change_key_wins_over_unchanged() {
        let doc = ChangePlanDocument::from_value(&json!({
            "policyAssignments": {
                "noChange": [{}, {}],
                "unchanged": [{}, {}, {}, {}, {}],
            }
        }))
        .unwrap();
        assert_eq!(doc.policy_assignments.no_change_count(), 2);
    }

    #[test]
    fn unchanged_is_the_fallback_spelling() {
        let doc = ChangePlanDocument::from_value(&json!({
            "policyAssignments": { "unchanged": [{}, {}, {}] }
        }))
        .unwrap();
        assert_eq!(doc.policy_assignments.no_change_count(), 3);
    }

    #[test]
    fn non_array_action_degrades_to_empty() {
        let doc = ChangePlanDocument::from_value(&json!({
            "policyDefinitions": { "new": "surprise" }
        }))
        .unwrap();
        assert!(doc.policy_definitions.new.is_empty());
    }

    #[test]
    fn category_keys_round_trip() {
        for category in ResourceCategory::ALL {
            assert_eq!(ResourceCategory::from_key(category.key()), Some(category));
        }
        assert_eq!(ResourceCategory::from_key("roleAssignments"), None);
    }
}
