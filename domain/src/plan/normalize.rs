//! Tolerant plan normalization.
//!
//! Applied by the state machine to plan payloads that re-enter via
//! `agent_result`, after the strict parser has already accepted the
//! planner's reply. Hardens against shape drift: unknown fields are
//! ignored, missing optional fields stay absent, a missing mandatory
//! title is filled with an "Untitled ..." placeholder, a missing role
//! falls back to `"execution"`, and missing task ids become 1-based
//! sequence numbers.

use super::value_objects::{ExecutionTaskDef, Feature, Milestone, PlanDraft};
use serde_json::Value;

pub const DEFAULT_ROLE: &str = "execution";

/// Normalize an arbitrary JSON value into a plan draft.
///
/// Returns `None` only when the value is not a JSON object.
pub fn normalize_plan(value: &Value) -> Option<PlanDraft> {
    if !value.is_object() {
        return None;
    }

    let roadmap = array_of(value, "roadmap")
        .iter()
        .map(|m| Milestone {
            id: string_field(m, "id"),
            title: string_field(m, "title").unwrap_or_else(|| "Untitled milestone".to_string()),
            description: string_field(m, "description"),
            target_date: string_field(m, "targetDate"),
        })
        .collect();

    let features = array_of(value, "features")
        .iter()
        .map(|f| Feature {
            id: string_field(f, "id"),
            title: string_field(f, "title").unwrap_or_else(|| "Untitled feature".to_string()),
            description: string_field(f, "description"),
            dependencies: string_list(f, "dependencies"),
            owners: string_list(f, "owners"),
        })
        .collect();

    let tasks = array_of(value, "tasks")
        .iter()
        .enumerate()
        .map(|(index, t)| ExecutionTaskDef {
            id: string_field(t, "id").unwrap_or_else(|| format!("{}", index + 1)),
            title: string_field(t, "title").unwrap_or_else(|| "Untitled task".to_string()),
            description: string_field(t, "description"),
            role: string_field(t, "role").unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            depends_on: string_list(t, "dependsOn"),
            payload: t.get("payload").filter(|p| !p.is_null()).cloned(),
        })
        .collect();

    Some(PlanDraft {
        roadmap,
        features,
        tasks,
        rationale: string_field(value, "rationale"),
    })
}

fn array_of<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// String coercion: numbers are stringified, null and empty become None
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_full_plan() {
        let value = json!({
            "roadmap": [{"title": "M1", "targetDate": "2026-09-01"}],
            "features": [{"title": "F1", "dependencies": ["F0"]}],
            "tasks": [{"id": "t1", "title": "T1", "role": "backend", "dependsOn": ["t0"]}],
            "rationale": "fastest path"
        });
        let draft = normalize_plan(&value).unwrap();
        assert_eq!(draft.roadmap[0].target_date.as_deref(), Some("2026-09-01"));
        assert_eq!(draft.features[0].dependencies, vec!["F0"]);
        assert_eq!(draft.tasks[0].depends_on, vec!["t0"]);
        assert_eq!(draft.rationale.as_deref(), Some("fastest path"));
    }

    #[test]
    fn test_missing_titles_get_placeholders() {
        let value = json!({
            "roadmap": [{}],
            "features": [{"title": ""}],
            "tasks": [{"description": "do it"}]
        });
        let draft = normalize_plan(&value).unwrap();
        assert_eq!(draft.roadmap[0].title, "Untitled milestone");
        assert_eq!(draft.features[0].title, "Untitled feature");
        assert_eq!(draft.tasks[0].title, "Untitled task");
    }

    #[test]
    fn test_missing_role_and_ids_get_defaults() {
        let value = json!({
            "tasks": [
                {"title": "A"},
                {"id": 7, "title": "B", "role": "testing"},
                {"title": "C"}
            ]
        });
        let draft = normalize_plan(&value).unwrap();
        assert_eq!(draft.tasks[0].id, "1");
        assert_eq!(draft.tasks[0].role, DEFAULT_ROLE);
        assert_eq!(draft.tasks[1].id, "7");
        assert_eq!(draft.tasks[1].role, "testing");
        assert_eq!(draft.tasks[2].id, "3");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let value = json!({
            "tasks": [{"title": "A", "sprint": 3}],
            "confidence": 0.9
        });
        let draft = normalize_plan(&value).unwrap();
        assert_eq!(draft.tasks.len(), 1);
    }

    #[test]
    fn test_non_object_returns_none() {
        assert!(normalize_plan(&json!("plan")).is_none());
        assert!(normalize_plan(&json!([1, 2])).is_none());
    }

    #[test]
    fn test_null_payload_stays_absent() {
        let value = json!({"tasks": [{"title": "A", "payload": null}]});
        let draft = normalize_plan(&value).unwrap();
        assert!(draft.tasks[0].payload.is_none());
    }
}
