//! Plan snapshot entity

use super::value_objects::{ExecutionTaskDef, Feature, Milestone, PlanDraft};
use crate::ident::deterministic_id;
use serde::{Deserialize, Serialize};

/// An immutable, content-addressed plan (Entity).
///
/// The id is derived from the normalized content only, so proposing
/// the same plan twice yields the same snapshot and the project's plan
/// map deduplicates naturally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshot {
    pub id: String,
    pub created_at: String,
    pub roadmap: Vec<Milestone>,
    pub features: Vec<Feature>,
    pub tasks: Vec<ExecutionTaskDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl PlanSnapshot {
    /// Freeze a draft into a snapshot. `created_at` is not part of the
    /// content hash.
    pub fn from_draft(draft: PlanDraft, now: &str) -> Self {
        let content = serde_json::to_value(&draft).unwrap_or(serde_json::Value::Null);
        Self {
            id: deterministic_id("plan", &content),
            created_at: now.to_string(),
            roadmap: draft.roadmap,
            features: draft.features,
            tasks: draft.tasks,
            rationale: draft.rationale,
        }
    }
}
