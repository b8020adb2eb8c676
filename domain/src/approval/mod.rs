//! Approval requests: the user gates of the lifecycle

use crate::ident::deterministic_id;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// What an approval unlocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    /// Adopt a proposed plan
    Plan,
    /// Start executing an adopted plan
    ExecutionStart,
    /// Re-dispatch previously failed tasks
    ExecutionRetry,
}

impl ApprovalKind {
    pub fn as_str(&self) -> &str {
        match self {
            ApprovalKind::Plan => "plan",
            ApprovalKind::ExecutionStart => "execution_start",
            ApprovalKind::ExecutionRetry => "execution_retry",
        }
    }

    /// Approvals that gate task dispatch
    pub fn gates_execution(&self) -> bool {
        matches!(self, ApprovalKind::ExecutionStart | ApprovalKind::ExecutionRetry)
    }
}

/// A pending user gate (Entity). Consumed exactly once: consuming an
/// approval removes it from the project's approval list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ApprovalKind,
    pub requested_at: String,
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub task_ids: Vec<String>,
}

impl ApprovalRequest {
    /// Request approval to adopt a plan.
    pub fn plan(
        plan_id: &str,
        details: serde_json::Map<String, serde_json::Value>,
        now: &str,
    ) -> Self {
        let id = deterministic_id(
            "approval",
            &json!({"type": "plan", "planId": plan_id, "requestedAt": now}),
        );
        Self {
            id,
            kind: ApprovalKind::Plan,
            requested_at: now.to_string(),
            details,
            plan_id: Some(plan_id.to_string()),
            task_ids: Vec::new(),
        }
    }

    /// Request approval to start executing the given tasks.
    pub fn execution_start(task_ids: Vec<String>, now: &str) -> Self {
        Self::execution(ApprovalKind::ExecutionStart, task_ids, now)
    }

    /// Request approval to retry the given failed tasks.
    pub fn execution_retry(task_ids: Vec<String>, now: &str) -> Self {
        Self::execution(ApprovalKind::ExecutionRetry, task_ids, now)
    }

    fn execution(kind: ApprovalKind, task_ids: Vec<String>, now: &str) -> Self {
        let id = deterministic_id(
            "approval",
            &json!({"type": kind.as_str(), "taskIds": task_ids, "requestedAt": now}),
        );
        let mut details = serde_json::Map::new();
        details.insert("taskCount".to_string(), json!(task_ids.len()));
        Self {
            id,
            kind,
            requested_at: now.to_string(),
            details,
            plan_id: None,
            task_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: &str = "2026-01-01T00:00:01.000Z";

    #[test]
    fn test_plan_approval_id_is_deterministic() {
        let a = ApprovalRequest::plan("plan-abc", serde_json::Map::new(), T1);
        let b = ApprovalRequest::plan("plan-abc", serde_json::Map::new(), T1);
        assert_eq!(a.id, b.id);
        assert_eq!(a.kind, ApprovalKind::Plan);
        assert_eq!(a.plan_id.as_deref(), Some("plan-abc"));
    }

    #[test]
    fn test_execution_approvals_differ_by_kind() {
        let start = ApprovalRequest::execution_start(vec!["t1".to_string()], T1);
        let retry = ApprovalRequest::execution_retry(vec!["t1".to_string()], T1);
        assert_ne!(start.id, retry.id);
        assert!(start.kind.gates_execution());
        assert!(retry.kind.gates_execution());
        assert!(!ApprovalKind::Plan.gates_execution());
    }

    #[test]
    fn test_execution_approval_carries_task_count() {
        let approval =
            ApprovalRequest::execution_start(vec!["t1".to_string(), "t2".to_string()], T1);
        assert_eq!(approval.details["taskCount"], 2);
        assert_eq!(approval.task_ids.len(), 2);
    }
}
