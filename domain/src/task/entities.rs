//! Agent task entity

use crate::plan::value_objects::ExecutionTaskDef;
use crate::readiness::PromptContext;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

/// Kind of work a task asks an agent backend to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentTaskKind {
    Planning,
    Execution,
}

impl AgentTaskKind {
    pub fn as_str(&self) -> &str {
        match self {
            AgentTaskKind::Planning => "planning",
            AgentTaskKind::Execution => "execution",
        }
    }
}

/// Status of an agent task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentTaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl AgentTaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AgentTaskStatus::Pending => "pending",
            AgentTaskStatus::InProgress => "in_progress",
            AgentTaskStatus::Completed => "completed",
            AgentTaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentTaskStatus::Completed | AgentTaskStatus::Failed)
    }
}

/// A unit of work handed to an agent backend (Entity).
///
/// Ids are unique per creation. Entries are appended to the project's
/// task list and mutate status in place; they are never reordered.
/// Once `dispatched_at` is set it does not change, even across retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTask {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AgentTaskKind,
    pub status: AgentTaskStatus,
    /// Opaque input handed to the backend
    pub input: serde_json::Value,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatched_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    /// Links an execution task back to its definition in the plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,
}

impl AgentTask {
    /// Synthesize a planning task carrying the prompt context as input.
    pub fn planning(context: &PromptContext, now: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: AgentTaskKind::Planning,
            status: AgentTaskStatus::Pending,
            input: serde_json::to_value(context).unwrap_or(serde_json::Value::Null),
            created_at: now.to_string(),
            dispatched_at: None,
            plan_id: None,
            definition_id: None,
        }
    }

    /// Synthesize an execution task from a plan's task definition.
    pub fn execution(def: &ExecutionTaskDef, plan_id: &str, now: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind: AgentTaskKind::Execution,
            status: AgentTaskStatus::Pending,
            input: json!({
                "title": def.title,
                "description": def.description,
                "role": def.role,
                "dependsOn": def.depends_on,
                "payload": def.payload,
            }),
            created_at: now.to_string(),
            dispatched_at: None,
            plan_id: Some(plan_id.to_string()),
            definition_id: Some(def.id.clone()),
        }
    }

    /// Hand the task to the backend: stamps `dispatched_at` on first
    /// dispatch only and moves the status to in-progress.
    pub fn mark_dispatched(&mut self, now: &str) {
        if self.dispatched_at.is_none() {
            self.dispatched_at = Some(now.to_string());
        }
        self.status = AgentTaskStatus::InProgress;
    }

    pub fn mark_completed(&mut self) {
        self.status = AgentTaskStatus::Completed;
    }

    pub fn mark_failed(&mut self) {
        self.status = AgentTaskStatus::Failed;
    }

    /// Reset a failed task so it can be dispatched again.
    pub fn reset_for_retry(&mut self) {
        self.status = AgentTaskStatus::Pending;
    }
}
