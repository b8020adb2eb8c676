//! Project aggregate root and lifecycle phases

use super::value_objects::ProjectContext;
use crate::approval::{ApprovalKind, ApprovalRequest};
use crate::clarification::ClarificationRecord;
use crate::discussion::DiscussionEntry;
use crate::execution::ExecutionState;
use crate::plan::entities::PlanSnapshot;
use crate::task::entities::{AgentTask, AgentTaskKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle phase of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Freshly created, nothing dispatched yet
    Idle,
    /// A planning task is outstanding
    Planning,
    /// The planner asked a question and is waiting for the user
    AwaitingClarification,
    /// A plan snapshot is waiting for user approval
    AwaitingApproval,
    /// Execution (or retry) is gated on a user approval
    AwaitingExecutionApproval,
    /// Execution tasks are in flight
    Executing,
    /// Execution paused by the user
    Paused,
    /// All execution tasks completed successfully
    Completed,
    /// A precondition or backend failure stopped progress
    Error,
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Phase::Idle => "idle",
            Phase::Planning => "planning",
            Phase::AwaitingClarification => "awaiting_clarification",
            Phase::AwaitingApproval => "awaiting_approval",
            Phase::AwaitingExecutionApproval => "awaiting_execution_approval",
            Phase::Executing => "executing",
            Phase::Paused => "paused",
            Phase::Completed => "completed",
            Phase::Error => "error",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Phase::Idle => "Idle",
            Phase::Planning => "Planning",
            Phase::AwaitingClarification => "Awaiting Clarification",
            Phase::AwaitingApproval => "Awaiting Plan Approval",
            Phase::AwaitingExecutionApproval => "Awaiting Execution Approval",
            Phase::Executing => "Executing",
            Phase::Paused => "Paused",
            Phase::Completed => "Completed",
            Phase::Error => "Error",
        }
    }

    /// Terminal-ish phases; both can re-enter planning via
    /// `add_feature` or `replan`.
    pub fn is_settled(&self) -> bool {
        matches!(self, Phase::Completed | Phase::Error)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Approval gates configured per project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSettings {
    /// Gate execution start behind an explicit approval
    pub require_execution_approval: bool,
    /// Gate retries of failed tasks behind an explicit approval
    pub require_retry_approval: bool,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            require_execution_approval: false,
            require_retry_approval: true,
        }
    }
}

/// Partial settings override supplied with `create_project`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub require_execution_approval: Option<bool>,
    pub require_retry_approval: Option<bool>,
}

impl ProjectSettings {
    /// Merge a patch over these settings, field by field
    pub fn merged(mut self, patch: Option<&SettingsPatch>) -> Self {
        if let Some(patch) = patch {
            if let Some(v) = patch.require_execution_approval {
                self.require_execution_approval = v;
            }
            if let Some(v) = patch.require_retry_approval {
                self.require_retry_approval = v;
            }
        }
        self
    }
}

/// One accepted intent, recorded in the history log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub timestamp: String,
    pub intent_type: String,
    pub from: Phase,
    pub to: Phase,
}

/// Canonical project state (Entity). Exactly one per store.
///
/// Mutation is owned by the orchestrator façade; the transition
/// machine operates on detached clones and every accepted intent
/// increments `version` and appends to `history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub project_id: String,
    pub phase: Phase,
    pub version: u64,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ProjectContext>,
    #[serde(default)]
    pub plans: BTreeMap<String, PlanSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_plan_id: Option<String>,
    #[serde(default)]
    pub pending_tasks: Vec<AgentTask>,
    #[serde(default)]
    pub approvals: Vec<ApprovalRequest>,
    #[serde(default)]
    pub clarifications: Vec<ClarificationRecord>,
    #[serde(default)]
    pub discussion: Vec<DiscussionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionState>,
    #[serde(default)]
    pub settings: ProjectSettings,
    #[serde(default)]
    pub history: Vec<TransitionRecord>,
}

impl ProjectState {
    /// Create a fresh project in phase `idle`, version 0.
    pub fn new(project_id: impl Into<String>, now: &str) -> Self {
        Self {
            project_id: project_id.into(),
            phase: Phase::Idle,
            version: 0,
            updated_at: now.to_string(),
            goal: None,
            context: None,
            plans: BTreeMap::new(),
            current_plan_id: None,
            pending_tasks: Vec::new(),
            approvals: Vec::new(),
            clarifications: Vec::new(),
            discussion: Vec::new(),
            execution: None,
            settings: ProjectSettings::default(),
            history: Vec::new(),
        }
    }

    pub fn find_task(&self, id: &str) -> Option<&AgentTask> {
        self.pending_tasks.iter().find(|t| t.id == id)
    }

    pub fn find_task_mut(&mut self, id: &str) -> Option<&mut AgentTask> {
        self.pending_tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn clarification_mut(&mut self, id: &str) -> Option<&mut ClarificationRecord> {
        self.clarifications.iter_mut().find(|c| c.id == id)
    }

    pub fn approval(&self, id: &str) -> Option<&ApprovalRequest> {
        self.approvals.iter().find(|a| a.id == id)
    }

    /// Consume an approval: approvals are removed exactly once.
    pub fn take_approval(&mut self, id: &str) -> Option<ApprovalRequest> {
        let pos = self.approvals.iter().position(|a| a.id == id)?;
        Some(self.approvals.remove(pos))
    }

    /// True while an `execution_start` or `execution_retry` approval
    /// is outstanding.
    pub fn has_pending_execution_approval(&self) -> bool {
        self.approvals.iter().any(|a| {
            matches!(
                a.kind,
                ApprovalKind::ExecutionStart | ApprovalKind::ExecutionRetry
            )
        })
    }

    pub fn execution_tasks(&self) -> impl Iterator<Item = &AgentTask> {
        self.pending_tasks
            .iter()
            .filter(|t| t.kind == AgentTaskKind::Execution)
    }

    /// Append to the discussion timeline.
    pub fn push_discussion(&mut self, entry: DiscussionEntry) {
        self.discussion.push(entry);
    }

    /// Recompute the derived execution rollup from tasks + results.
    pub fn refresh_execution(&mut self) {
        let results = self
            .execution
            .take()
            .map(|e| e.results)
            .unwrap_or_default();
        self.execution = Some(ExecutionState::recompute(&self.pending_tasks, results));
    }
}
