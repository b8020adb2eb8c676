//! Intents: the typed messages that advance project state

use crate::project::entities::SettingsPatch;
use crate::project::value_objects::ProjectContext;
use crate::task::value_objects::AgentResult;
use serde::{Deserialize, Serialize};

/// A typed user or system message asking the orchestrator to advance
/// state. This is the complete external command surface; every intent
/// is handled by the transition machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Intent {
    /// Bootstrap a fresh project. Only valid when no state is loaded.
    CreateProject {
        project_id: String,
        #[serde(default)]
        goal: Option<String>,
        #[serde(default)]
        context: Option<ProjectContext>,
        #[serde(default)]
        settings: Option<SettingsPatch>,
    },
    /// Kick off a planning round for an additional feature
    AddFeature { description: String },
    /// Record clarification questions out-of-band (no planner dispatch)
    RequestClarifications {
        questions: Vec<String>,
        #[serde(default)]
        discussion: Option<String>,
    },
    /// Answer an open clarification, index-aligned with its questions
    AnswerClarifications {
        clarification_id: String,
        answers: Vec<String>,
    },
    /// Close the clarification loop and force a final planning round
    FinalizeScope {
        #[serde(default)]
        note: Option<String>,
    },
    /// Adopt a proposed plan
    ApprovePlan {
        approval_id: String,
        plan_id: String,
    },
    /// Consume an execution-start or execution-retry approval
    ApproveExecution { approval_id: String },
    /// Throw the current plan away and re-enter planning
    Replan {
        #[serde(default)]
        reason: Option<String>,
    },
    /// Dispatch pending execution tasks (all, or the listed subset)
    RunTasks {
        #[serde(default)]
        task_ids: Option<Vec<String>>,
    },
    /// Reset failed execution tasks and dispatch them again
    RetryTasks {
        #[serde(default)]
        task_ids: Option<Vec<String>>,
    },
    /// Pause execution
    PauseExecution {
        #[serde(default)]
        reason: Option<String>,
    },
    /// A completion report re-entering from an agent backend
    AgentResult(AgentResult),
}

impl Intent {
    /// Stable name recorded in transition history.
    pub fn intent_type(&self) -> &'static str {
        match self {
            Intent::CreateProject { .. } => "create_project",
            Intent::AddFeature { .. } => "add_feature",
            Intent::RequestClarifications { .. } => "request_clarifications",
            Intent::AnswerClarifications { .. } => "answer_clarifications",
            Intent::FinalizeScope { .. } => "finalize_scope",
            Intent::ApprovePlan { .. } => "approve_plan",
            Intent::ApproveExecution { .. } => "approve_execution",
            Intent::Replan { .. } => "replan",
            Intent::RunTasks { .. } => "run_tasks",
            Intent::RetryTasks { .. } => "retry_tasks",
            Intent::PauseExecution { .. } => "pause_execution",
            Intent::AgentResult(_) => "agent_result",
        }
    }
}
