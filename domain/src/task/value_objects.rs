//! Agent result value objects

use serde::{Deserialize, Serialize};

/// Outcome status reported for a dispatched agent task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentResultStatus {
    Success,
    Failure,
}

impl AgentResultStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AgentResultStatus::Success => "success",
            AgentResultStatus::Failure => "failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AgentResultStatus::Success)
    }
}

/// Completion report for an agent task (Value Object).
///
/// This is the only channel by which external work re-enters the
/// machine: planner replies and executor envelopes are both folded
/// into an `AgentResult` and submitted as an `agent_result` intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub task_id: String,
    pub status: AgentResultStatus,
    /// Structured output (normalized planning reply for planning tasks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResult {
    pub fn success(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: AgentResultStatus::Success,
            output: None,
            artifacts: None,
            logs: None,
            error: None,
        }
    }

    pub fn failure(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: AgentResultStatus::Failure,
            output: None,
            artifacts: None,
            logs: None,
            error: Some(error.into()),
        }
    }

    pub fn with_output(mut self, output: serde_json::Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_artifacts(mut self, artifacts: Vec<serde_json::Value>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn with_logs(mut self, logs: Vec<String>) -> Self {
        self.logs = Some(logs);
        self
    }
}
