//! Executor backend port and wire envelopes.
//!
//! Tasks are sent as a JSON envelope; replies are parsed leniently: a
//! JSON result envelope when possible, otherwise the raw text becomes
//! a success whose sole artifact is that text.

use super::planner_backend::BackendError;
use async_trait::async_trait;
use foreman_domain::{AgentResult, AgentTask};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Task envelope sent to the executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task_id: String,
    pub inputs: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_outputs: Option<Vec<String>>,
}

impl TaskEnvelope {
    pub fn from_task(task: &AgentTask) -> Self {
        Self {
            task_id: task.id.clone(),
            inputs: task.input.clone(),
            constraints: None,
            expected_outputs: None,
        }
    }
}

/// Result envelope received from the executor
#[derive(Debug, Deserialize)]
struct ResultEnvelope {
    #[serde(default)]
    #[allow(dead_code)]
    task_id: Option<String>,
    status: EnvelopeStatus,
    #[serde(default)]
    artifacts: Option<Vec<Value>>,
    #[serde(default)]
    logs: Option<Vec<String>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum EnvelopeStatus {
    Success,
    Failure,
}

/// Parse an executor reply for the given task.
///
/// `task_id` is the id of the task the envelope was sent for; it wins
/// over whatever the executor echoes back.
pub fn parse_executor_reply(task_id: &str, raw: &str) -> AgentResult {
    match serde_json::from_str::<ResultEnvelope>(raw.trim()) {
        Ok(envelope) => {
            let mut result = match envelope.status {
                EnvelopeStatus::Success => AgentResult::success(task_id),
                EnvelopeStatus::Failure => AgentResult::failure(
                    task_id,
                    envelope.error.clone().unwrap_or_else(|| "task failed".to_string()),
                ),
            };
            if let Some(artifacts) = envelope.artifacts {
                result = result.with_artifacts(artifacts);
            }
            if let Some(logs) = envelope.logs {
                result = result.with_logs(logs);
            }
            result
        }
        // Free text: a success whose sole artifact is the raw text
        Err(_) => {
            AgentResult::success(task_id).with_artifacts(vec![Value::String(raw.to_string())])
        }
    }
}

/// Gateway to the execution backend.
#[async_trait]
pub trait ExecutorBackend: Send + Sync {
    /// Send a task envelope and return the raw reply text.
    async fn execute(&self, envelope: &TaskEnvelope) -> Result<String, BackendError>;
}
