//! Derived execution rollup.
//!
//! Never the source of truth: recomputed from the task list and the
//! result map on every update so inconsistencies self-heal.

use crate::task::entities::{AgentTask, AgentTaskKind, AgentTaskStatus};
use crate::task::value_objects::AgentResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Execution task counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub in_progress: usize,
}

/// One failed task and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFailure {
    pub task_id: String,
    pub reason: String,
}

/// Snapshot of execution progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    /// Results keyed by execution task id
    #[serde(default)]
    pub results: BTreeMap<String, AgentResult>,
    #[serde(default)]
    pub summary: ExecutionSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ExecutionFailure>,
}

impl ExecutionState {
    /// Derive summary and failures from the task list plus results.
    pub fn recompute(tasks: &[AgentTask], results: BTreeMap<String, AgentResult>) -> Self {
        let mut summary = ExecutionSummary::default();
        let mut failures = Vec::new();

        for task in tasks.iter().filter(|t| t.kind == AgentTaskKind::Execution) {
            summary.total += 1;
            match task.status {
                AgentTaskStatus::Completed => summary.completed += 1,
                AgentTaskStatus::InProgress => summary.in_progress += 1,
                AgentTaskStatus::Failed => {
                    summary.failed += 1;
                    let reason = results
                        .get(&task.id)
                        .and_then(|r| r.error.clone())
                        .unwrap_or_else(|| "task failed".to_string());
                    failures.push(ExecutionFailure {
                        task_id: task.id.clone(),
                        reason,
                    });
                }
                AgentTaskStatus::Pending => {}
            }
        }

        Self {
            results,
            summary,
            failures,
        }
    }

    /// True when every execution task has completed successfully.
    pub fn is_all_completed(&self) -> bool {
        self.summary.total > 0 && self.summary.completed == self.summary.total
    }

    /// True when nothing is left to run but failures remain.
    pub fn is_stalled(&self) -> bool {
        !self.failures.is_empty()
            && self.summary.completed + self.summary.failed == self.summary.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::value_objects::ExecutionTaskDef;

    const T1: &str = "2026-01-01T00:00:01.000Z";

    fn exec_task(id_hint: &str, status: AgentTaskStatus) -> AgentTask {
        let def = ExecutionTaskDef {
            id: id_hint.to_string(),
            title: format!("task {}", id_hint),
            description: None,
            role: "backend".to_string(),
            depends_on: vec![],
            payload: None,
        };
        let mut task = AgentTask::execution(&def, "plan-abc", T1);
        task.status = status;
        task
    }

    #[test]
    fn test_recompute_counts_by_status() {
        let tasks = vec![
            exec_task("1", AgentTaskStatus::Completed),
            exec_task("2", AgentTaskStatus::InProgress),
            exec_task("3", AgentTaskStatus::Pending),
        ];
        let state = ExecutionState::recompute(&tasks, BTreeMap::new());
        assert_eq!(state.summary.total, 3);
        assert_eq!(state.summary.completed, 1);
        assert_eq!(state.summary.in_progress, 1);
        assert_eq!(state.summary.failed, 0);
        assert!(!state.is_all_completed());
        assert!(!state.is_stalled());
    }

    #[test]
    fn test_failure_reason_comes_from_result() {
        let failed = exec_task("1", AgentTaskStatus::Failed);
        let mut results = BTreeMap::new();
        results.insert(
            failed.id.clone(),
            AgentResult::failure(&failed.id, "compile error"),
        );
        let state = ExecutionState::recompute(&[failed], results);
        assert_eq!(state.failures.len(), 1);
        assert_eq!(state.failures[0].reason, "compile error");
        assert!(state.is_stalled());
    }

    #[test]
    fn test_failure_without_result_gets_default_reason() {
        let failed = exec_task("1", AgentTaskStatus::Failed);
        let state = ExecutionState::recompute(&[failed], BTreeMap::new());
        assert_eq!(state.failures[0].reason, "task failed");
    }

    #[test]
    fn test_planning_tasks_are_excluded() {
        let planning = AgentTask::planning(&Default::default(), T1);
        let state = ExecutionState::recompute(&[planning], BTreeMap::new());
        assert_eq!(state.summary.total, 0);
        assert!(!state.is_all_completed());
    }

    #[test]
    fn test_all_completed() {
        let tasks = vec![
            exec_task("1", AgentTaskStatus::Completed),
            exec_task("2", AgentTaskStatus::Completed),
        ];
        let state = ExecutionState::recompute(&tasks, BTreeMap::new());
        assert!(state.is_all_completed());
        assert!(!state.is_stalled());
    }
}
