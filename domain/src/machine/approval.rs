//! Approval and task-dispatch intents.

use super::{Effect, Transition, apply_transition, bookkeep, fail, reject};
use crate::approval::{ApprovalKind, ApprovalRequest};
use crate::project::entities::{Phase, ProjectState};
use crate::task::entities::{AgentTask, AgentTaskKind, AgentTaskStatus};

/// Adopt a plan: consume its approval and synthesize one execution
/// task per definition. Depending on settings this either dispatches
/// immediately or raises an execution-start approval.
pub(super) fn approve_plan(
    mut state: ProjectState,
    approval_id: &str,
    plan_id: &str,
    now: &str,
) -> Transition {
    let matches_plan = state.approval(approval_id).is_some_and(|a| {
        a.kind == ApprovalKind::Plan && a.plan_id.as_deref() == Some(plan_id)
    });
    if !matches_plan {
        return fail(
            state,
            "approve_plan",
            format!("No matching plan approval {} for {}", approval_id, plan_id),
            now,
        );
    }
    let Some(plan) = state.plans.get(plan_id).cloned() else {
        return fail(
            state,
            "approve_plan",
            format!("Unknown plan: {}", plan_id),
            now,
        );
    };

    state.take_approval(approval_id);
    state.current_plan_id = Some(plan_id.to_string());

    let mut new_tasks: Vec<AgentTask> = plan
        .tasks
        .iter()
        .map(|def| AgentTask::execution(def, plan_id, now))
        .collect();

    if state.settings.require_execution_approval {
        let task_ids = new_tasks.iter().map(|t| t.id.clone()).collect();
        state.pending_tasks.append(&mut new_tasks);
        state.refresh_execution();

        let approval = ApprovalRequest::execution_start(task_ids, now);
        state.approvals.push(approval.clone());
        return apply_transition(
            state,
            "approve_plan",
            Phase::AwaitingExecutionApproval,
            now,
            vec![Effect::RequestApproval(approval)],
        );
    }

    if new_tasks.is_empty() {
        return apply_transition(state, "approve_plan", Phase::Completed, now, Vec::new());
    }

    let mut effects = Vec::with_capacity(new_tasks.len());
    for task in &mut new_tasks {
        task.mark_dispatched(now);
        effects.push(Effect::DispatchAgentTask(task.clone()));
    }
    state.pending_tasks.append(&mut new_tasks);
    state.refresh_execution();
    apply_transition(state, "approve_plan", Phase::Executing, now, effects)
}

/// Consume an execution-start or execution-retry approval and
/// dispatch its tasks.
pub(super) fn approve_execution(
    mut state: ProjectState,
    approval_id: &str,
    now: &str,
) -> Transition {
    let gates_execution = state
        .approval(approval_id)
        .is_some_and(|a| a.kind.gates_execution());
    if !gates_execution {
        return fail(
            state,
            "approve_execution",
            format!("Unknown or invalid execution approval: {}", approval_id),
            now,
        );
    }
    let Some(approval) = state.take_approval(approval_id) else {
        return fail(
            state,
            "approve_execution",
            format!("Unknown or invalid execution approval: {}", approval_id),
            now,
        );
    };

    let effects = dispatch_listed(&mut state, &approval.task_ids, now);
    state.refresh_execution();
    apply_transition(state, "approve_execution", Phase::Executing, now, effects)
}

/// Dispatch pending execution tasks. Rejected while an execution
/// approval is outstanding; the phase is otherwise unchanged.
pub(super) fn run_tasks(
    mut state: ProjectState,
    task_ids: Option<&[String]>,
    now: &str,
) -> Transition {
    if state.has_pending_execution_approval() {
        return reject(
            state,
            "run_tasks",
            "run_tasks rejected: an execution approval is still pending".to_string(),
            now,
        );
    }

    let selected: Vec<String> = state
        .pending_tasks
        .iter()
        .filter(|t| {
            t.kind == AgentTaskKind::Execution
                && t.status == AgentTaskStatus::Pending
                && task_ids.is_none_or(|ids| ids.contains(&t.id))
        })
        .map(|t| t.id.clone())
        .collect();

    let effects = dispatch_listed(&mut state, &selected, now);
    state.refresh_execution();
    let phase = state.phase;
    apply_transition(state, "run_tasks", phase, now, effects)
}

/// Reset failed execution tasks and dispatch them again, optionally
/// gated behind an execution-retry approval.
pub(super) fn retry_tasks(
    mut state: ProjectState,
    task_ids: Option<&[String]>,
    now: &str,
) -> Transition {
    let selected: Vec<String> = state
        .pending_tasks
        .iter()
        .filter(|t| {
            t.kind == AgentTaskKind::Execution
                && t.status == AgentTaskStatus::Failed
                && task_ids.is_none_or(|ids| ids.contains(&t.id))
        })
        .map(|t| t.id.clone())
        .collect();

    if selected.is_empty() {
        return bookkeep(state, "retry_tasks", now);
    }

    for id in &selected {
        if let Some(task) = state.find_task_mut(id) {
            task.reset_for_retry();
        }
        if let Some(execution) = &mut state.execution {
            execution.results.remove(id);
        }
    }

    if state.settings.require_retry_approval {
        state.refresh_execution();
        let approval = ApprovalRequest::execution_retry(selected, now);
        state.approvals.push(approval.clone());
        return apply_transition(
            state,
            "retry_tasks",
            Phase::AwaitingExecutionApproval,
            now,
            vec![Effect::RequestApproval(approval)],
        );
    }

    let effects = dispatch_listed(&mut state, &selected, now);
    state.refresh_execution();
    apply_transition(state, "retry_tasks", Phase::Executing, now, effects)
}

fn dispatch_listed(state: &mut ProjectState, task_ids: &[String], now: &str) -> Vec<Effect> {
    let mut effects = Vec::new();
    for id in task_ids {
        if let Some(task) = state.find_task_mut(id) {
            task.mark_dispatched(now);
            effects.push(Effect::DispatchAgentTask(task.clone()));
        }
    }
    effects
}
