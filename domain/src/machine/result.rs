//! Agent-result handling: the one channel by which external
//! completions re-enter the machine.

use super::{Effect, Transition, apply_transition, bookkeep, fail};
use crate::approval::ApprovalRequest;
use crate::clarification::ClarificationRecord;
use crate::discussion::{DiscussionEntry, DiscussionKind, DiscussionNote};
use crate::plan::entities::PlanSnapshot;
use crate::plan::normalize::normalize_plan;
use crate::project::entities::{Phase, ProjectState};
use crate::task::entities::AgentTaskKind;
use crate::task::value_objects::AgentResult;
use crate::util::truncate_str;
use serde_json::{Value, json};

const ERROR_QUOTE_BYTES: usize = 200;

pub(super) fn agent_result(
    mut state: ProjectState,
    result: &AgentResult,
    now: &str,
) -> Transition {
    let located = state
        .find_task(&result.task_id)
        .map(|t| (t.kind, t.status.is_terminal()));
    let Some((kind, terminal)) = located else {
        return fail(
            state,
            "agent_result",
            format!("Unknown task: {}", result.task_id),
            now,
        );
    };

    // A second result for an already-terminal task changes nothing
    if terminal {
        return bookkeep(state, "agent_result", now);
    }

    if let Some(task) = state.find_task_mut(&result.task_id) {
        if result.status.is_success() {
            task.mark_completed();
        } else {
            task.mark_failed();
        }
    }

    match kind {
        AgentTaskKind::Planning => planning_result(state, result, now),
        AgentTaskKind::Execution => execution_result(state, result, now),
    }
}

/// Interpret a planner reply: questions open a clarification, a plan
/// becomes a snapshot awaiting approval, anything else is bookkeeping.
fn planning_result(mut state: ProjectState, result: &AgentResult, now: &str) -> Transition {
    if !result.status.is_success() {
        let error = result.error.as_deref().unwrap_or("unknown error");
        return fail(
            state,
            "agent_result",
            format!("Planning failed: {}", truncate_str(error, ERROR_QUOTE_BYTES)),
            now,
        );
    }

    let output = result.output.clone().unwrap_or(Value::Null);
    fold_discussion(&mut state, &output, now);

    if let Some(questions) = non_empty_questions(&output) {
        let first = questions[0].clone();
        let record = ClarificationRecord::open(questions, now);
        state.clarifications.push(record);
        state.push_discussion(DiscussionEntry::new(
            DiscussionKind::Clarification,
            format!("Planner asked: {}", first),
            now,
            None,
        ));
        return apply_transition(
            state,
            "agent_result",
            Phase::AwaitingClarification,
            now,
            Vec::new(),
        );
    }

    if let Some(plan_value) = output.get("plan")
        && let Some(draft) = normalize_plan(plan_value)
    {
        let snapshot = PlanSnapshot::from_draft(draft, now);
        let plan_id = snapshot.id.clone();
        let task_count = snapshot.tasks.len();

        // Content-addressed: a replayed plan keeps the first snapshot
        state.plans.entry(plan_id.clone()).or_insert(snapshot);
        state.current_plan_id = Some(plan_id.clone());

        let mut details = serde_json::Map::new();
        details.insert("planId".to_string(), json!(plan_id));
        details.insert("taskCount".to_string(), json!(task_count));
        let approval = ApprovalRequest::plan(&plan_id, details, now);
        state.approvals.push(approval.clone());

        state.push_discussion(DiscussionEntry::new(
            DiscussionKind::Plan,
            format!("Proposed plan {} with {} tasks", plan_id, task_count),
            now,
            None,
        ));
        return apply_transition(
            state,
            "agent_result",
            Phase::AwaitingApproval,
            now,
            vec![Effect::RequestApproval(approval)],
        );
    }

    // Neither questions nor a plan: note it and stay in planning
    state.push_discussion(DiscussionEntry::system(
        "Planner returned neither questions nor a plan",
        now,
    ));
    apply_transition(state, "agent_result", Phase::Planning, now, Vec::new())
}

/// Record an executor result and derive the next phase from the
/// refreshed rollup.
fn execution_result(mut state: ProjectState, result: &AgentResult, now: &str) -> Transition {
    let mut execution = state.execution.take().unwrap_or_default();
    execution.results.insert(result.task_id.clone(), result.clone());
    state.execution = Some(execution);
    state.refresh_execution();

    let phase = state
        .execution
        .as_ref()
        .map(|execution| {
            if execution.is_all_completed() {
                Phase::Completed
            } else if execution.is_stalled() {
                Phase::Error
            } else {
                state.phase
            }
        })
        .unwrap_or(state.phase);

    apply_transition(state, "agent_result", phase, now, Vec::new())
}

/// Fold a planner-supplied `discussion` array into the timeline.
fn fold_discussion(state: &mut ProjectState, output: &Value, now: &str) {
    if let Some(discussion) = output.get("discussion") {
        for note in DiscussionNote::parse_array(discussion) {
            state.push_discussion(note.into_entry(now));
        }
    }
}

fn non_empty_questions(output: &Value) -> Option<Vec<String>> {
    let questions: Vec<String> = output
        .get("questions")?
        .as_array()?
        .iter()
        .filter_map(|q| q.as_str())
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string)
        .collect();
    if questions.is_empty() {
        None
    } else {
        Some(questions)
    }
}
