//! Project transition machine.
//!
//! `transit` is the single pure entry point: it maps the current state
//! plus one intent to the next state and an ordered list of
//! side-effect requests. Failure modes are encoded as phase changes
//! plus system discussion entries, never as errors; the only `Err`
//! cases are the two structural preconditions (no project loaded, or a
//! second `create_project`).
//!
//! Every branch funnels through `apply_transition`, which bumps the
//! version, stamps `updated_at`, and appends the history record, so
//! even rejected intents remain externally observable.

mod approval;
mod result;

use crate::approval::ApprovalRequest;
use crate::clarification::ClarificationRecord;
use crate::core::error::DomainError;
use crate::discussion::{DiscussionEntry, DiscussionKind};
use crate::intent::Intent;
use crate::project::entities::{
    Phase, ProjectSettings, ProjectState, SettingsPatch, TransitionRecord,
};
use crate::project::value_objects::ProjectContext;
use crate::readiness::{self, PlanningStage};
use crate::task::entities::AgentTask;

/// A side-effect request produced by the machine. Effects never
/// mutate state; the dispatcher executes them in list order after the
/// new state has been persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Hand the task to the planner or executor backend
    DispatchAgentTask(AgentTask),
    /// Surface a new pending approval to the user
    RequestApproval(ApprovalRequest),
}

/// Result of one accepted intent
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: ProjectState,
    pub effects: Vec<Effect>,
    pub record: TransitionRecord,
}

/// Advance the project by one intent.
///
/// `now` is the injectable clock: an RFC 3339 UTC timestamp stamped
/// into every derived entity, which keeps transitions replayable.
pub fn transit(
    state: Option<&ProjectState>,
    intent: &Intent,
    now: &str,
) -> Result<Transition, DomainError> {
    match (state, intent) {
        (Some(existing), Intent::CreateProject { .. }) => {
            Err(DomainError::ProjectExists(existing.project_id.clone()))
        }
        (
            None,
            Intent::CreateProject {
                project_id,
                goal,
                context,
                settings,
            },
        ) => Ok(create_project(
            project_id,
            goal.clone(),
            context.clone(),
            settings.as_ref(),
            now,
        )),
        (None, _) => Err(DomainError::NoProject),
        (Some(existing), intent) => Ok(step(existing.clone(), intent, now)),
    }
}

fn step(state: ProjectState, intent: &Intent, now: &str) -> Transition {
    let intent_type = intent.intent_type();
    match intent {
        // Guarded in `transit`; kept as a rejection for completeness
        Intent::CreateProject { .. } => reject(
            state,
            intent_type,
            "Project already exists".to_string(),
            now,
        ),
        Intent::AddFeature { description } => add_feature(state, description, now),
        Intent::RequestClarifications {
            questions,
            discussion,
        } => request_clarifications(state, questions.clone(), discussion.clone(), now),
        Intent::AnswerClarifications {
            clarification_id,
            answers,
        } => answer_clarifications(state, clarification_id, answers.clone(), now),
        Intent::FinalizeScope { note } => finalize_scope(state, note.clone(), now),
        Intent::ApprovePlan {
            approval_id,
            plan_id,
        } => approval::approve_plan(state, approval_id, plan_id, now),
        Intent::ApproveExecution { approval_id } => {
            approval::approve_execution(state, approval_id, now)
        }
        Intent::Replan { reason } => replan(state, reason.clone(), now),
        Intent::RunTasks { task_ids } => approval::run_tasks(state, task_ids.as_deref(), now),
        Intent::RetryTasks { task_ids } => approval::retry_tasks(state, task_ids.as_deref(), now),
        Intent::PauseExecution { reason } => pause_execution(state, reason.clone(), now),
        Intent::AgentResult(agent_result) => result::agent_result(state, agent_result, now),
    }
}

fn create_project(
    project_id: &str,
    goal: Option<String>,
    context: Option<ProjectContext>,
    settings: Option<&SettingsPatch>,
    now: &str,
) -> Transition {
    let mut state = ProjectState::new(project_id, now);
    state.goal = goal;
    state.context = context;
    state.settings = ProjectSettings::default().merged(settings);

    let effect = dispatch_planning(&mut state, PlanningStage::Clarification, None, now);
    apply_transition(state, "create_project", Phase::Planning, now, vec![effect])
}

fn add_feature(mut state: ProjectState, description: &str, now: &str) -> Transition {
    let effect = dispatch_planning(
        &mut state,
        PlanningStage::Clarification,
        Some(description.to_string()),
        now,
    );
    apply_transition(state, "add_feature", Phase::Planning, now, vec![effect])
}

fn request_clarifications(
    mut state: ProjectState,
    questions: Vec<String>,
    discussion: Option<String>,
    now: &str,
) -> Transition {
    let record = ClarificationRecord::open(questions, now);
    state.clarifications.push(record);
    if let Some(message) = discussion {
        state.push_discussion(DiscussionEntry::new(
            DiscussionKind::Clarification,
            message,
            now,
            None,
        ));
    }
    apply_transition(
        state,
        "request_clarifications",
        Phase::AwaitingClarification,
        now,
        Vec::new(),
    )
}

fn answer_clarifications(
    mut state: ProjectState,
    clarification_id: &str,
    answers: Vec<String>,
    now: &str,
) -> Transition {
    if !state.clarifications.iter().any(|c| c.id == clarification_id) {
        return fail(
            state,
            "answer_clarifications",
            format!("Unknown clarification: {}", clarification_id),
            now,
        );
    }
    if let Some(record) = state.clarification_mut(clarification_id) {
        record.answer(answers, now);
    }

    let effect = dispatch_planning(&mut state, PlanningStage::Clarification, None, now);
    apply_transition(
        state,
        "answer_clarifications",
        Phase::Planning,
        now,
        vec![effect],
    )
}

fn finalize_scope(mut state: ProjectState, note: Option<String>, now: &str) -> Transition {
    for record in &mut state.clarifications {
        record.resolve(now);
    }
    let effect = dispatch_planning(&mut state, PlanningStage::Final, note, now);
    apply_transition(state, "finalize_scope", Phase::Planning, now, vec![effect])
}

fn replan(mut state: ProjectState, reason: Option<String>, now: &str) -> Transition {
    let note = reason.unwrap_or_else(|| "replan".to_string());
    let effect = dispatch_planning(&mut state, PlanningStage::Clarification, Some(note), now);
    apply_transition(state, "replan", Phase::Planning, now, vec![effect])
}

fn pause_execution(mut state: ProjectState, reason: Option<String>, now: &str) -> Transition {
    let message = match reason {
        Some(reason) => format!("Execution paused: {}", reason),
        None => "Execution paused".to_string(),
    };
    state.push_discussion(DiscussionEntry::system(message, now));
    apply_transition(state, "pause_execution", Phase::Paused, now, Vec::new())
}

/// Synthesize a planning task carrying the current prompt context,
/// mark it dispatched, and return the dispatch effect.
fn dispatch_planning(
    state: &mut ProjectState,
    stage: PlanningStage,
    note: Option<String>,
    now: &str,
) -> Effect {
    let context = readiness::build_prompt_context(state, stage, note);
    let mut task = AgentTask::planning(&context, now);
    task.mark_dispatched(now);
    state.pending_tasks.push(task.clone());
    Effect::DispatchAgentTask(task)
}

/// The single exit point of every branch: installs the phase, bumps
/// the version, stamps `updated_at`, appends the history record.
fn apply_transition(
    mut state: ProjectState,
    intent_type: &str,
    to: Phase,
    now: &str,
    effects: Vec<Effect>,
) -> Transition {
    let record = TransitionRecord {
        timestamp: now.to_string(),
        intent_type: intent_type.to_string(),
        from: state.phase,
        to,
    };
    state.phase = to;
    state.version += 1;
    state.updated_at = now.to_string();
    state.history.push(record.clone());
    Transition {
        state,
        effects,
        record,
    }
}

/// Precondition failure: record why and stop in the error phase.
fn fail(mut state: ProjectState, intent_type: &str, message: String, now: &str) -> Transition {
    state.push_discussion(DiscussionEntry::system(message, now));
    apply_transition(state, intent_type, Phase::Error, now, Vec::new())
}

/// Rejection: record why but keep the current phase.
fn reject(mut state: ProjectState, intent_type: &str, message: String, now: &str) -> Transition {
    let phase = state.phase;
    state.push_discussion(DiscussionEntry::system(message, now));
    apply_transition(state, intent_type, phase, now, Vec::new())
}

/// Bookkeeping-only transition: nothing changes except version,
/// history, and `updated_at`.
fn bookkeep(state: ProjectState, intent_type: &str, now: &str) -> Transition {
    let phase = state.phase;
    apply_transition(state, intent_type, phase, now, Vec::new())
}
