//! Readiness predicate and prompt context.
//!
//! Decides which of the two planner modes a planning task should run
//! in: *clarification* (scope is still incomplete) or *final planning*
//! (every required field is covered). Coverage for a field can come
//! from the structured project context or from any answered
//! clarification whose question or answer mentions the field.

use crate::clarification::ClarificationRecord;
use crate::project::entities::ProjectState;
use crate::project::value_objects::ProjectContext;
use serde::{Deserialize, Serialize};

/// Stage requested for a planning task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanningStage {
    /// Scope refinement: the planner may ask one question
    #[default]
    Clarification,
    /// Scope is closed: the planner must emit a plan
    Final,
}

impl PlanningStage {
    pub fn as_str(&self) -> &str {
        match self {
            PlanningStage::Clarification => "clarification",
            PlanningStage::Final => "final",
        }
    }
}

/// An answered clarification question, flattened for the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnsweredClarification {
    pub question: String,
    pub answer: String,
}

/// Everything the prompt templater needs for one planner invocation.
///
/// Serialized into the planning task's opaque input by the machine and
/// decoded again at dispatch time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptContext {
    pub goal: Option<String>,
    pub context: Option<ProjectContext>,
    pub answered_clarifications: Vec<AnsweredClarification>,
    pub stage: PlanningStage,
    pub note: Option<String>,
}

const ICP_KEYWORDS: &[&str] = &["icp", "customer", "user", "audience", "target"];
const TECH_KEYWORDS: &[&str] = &["tech", "stack", "technology", "framework", "language"];
const CONSTRAINT_KEYWORDS: &[&str] = &["constraint", "limit", "budget", "timeline", "deadline"];
const FEATURE_KEYWORDS: &[&str] = &[
    "feature",
    "functionality",
    "requirement",
    "must-have",
    "core",
];

/// Build the prompt context for a planning task from the current state.
pub fn build_prompt_context(
    state: &ProjectState,
    stage: PlanningStage,
    note: Option<String>,
) -> PromptContext {
    PromptContext {
        goal: state.goal.clone(),
        context: state.context.clone(),
        answered_clarifications: answered_clarifications(&state.clarifications),
        stage,
        note,
    }
}

fn answered_clarifications(records: &[ClarificationRecord]) -> Vec<AnsweredClarification> {
    let mut out = Vec::new();
    for record in records.iter().filter(|r| r.is_answered()) {
        for (question, answer) in record.answered_pairs() {
            out.push(AnsweredClarification {
                question: question.to_string(),
                answer: answer.to_string(),
            });
        }
    }
    out
}

/// True when every required field is covered and the planner should be
/// asked for a final plan. A `final` stage forces readiness.
pub fn is_ready_for_final(ctx: &PromptContext) -> bool {
    if ctx.stage == PlanningStage::Final {
        return true;
    }
    let project = ctx.context.clone().unwrap_or_default();
    let goal_present = ctx.goal.as_deref().is_some_and(|g| !g.trim().is_empty());

    goal_present
        && (project.has_icp() || covered_by_keywords(ctx, ICP_KEYWORDS))
        && (project.has_tech_stack() || covered_by_keywords(ctx, TECH_KEYWORDS))
        && (project.has_constraints() || covered_by_keywords(ctx, CONSTRAINT_KEYWORDS))
        && (project.has_core_features() || covered_by_keywords(ctx, FEATURE_KEYWORDS))
}

/// The stage the planner will actually run in.
pub fn effective_stage(ctx: &PromptContext) -> PlanningStage {
    if is_ready_for_final(ctx) {
        PlanningStage::Final
    } else {
        PlanningStage::Clarification
    }
}

fn covered_by_keywords(ctx: &PromptContext, keywords: &[&str]) -> bool {
    ctx.answered_clarifications.iter().any(|qa| {
        if qa.answer.trim().is_empty() {
            return false;
        }
        let question = qa.question.to_lowercase();
        let answer = qa.answer.to_lowercase();
        keywords
            .iter()
            .any(|k| question.contains(k) || answer.contains(k))
    })
}
