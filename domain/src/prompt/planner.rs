//! Planner prompt assembly.
//!
//! Both planner modes emit the same wire schema; they differ only in
//! the preamble register. Prompts are assembled with `format!`; there
//! is no `$`-substitution layer to escape against.

use crate::readiness::{self, PlanningStage, PromptContext};
use serde::{Deserialize, Serialize};

/// Register of the planner conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlannerMode {
    /// Collaborative, conversational preamble
    #[default]
    Conversation,
    /// Terse imperative preamble
    Checklist,
}

/// Suggested task roles; the schema accepts any non-empty string.
pub const SUGGESTED_ROLES: &[&str] = &[
    "frontend",
    "backend",
    "ai_orchestration",
    "infrastructure",
    "testing",
    "documentation",
    "design",
];

/// Templates for each planner invocation
pub struct PlannerPromptTemplate;

impl PlannerPromptTemplate {
    /// Select the prompt for the stage the context is actually ready
    /// for: clarification while coverage is incomplete, final planning
    /// once it is (or the stage forces it).
    pub fn build(context: &PromptContext, mode: PlannerMode) -> String {
        match readiness::effective_stage(context) {
            PlanningStage::Clarification => Self::clarification_prompt(context, mode),
            PlanningStage::Final => Self::final_prompt(context, mode),
        }
    }

    /// Prompt for the clarification stage: at most one question.
    pub fn clarification_prompt(context: &PromptContext, mode: PlannerMode) -> String {
        let preamble = match mode {
            PlannerMode::Conversation => {
                "You are a software project planner working with a human who retains \
                 architectural control. The scope below is still incomplete."
            }
            PlannerMode::Checklist => {
                "Role: project planner. Scope: incomplete. Fill the gaps."
            }
        };
        format!(
            r#"{preamble}

{context_block}

If one piece of scope is still missing (target users, tech stack, constraints, or core features), ask for it.
Respond with a JSON object containing EXACTLY ONE of:
- {{"questions": ["<one question>"]}} with a single question, or
- {{"plan": ...}} if scope is already complete (see plan schema below).

{schema}"#,
            preamble = preamble,
            context_block = render_context(context),
            schema = plan_schema(),
        )
    }

    /// Prompt for the final stage: the planner must emit a plan.
    pub fn final_prompt(context: &PromptContext, mode: PlannerMode) -> String {
        let preamble = match mode {
            PlannerMode::Conversation => {
                "You are a software project planner. Scope is closed: produce the plan \
                 the team will execute."
            }
            PlannerMode::Checklist => "Role: project planner. Scope: closed. Emit the plan.",
        };
        format!(
            r#"{preamble}

{context_block}

Respond with a JSON object of the form {{"plan": ...}}. Do not ask further questions.

{schema}"#,
            preamble = preamble,
            context_block = render_context(context),
            schema = plan_schema(),
        )
    }

    /// Suffix appended on the one retry after an unparseable reply.
    pub fn strict_json_reminder() -> &'static str {
        "REMINDER: respond with a single strict JSON object and nothing else. \
         No prose, no code fences. The object must contain exactly one of \
         \"questions\" (an array with one string) or \"plan\"."
    }
}

const PLAN_SCHEMA_SHAPE: &str = r#"Plan schema:
{"plan": {
  "roadmap":  [{"title": "...", "description"?: "...", "targetDate"?: "..."}],
  "features": [{"title": "...", "description"?: "...", "dependencies"?: [...], "owners"?: [...]}],
  "tasks":    [{"title": "...", "description"?: "...", "role": "...", "dependsOn"?: [...], "payload"?: {...}}],
  "rationale"?: "..."
}}"#;

fn plan_schema() -> String {
    format!(
        "{}\nEach section needs at least one entry. Suggested task roles: {}.\nYou may also include a \"discussion\" array of short notes.",
        PLAN_SCHEMA_SHAPE,
        SUGGESTED_ROLES.join(", ")
    )
}

fn render_context(context: &PromptContext) -> String {
    let mut block = String::new();
    if let Some(goal) = &context.goal {
        block.push_str(&format!("Goal: {}\n", goal));
    }
    if let Some(project) = &context.context {
        if let Some(icp) = &project.icp {
            block.push_str(&format!("Target users: {}\n", icp));
        }
        if !project.tech_stack.is_empty() {
            block.push_str(&format!("Tech stack: {}\n", project.tech_stack.join(", ")));
        }
        if !project.constraints.is_empty() {
            block.push_str(&format!("Constraints: {}\n", project.constraints.join(", ")));
        }
        if !project.core_features.is_empty() {
            block.push_str(&format!(
                "Core features: {}\n",
                project.core_features.join(", ")
            ));
        }
    }
    if !context.answered_clarifications.is_empty() {
        block.push_str("Clarified so far:\n");
        for qa in &context.answered_clarifications {
            block.push_str(&format!("- Q: {}\n  A: {}\n", qa.question, qa.answer));
        }
    }
    if let Some(note) = &context.note {
        block.push_str(&format!("Note from the user: {}\n", note));
    }
    if block.is_empty() {
        block.push_str("No scope information provided yet.\n");
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::value_objects::ProjectContext;
    use crate::readiness::AnsweredClarification;

    fn ready_context() -> PromptContext {
        PromptContext {
            goal: Some("build X".to_string()),
            context: Some(ProjectContext {
                icp: Some("SMB".to_string()),
                tech_stack: vec!["rust".to_string()],
                constraints: vec!["OSS".to_string()],
                core_features: vec!["auth".to_string()],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_selects_final_when_ready() {
        let prompt = PlannerPromptTemplate::build(&ready_context(), PlannerMode::Conversation);
        assert!(prompt.contains("Scope is closed"));
        assert!(prompt.contains("Goal: build X"));
        assert!(prompt.contains("\"plan\""));
    }

    #[test]
    fn test_build_selects_clarification_when_incomplete() {
        let context = PromptContext {
            goal: Some("build X".to_string()),
            ..Default::default()
        };
        let prompt = PlannerPromptTemplate::build(&context, PlannerMode::Conversation);
        assert!(prompt.contains("EXACTLY ONE"));
        assert!(prompt.contains("questions"));
    }

    #[test]
    fn test_checklist_mode_changes_register() {
        let prompt = PlannerPromptTemplate::build(&ready_context(), PlannerMode::Checklist);
        assert!(prompt.contains("Role: project planner"));
    }

    #[test]
    fn test_answered_clarifications_are_rendered() {
        let context = PromptContext {
            goal: Some("build X".to_string()),
            answered_clarifications: vec![AnsweredClarification {
                question: "Who is the customer?".to_string(),
                answer: "SMBs".to_string(),
            }],
            ..Default::default()
        };
        let prompt = PlannerPromptTemplate::clarification_prompt(&context, PlannerMode::Conversation);
        assert!(prompt.contains("Q: Who is the customer?"));
        assert!(prompt.contains("A: SMBs"));
    }

    #[test]
    fn test_schema_lists_every_suggested_role() {
        let schema = plan_schema();
        for role in SUGGESTED_ROLES {
            assert!(schema.contains(role), "schema is missing role {}", role);
        }
    }

    #[test]
    fn test_reminder_demands_strict_json() {
        assert!(PlannerPromptTemplate::strict_json_reminder().contains("strict JSON"));
    }
}
