//! Strict planning-output parsing.
//!
//! Turns a raw planner reply (free text with optional fences, or an
//! already-decoded JSON object) into exactly one of: a single
//! clarifying question, or a normalized plan draft. Anything else is a
//! typed failure; the dispatcher retries once with a strict-JSON
//! reminder before giving up.

use super::normalize::normalize_plan;
use super::value_objects::PlanDraft;
use crate::discussion::DiscussionNote;
use serde_json::Value;
use thiserror::Error;

/// Why a planner reply could not be accepted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanningParseError {
    #[error("No valid JSON object found in response")]
    NoJsonObject,

    #[error("Response must contain exactly one of 'questions' or 'plan'")]
    AmbiguousShape,

    #[error("'questions' must hold exactly one non-empty question")]
    InvalidQuestions,

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),
}

/// The planner's accepted reply
#[derive(Debug, Clone, PartialEq)]
pub enum PlanningReply {
    /// Exactly one clarifying question
    Questions(Vec<String>),
    /// A structurally valid plan
    Plan(PlanDraft),
}

/// Accepted reply plus any discussion notes the planner attached
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPlanning {
    pub reply: PlanningReply,
    pub discussion: Vec<DiscussionNote>,
}

impl ParsedPlanning {
    /// Canonical wire value handed back to the machine as the
    /// `agent_result` output.
    pub fn to_value(&self) -> Value {
        let mut out = serde_json::Map::new();
        match &self.reply {
            PlanningReply::Questions(questions) => {
                out.insert(
                    "questions".to_string(),
                    Value::Array(questions.iter().cloned().map(Value::String).collect()),
                );
            }
            PlanningReply::Plan(draft) => {
                out.insert(
                    "plan".to_string(),
                    serde_json::to_value(draft).unwrap_or(Value::Null),
                );
            }
        }
        if !self.discussion.is_empty() {
            out.insert(
                "discussion".to_string(),
                Value::Array(self.discussion.iter().map(DiscussionNote::to_value).collect()),
            );
        }
        Value::Object(out)
    }
}

/// Parse a raw planner reply string.
///
/// JSON extraction, in order: the trimmed text itself if it starts
/// with `{`; the body of the first fenced code block; the substring
/// from the first `{` to the last `}`.
pub fn parse_planner_text(raw: &str) -> Result<ParsedPlanning, PlanningParseError> {
    let value = extract_json(raw).ok_or(PlanningParseError::NoJsonObject)?;
    parse_planner_value(&value)
}

/// Validate an already-decoded planner reply.
pub fn parse_planner_value(value: &Value) -> Result<ParsedPlanning, PlanningParseError> {
    let questions = value.get("questions");
    let plan = value.get("plan");

    let reply = match (questions, plan) {
        (Some(questions), None) => PlanningReply::Questions(validate_questions(questions)?),
        (None, Some(plan)) => PlanningReply::Plan(validate_plan(plan)?),
        _ => return Err(PlanningParseError::AmbiguousShape),
    };

    Ok(ParsedPlanning {
        reply,
        discussion: value
            .get("discussion")
            .map(DiscussionNote::parse_array)
            .unwrap_or_default(),
    })
}

fn validate_questions(value: &Value) -> Result<Vec<String>, PlanningParseError> {
    let items = value
        .as_array()
        .ok_or(PlanningParseError::InvalidQuestions)?;
    // One question per turn
    if items.len() != 1 {
        return Err(PlanningParseError::InvalidQuestions);
    }
    let question = items[0]
        .as_str()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or(PlanningParseError::InvalidQuestions)?;
    Ok(vec![question.to_string()])
}

fn validate_plan(value: &Value) -> Result<PlanDraft, PlanningParseError> {
    let plan = value
        .as_object()
        .ok_or_else(|| PlanningParseError::InvalidPlan("not an object".to_string()))?;

    require_titled_section(plan, "roadmap")?;
    require_titled_section(plan, "features")?;

    let tasks = plan
        .get("tasks")
        .and_then(|v| v.as_array())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PlanningParseError::InvalidPlan("at least one task required".to_string()))?;
    for (index, task) in tasks.iter().enumerate() {
        if !has_non_empty_string(task, "title") {
            return Err(PlanningParseError::InvalidPlan(format!(
                "task {} is missing a title",
                index + 1
            )));
        }
        // Role may be absent (defaulted) but must not be blank
        if let Some(role) = task.get("role")
            && role.as_str().is_none_or(|r| r.trim().is_empty())
        {
            return Err(PlanningParseError::InvalidPlan(format!(
                "task {} has an invalid role",
                index + 1
            )));
        }
    }

    // Strictness established; normalization cannot fail on an object
    normalize_plan(value)
        .ok_or_else(|| PlanningParseError::InvalidPlan("not an object".to_string()))
}

fn require_titled_section(
    plan: &serde_json::Map<String, Value>,
    key: &str,
) -> Result<(), PlanningParseError> {
    let items = plan
        .get(key)
        .and_then(|v| v.as_array())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            PlanningParseError::InvalidPlan(format!("at least one {} entry required", key))
        })?;
    for (index, item) in items.iter().enumerate() {
        if !has_non_empty_string(item, "title") {
            return Err(PlanningParseError::InvalidPlan(format!(
                "{} entry {} is missing a title",
                key,
                index + 1
            )));
        }
    }
    Ok(())
}

fn has_non_empty_string(value: &Value, key: &str) -> bool {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .is_some_and(|s| !s.trim().is_empty())
}

fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();

    // 1. The whole reply is a JSON object
    if trimmed.starts_with('{')
        && let Ok(value) = serde_json::from_str::<Value>(trimmed)
    {
        return Some(value);
    }

    // 2. The first fenced code block
    if let Some(body) = first_fenced_block(raw)
        && let Ok(value) = serde_json::from_str::<Value>(&body)
    {
        return Some(value);
    }

    // 3. First '{' through last '}'
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end > start {
        serde_json::from_str::<Value>(&raw[start..=end]).ok()
    } else {
        None
    }
}

fn first_fenced_block(raw: &str) -> Option<String> {
    let mut in_block = false;
    let mut body = String::new();
    for line in raw.lines() {
        let marker = line.trim();
        if !in_block && marker.starts_with("```") {
            in_block = true;
        } else if in_block && marker == "```" {
            return Some(body);
        } else if in_block {
            body.push_str(line);
            body.push('\n');
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_json() -> String {
        json!({
            "plan": {
                "roadmap": [{"title": "M1"}],
                "features": [{"title": "F1"}],
                "tasks": [{"title": "T1", "role": "backend"}]
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_bare_json_object() {
        let parsed = parse_planner_text(&plan_json()).unwrap();
        match parsed.reply {
            PlanningReply::Plan(draft) => assert_eq!(draft.tasks[0].title, "T1"),
            other => panic!("expected plan, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_fenced_block_with_prose() {
        let raw = format!("Here is what I propose:\n\n```json\n{}\n```\nLet me know!", plan_json());
        assert!(parse_planner_text(&raw).is_ok());
    }

    #[test]
    fn test_parse_brace_substring_fallback() {
        let raw = format!("Sure thing! {} Hope that helps.", r#"{"questions": ["Who is the target user?"]}"#);
        let parsed = parse_planner_text(&raw).unwrap();
        assert_eq!(
            parsed.reply,
            PlanningReply::Questions(vec!["Who is the target user?".to_string()])
        );
    }

    #[test]
    fn test_garbage_reports_no_json_object() {
        let err = parse_planner_text("garbage").unwrap_err();
        assert_eq!(err, PlanningParseError::NoJsonObject);
        assert_eq!(err.to_string(), "No valid JSON object found in response");
    }

    #[test]
    fn test_both_questions_and_plan_rejected() {
        let raw = json!({"questions": ["q?"], "plan": {}}).to_string();
        assert_eq!(
            parse_planner_text(&raw).unwrap_err(),
            PlanningParseError::AmbiguousShape
        );
    }

    #[test]
    fn test_neither_questions_nor_plan_rejected() {
        assert_eq!(
            parse_planner_text(r#"{"answer": 42}"#).unwrap_err(),
            PlanningParseError::AmbiguousShape
        );
    }

    #[test]
    fn test_two_questions_rejected() {
        let raw = json!({"questions": ["a?", "b?"]}).to_string();
        assert_eq!(
            parse_planner_text(&raw).unwrap_err(),
            PlanningParseError::InvalidQuestions
        );
    }

    #[test]
    fn test_blank_question_rejected() {
        let raw = json!({"questions": ["  "]}).to_string();
        assert_eq!(
            parse_planner_text(&raw).unwrap_err(),
            PlanningParseError::InvalidQuestions
        );
    }

    #[test]
    fn test_plan_without_tasks_rejected() {
        let raw = json!({
            "plan": {"roadmap": [{"title": "M1"}], "features": [{"title": "F1"}], "tasks": []}
        })
        .to_string();
        assert!(matches!(
            parse_planner_text(&raw).unwrap_err(),
            PlanningParseError::InvalidPlan(_)
        ));
    }

    #[test]
    fn test_plan_with_untitled_milestone_rejected() {
        let raw = json!({
            "plan": {
                "roadmap": [{"description": "no title"}],
                "features": [{"title": "F1"}],
                "tasks": [{"title": "T1", "role": "backend"}]
            }
        })
        .to_string();
        assert!(matches!(
            parse_planner_text(&raw).unwrap_err(),
            PlanningParseError::InvalidPlan(_)
        ));
    }

    #[test]
    fn test_missing_role_defaults_to_execution() {
        let raw = json!({
            "plan": {
                "roadmap": [{"title": "M1"}],
                "features": [{"title": "F1"}],
                "tasks": [{"title": "T1"}]
            }
        })
        .to_string();
        let parsed = parse_planner_text(&raw).unwrap();
        match parsed.reply {
            PlanningReply::Plan(draft) => assert_eq!(draft.tasks[0].role, "execution"),
            other => panic!("expected plan, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_role_rejected() {
        let raw = json!({
            "plan": {
                "roadmap": [{"title": "M1"}],
                "features": [{"title": "F1"}],
                "tasks": [{"title": "T1", "role": " "}]
            }
        })
        .to_string();
        assert!(matches!(
            parse_planner_text(&raw).unwrap_err(),
            PlanningParseError::InvalidPlan(_)
        ));
    }

    #[test]
    fn test_discussion_notes_are_carried() {
        let raw = json!({
            "questions": ["Who pays?"],
            "discussion": ["Scoping the billing story first", {"type": "plan", "message": "roadmap next"}]
        })
        .to_string();
        let parsed = parse_planner_text(&raw).unwrap();
        assert_eq!(parsed.discussion.len(), 2);

        let value = parsed.to_value();
        assert_eq!(value["questions"][0], "Who pays?");
        assert_eq!(value["discussion"][0]["message"], "Scoping the billing story first");
    }

    #[test]
    fn test_to_value_round_trips_through_parse() {
        let parsed = parse_planner_text(&plan_json()).unwrap();
        let reparsed = parse_planner_value(&parsed.to_value()).unwrap();
        assert_eq!(reparsed.reply, parsed.reply);
    }
}
