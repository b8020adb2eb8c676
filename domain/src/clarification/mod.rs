//! Clarification records: the planner's question loop

use crate::ident::deterministic_id;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Lifecycle of a clarification record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarificationStatus {
    /// Waiting for the user's answer
    Open,
    /// Answered; answers are aligned by index with questions
    Answered,
    /// Closed out (answered or superseded by `finalize_scope`)
    Resolved,
}

impl ClarificationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ClarificationStatus::Open => "open",
            ClarificationStatus::Answered => "answered",
            ClarificationStatus::Resolved => "resolved",
        }
    }
}

/// A planner-generated question set gating final planning (Entity).
///
/// Ids are content-addressed over the questions and creation time, so
/// replaying the same planning output reproduces the same record id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarificationRecord {
    pub id: String,
    pub questions: Vec<String>,
    #[serde(default)]
    pub answers: Vec<String>,
    pub status: ClarificationStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
}

impl ClarificationRecord {
    pub fn open(questions: Vec<String>, now: &str) -> Self {
        let id = deterministic_id(
            "clarification",
            &json!({"questions": questions, "createdAt": now}),
        );
        Self {
            id,
            questions,
            answers: Vec::new(),
            status: ClarificationStatus::Open,
            created_at: now.to_string(),
            resolved_at: None,
        }
    }

    /// Record the user's answers, aligned by index with the questions.
    pub fn answer(&mut self, answers: Vec<String>, now: &str) {
        self.answers = answers;
        self.status = ClarificationStatus::Answered;
        self.resolved_at = Some(now.to_string());
    }

    /// Close the record out; keeps an earlier resolution stamp.
    pub fn resolve(&mut self, now: &str) {
        if self.status != ClarificationStatus::Resolved {
            self.status = ClarificationStatus::Resolved;
            if self.resolved_at.is_none() {
                self.resolved_at = Some(now.to_string());
            }
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(
            self.status,
            ClarificationStatus::Answered | ClarificationStatus::Resolved
        )
    }

    /// Question/answer pairs with non-empty answers.
    pub fn answered_pairs(&self) -> Vec<(&str, &str)> {
        self.questions
            .iter()
            .zip(self.answers.iter())
            .filter(|(_, a)| !a.trim().is_empty())
            .map(|(q, a)| (q.as_str(), a.as_str()))
            .collect()
    }
}
