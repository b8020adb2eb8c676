//! Discussion timeline: append-only project narration

use crate::ident::deterministic_id;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// What part of the lifecycle an entry narrates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscussionKind {
    Clarification,
    Plan,
    Execution,
    System,
}

impl DiscussionKind {
    pub fn as_str(&self) -> &str {
        match self {
            DiscussionKind::Clarification => "clarification",
            DiscussionKind::Plan => "plan",
            DiscussionKind::Execution => "execution",
            DiscussionKind::System => "system",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "clarification" => Some(DiscussionKind::Clarification),
            "plan" => Some(DiscussionKind::Plan),
            "execution" => Some(DiscussionKind::Execution),
            "system" => Some(DiscussionKind::System),
            _ => None,
        }
    }
}

/// One timeline entry (append-only). Ids are content-addressed, so
/// identical content at identical timestamps collapses to one id while
/// per-event timestamps keep the timeline linear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DiscussionKind,
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl DiscussionEntry {
    pub fn new(
        kind: DiscussionKind,
        message: impl Into<String>,
        now: &str,
        metadata: Option<Value>,
    ) -> Self {
        let message = message.into();
        let id = deterministic_id(
            "discussion",
            &json!({
                "type": kind.as_str(),
                "message": message,
                "timestamp": now,
                "metadata": metadata,
            }),
        );
        Self {
            id,
            kind,
            message,
            timestamp: now.to_string(),
            metadata,
        }
    }

    pub fn system(message: impl Into<String>, now: &str) -> Self {
        Self::new(DiscussionKind::System, message, now, None)
    }
}

/// A planner-supplied discussion item before it is stamped into the
/// timeline (Value Object). The planner may send plain strings or
/// `{type, message, metadata?}` objects.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscussionNote {
    pub kind: DiscussionKind,
    pub message: String,
    pub metadata: Option<Value>,
}

impl DiscussionNote {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Some(Self {
                kind: DiscussionKind::System,
                message: s.clone(),
                metadata: None,
            }),
            Value::Object(map) => {
                let message = map.get("message")?.as_str()?.trim();
                if message.is_empty() {
                    return None;
                }
                let kind = map
                    .get("type")
                    .and_then(|v| v.as_str())
                    .and_then(DiscussionKind::parse)
                    .unwrap_or(DiscussionKind::System);
                Some(Self {
                    kind,
                    message: message.to_string(),
                    metadata: map.get("metadata").filter(|m| !m.is_null()).cloned(),
                })
            }
            _ => None,
        }
    }

    /// Parse a planner `discussion` array, dropping malformed items.
    pub fn parse_array(value: &Value) -> Vec<Self> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(Self::from_value).collect())
            .unwrap_or_default()
    }

    pub fn to_value(&self) -> Value {
        let mut out = serde_json::Map::new();
        out.insert("type".to_string(), json!(self.kind.as_str()));
        out.insert("message".to_string(), json!(self.message));
        if let Some(metadata) = &self.metadata {
            out.insert("metadata".to_string(), metadata.clone());
        }
        Value::Object(out)
    }

    /// Stamp the note into a timeline entry.
    pub fn into_entry(self, now: &str) -> DiscussionEntry {
        DiscussionEntry::new(self.kind, self.message, now, self.metadata)
    }
}
