//! Orchestration event log port.
//!
//! A structured, append-only record of what the orchestrator did:
//! intents applied, backends invoked, approvals surfaced. Purely
//! observational; losing events never affects canonical state.

use serde_json::Value;

/// One orchestration event
#[derive(Debug, Clone)]
pub struct OrchestrationEvent {
    pub event_type: String,
    pub payload: Value,
}

impl OrchestrationEvent {
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Port for recording orchestration events.
pub trait EventLogger: Send + Sync {
    fn log(&self, event: OrchestrationEvent);
}

/// Logger that discards everything (the default).
pub struct NullEventLogger;

impl EventLogger for NullEventLogger {
    fn log(&self, _event: OrchestrationEvent) {}
}
