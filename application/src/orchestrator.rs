//! Orchestrator facade.
//!
//! The single writer of canonical state. One intent at a time:
//! compute the transition, persist the new state, only then execute
//! the effects. A persistence failure leaves the in-memory snapshot
//! untouched, so the intent is simply "not applied".

use crate::dispatcher::{DispatchFailure, Dispatcher};
use crate::ports::event_logger::{EventLogger, NullEventLogger, OrchestrationEvent};
use crate::ports::state_store::{StateStore, StateStoreError};
use foreman_domain::{DomainError, Intent, ProjectState, TransitionRecord, transit};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

/// Wall clock, injectable for deterministic tests
pub type Clock = Box<dyn Fn() -> String + Send + Sync>;

fn utc_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Errors surfaced by the facade
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("No project loaded; create a project first")]
    NoProject,

    #[error("A project already exists: {0}")]
    ProjectExists(String),

    #[error(transparent)]
    Store(#[from] StateStoreError),
}

impl From<DomainError> for OrchestratorError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::NoProject => OrchestratorError::NoProject,
            DomainError::ProjectExists(id) => OrchestratorError::ProjectExists(id),
        }
    }
}

/// Result of one handled intent
#[derive(Debug)]
pub struct StateTransitionResult {
    pub state: ProjectState,
    pub record: TransitionRecord,
    /// `agent_result` intents produced by effect execution
    pub followups: Vec<Intent>,
    pub dispatch_failures: Vec<DispatchFailure>,
}

/// Owns the in-memory project state and serializes intent handling.
pub struct Orchestrator<S: StateStore> {
    store: S,
    dispatcher: Dispatcher,
    events: Arc<dyn EventLogger>,
    state: tokio::sync::Mutex<Option<ProjectState>>,
    clock: Clock,
}

impl<S: StateStore> Orchestrator<S> {
    pub fn new(store: S, dispatcher: Dispatcher) -> Self {
        Self {
            store,
            dispatcher,
            events: Arc::new(NullEventLogger),
            state: tokio::sync::Mutex::new(None),
            clock: Box::new(utc_now),
        }
    }

    pub fn with_event_logger(mut self, events: Arc<dyn EventLogger>) -> Self {
        self.events = events;
        self
    }

    /// Replace the wall clock; tests inject a deterministic sequence.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Load the project from the store. `None` on first run.
    pub async fn initialize(&self) -> Result<Option<ProjectState>, OrchestratorError> {
        let loaded = self.store.load().await?;
        if let Some(state) = &loaded {
            info!(
                "Loaded project {} at version {} ({})",
                state.project_id, state.version, state.phase
            );
        } else {
            debug!("No persisted project found");
        }
        *self.state.lock().await = loaded.clone();
        Ok(loaded)
    }

    /// Current in-memory snapshot.
    pub async fn state(&self) -> Option<ProjectState> {
        self.state.lock().await.clone()
    }

    /// Single entry point: transition, persist, dispatch.
    ///
    /// The state lock is held for the whole call, so intents are
    /// serialized; concurrent callers queue.
    pub async fn handle_intent(
        &self,
        intent: &Intent,
    ) -> Result<StateTransitionResult, OrchestratorError> {
        let mut guard = self.state.lock().await;
        let now = (self.clock)();

        let transition = transit(guard.as_ref(), intent, &now)?;

        // Durably written before any side effect is invoked; on
        // failure the guard still holds the pre-intent snapshot.
        self.store.save(&transition.state).await?;
        *guard = Some(transition.state.clone());

        self.events.log(OrchestrationEvent::new(
            "intent_applied",
            json!({
                "type": intent.intent_type(),
                "from": transition.record.from.as_str(),
                "to": transition.record.to.as_str(),
                "version": transition.state.version,
            }),
        ));

        let outcome = self.dispatcher.dispatch(&transition.effects).await;

        Ok(StateTransitionResult {
            state: transition.state,
            record: transition.record,
            followups: outcome.followups,
            dispatch_failures: outcome.failures,
        })
    }

    /// Handle an intent and pump every follow-up it generates
    /// (planner replies, executor results) until the queue drains.
    /// Returns the final state.
    pub async fn drive(&self, intent: Intent) -> Result<ProjectState, OrchestratorError> {
        let mut result = self.handle_intent(&intent).await?;
        let mut queue: VecDeque<Intent> = result.followups.drain(..).collect();

        while let Some(next) = queue.pop_front() {
            result = self.handle_intent(&next).await?;
            queue.extend(result.followups.drain(..));
        }

        Ok(result.state)
    }
}
