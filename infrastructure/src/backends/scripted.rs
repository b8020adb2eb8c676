//! Scripted backends: canned replies popped in order.
//!
//! Used by tests and offline walkthroughs; also records what it was
//! asked so callers can assert on prompts and envelopes.

use async_trait::async_trait;
use foreman_application::ports::executor_backend::{ExecutorBackend, TaskEnvelope};
use foreman_application::ports::planner_backend::{BackendError, PlannerBackend};
use std::collections::VecDeque;
use std::sync::Mutex;

pub struct ScriptedPlanner {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedPlanner {
    pub fn new(replies: impl IntoIterator<Item = String>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply.into());
        }
    }

    /// Prompts received so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PlannerBackend for ScriptedPlanner {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies
            .lock()
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?
            .pop_front()
            .ok_or(BackendError::Unavailable(
                "no scripted planner reply queued".to_string(),
            ))
    }
}

pub struct ScriptedExecutor {
    replies: Mutex<VecDeque<String>>,
    envelopes: Mutex<Vec<TaskEnvelope>>,
}

impl ScriptedExecutor {
    pub fn new(replies: impl IntoIterator<Item = String>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            envelopes: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: impl Into<String>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply.into());
        }
    }

    /// Envelopes received so far, in order.
    pub fn envelopes(&self) -> Vec<TaskEnvelope> {
        self.envelopes.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ExecutorBackend for ScriptedExecutor {
    async fn execute(&self, envelope: &TaskEnvelope) -> Result<String, BackendError> {
        if let Ok(mut envelopes) = self.envelopes.lock() {
            envelopes.push(envelope.clone());
        }
        self.replies
            .lock()
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?
            .pop_front()
            .ok_or(BackendError::Unavailable(
                "no scripted executor reply queued".to_string(),
            ))
    }
}
