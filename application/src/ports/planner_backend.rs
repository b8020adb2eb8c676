//! Planner backend port
//!
//! Defines the interface for invoking the planning LLM. The transport
//! (process, HTTP, scripted) lives in the infrastructure layer; the
//! dispatcher only sees a prompt in and a raw reply out.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when calling an agent backend
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Timeout")]
    Timeout,

    #[error("Operation cancelled")]
    Cancelled,
}

/// Gateway to the planning LLM.
///
/// A backend failure is never fatal to the core: the dispatcher folds
/// it into an `agent_result{failure}` intent.
#[async_trait]
pub trait PlannerBackend: Send + Sync {
    /// Send a prompt and return the raw reply text.
    async fn complete(&self, prompt: &str) -> Result<String, BackendError>;
}
