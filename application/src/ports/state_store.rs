//! State store port
//!
//! One project per store. The facade is the only writer; readers see
//! committed snapshots only.

use async_trait::async_trait;
use foreman_domain::ProjectState;
use thiserror::Error;

/// Errors that can occur during store operations
#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serde(String),
}

/// Persistence port for the canonical project state.
///
/// Implementations must make `save` atomic with respect to readers
/// (write-through-rename for filesystem stores) and return `None`
/// from `load` on first run.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<Option<ProjectState>, StateStoreError>;

    async fn save(&self, state: &ProjectState) -> Result<(), StateStoreError>;
}

/// In-memory store for tests and dry runs.
pub struct MemoryStateStore {
    slot: std::sync::Mutex<Option<ProjectState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self {
            slot: std::sync::Mutex::new(None),
        }
    }

    pub fn with_state(state: ProjectState) -> Self {
        Self {
            slot: std::sync::Mutex::new(Some(state)),
        }
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<ProjectState>, StateStoreError> {
        Ok(self
            .slot
            .lock()
            .map_err(|e| StateStoreError::Io(e.to_string()))?
            .clone())
    }

    async fn save(&self, state: &ProjectState) -> Result<(), StateStoreError> {
        *self
            .slot
            .lock()
            .map_err(|e| StateStoreError::Io(e.to_string()))? = Some(state.clone());
        Ok(())
    }
}
