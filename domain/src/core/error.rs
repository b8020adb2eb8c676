//! Domain error types

use thiserror::Error;

/// Structural errors raised by the transition machine.
///
/// These are the only two conditions that cannot be encoded as a state
/// change: every other failure mode becomes a phase transition plus a
/// system discussion entry.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("No project loaded")]
    NoProject,

    #[error("A project already exists: {0}")]
    ProjectExists(String),
}

impl DomainError {
    /// Check if this error means a project must be created first
    pub fn is_no_project(&self) -> bool {
        matches!(self, DomainError::NoProject)
    }
}
