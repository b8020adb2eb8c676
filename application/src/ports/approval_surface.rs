//! Approval surface port.
//!
//! The machine raises `request_approval` effects; this port notifies
//! whatever surface the user is watching. Notification is advisory:
//! approvals are consumed only through explicit intents, and a failed
//! notification never mutates state.

use async_trait::async_trait;
use foreman_domain::ApprovalRequest;
use thiserror::Error;

/// Errors raised while surfacing an approval
#[derive(Error, Debug)]
pub enum ApprovalSurfaceError {
    #[error("I/O error: {0}")]
    Io(String),
}

/// Port for surfacing newly requested approvals.
#[async_trait]
pub trait ApprovalSurface: Send + Sync {
    async fn notify(&self, approval: &ApprovalRequest) -> Result<(), ApprovalSurfaceError>;
}

/// Surface that swallows notifications (headless runs).
pub struct NullApprovalSurface;

#[async_trait]
impl ApprovalSurface for NullApprovalSurface {
    async fn notify(&self, _approval: &ApprovalRequest) -> Result<(), ApprovalSurfaceError> {
        Ok(())
    }
}

/// Surface that records notifications; used by tests.
pub struct RecordingApprovalSurface {
    seen: std::sync::Mutex<Vec<ApprovalRequest>>,
}

impl RecordingApprovalSurface {
    pub fn new() -> Self {
        Self {
            seen: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<ApprovalRequest> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Default for RecordingApprovalSurface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApprovalSurface for RecordingApprovalSurface {
    async fn notify(&self, approval: &ApprovalRequest) -> Result<(), ApprovalSurfaceError> {
        self.seen
            .lock()
            .map_err(|e| ApprovalSurfaceError::Io(e.to_string()))?
            .push(approval.clone());
        Ok(())
    }
}
