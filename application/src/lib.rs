//! Application layer for foreman
//!
//! Ports (interfaces for external adapters), the effect dispatcher,
//! and the orchestrator facade that owns canonical state.

pub mod dispatcher;
pub mod orchestrator;
pub mod ports;

pub use dispatcher::{DispatchFailure, DispatchOutcome, Dispatcher};
pub use orchestrator::{Orchestrator, OrchestratorError, StateTransitionResult};
pub use ports::approval_surface::{
    ApprovalSurface, ApprovalSurfaceError, NullApprovalSurface, RecordingApprovalSurface,
};
pub use ports::event_logger::{EventLogger, NullEventLogger, OrchestrationEvent};
pub use ports::executor_backend::{ExecutorBackend, TaskEnvelope, parse_executor_reply};
pub use ports::planner_backend::{BackendError, PlannerBackend};
pub use ports::state_store::{MemoryStateStore, StateStore, StateStoreError};
