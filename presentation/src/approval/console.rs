//! Console adapter for the approval surface port.
//!
//! Prints newly requested approvals with the command that consumes
//! them. Display only: approvals are consumed through explicit
//! intents, never from here.

use async_trait::async_trait;
use colored::Colorize;
use foreman_application::ports::approval_surface::{ApprovalSurface, ApprovalSurfaceError};
use foreman_domain::{ApprovalKind, ApprovalRequest};

pub struct ConsoleApprovalSurface;

impl ConsoleApprovalSurface {
    fn render(approval: &ApprovalRequest) -> String {
        let hint = match approval.kind {
            ApprovalKind::Plan => format!(
                "foreman approve-plan {} {}",
                approval.id,
                approval.plan_id.as_deref().unwrap_or("<plan>")
            ),
            ApprovalKind::ExecutionStart | ApprovalKind::ExecutionRetry => {
                format!("foreman approve-execution {}", approval.id)
            }
        };
        format!(
            "{} {} ({})\n  approve with: {}",
            "Approval required:".yellow().bold(),
            approval.id,
            approval.kind.as_str(),
            hint
        )
    }
}

#[async_trait]
impl ApprovalSurface for ConsoleApprovalSurface {
    async fn notify(&self, approval: &ApprovalRequest) -> Result<(), ApprovalSurfaceError> {
        println!("{}", Self::render(approval));
        Ok(())
    }
}
