//! Command-spawning agent backends.
//!
//! Runs a user-configured shell command per invocation: the prompt
//! (planner) or task envelope JSON (executor) is written to stdin and
//! stdout is returned as the raw reply. A non-zero exit is a request
//! failure carrying stderr.

use async_trait::async_trait;
use foreman_application::ports::executor_backend::{ExecutorBackend, TaskEnvelope};
use foreman_application::ports::planner_backend::{BackendError, PlannerBackend};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Default timeout for one backend invocation (5 minutes)
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Maximum reply size kept (1 MB)
const MAX_REPLY_SIZE: usize = 1024 * 1024;

pub struct CommandPlanner {
    command: String,
    timeout: Duration,
}

impl CommandPlanner {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl PlannerBackend for CommandPlanner {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        run_command(&self.command, prompt, self.timeout).await
    }
}

pub struct CommandExecutor {
    command: String,
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ExecutorBackend for CommandExecutor {
    async fn execute(&self, envelope: &TaskEnvelope) -> Result<String, BackendError> {
        let stdin = serde_json::to_string(envelope)
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;
        run_command(&self.command, &stdin, self.timeout).await
    }
}

async fn run_command(
    command: &str,
    stdin_payload: &str,
    timeout: Duration,
) -> Result<String, BackendError> {
    debug!("Spawning backend command: {}", command);

    let mut cmd = if cfg!(target_os = "windows") {
        let mut c = tokio::process::Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = tokio::process::Command::new("sh");
        c.args(["-c", command]);
        c
    };
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| BackendError::Unavailable(format!("failed to spawn: {}", e)))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(stdin_payload.as_bytes())
            .await
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;
        // Close stdin so line-reading commands see EOF
        drop(stdin);
    }

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| BackendError::Timeout)?
        .map_err(|e| BackendError::RequestFailed(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(BackendError::RequestFailed(format!(
            "command exited with {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }

    let mut reply = String::from_utf8_lossy(&output.stdout).into_owned();
    if reply.len() > MAX_REPLY_SIZE {
        reply.truncate(MAX_REPLY_SIZE);
    }
    Ok(reply)
}
