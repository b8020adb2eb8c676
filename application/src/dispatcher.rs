//! Effect dispatcher.
//!
//! Consumes the effect list produced by the transition machine and
//! invokes the external collaborators, strictly in list order and
//! awaiting each effect before the next so causal ordering is
//! preserved. Backend outcomes are folded into `agent_result`
//! follow-up intents; delivery failures are surfaced, never allowed
//! to retro-mutate state.

use crate::ports::approval_surface::ApprovalSurface;
use crate::ports::event_logger::{EventLogger, NullEventLogger, OrchestrationEvent};
use crate::ports::executor_backend::{ExecutorBackend, TaskEnvelope, parse_executor_reply};
use crate::ports::planner_backend::{BackendError, PlannerBackend};
use foreman_domain::util::truncate_str;
use foreman_domain::{
    AgentResult, AgentTask, AgentTaskKind, Effect, Intent, PlannerMode, PlannerPromptTemplate,
    PromptContext, parse_planner_text,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const RAW_QUOTE_BYTES: usize = 160;

/// One effect that could not be delivered
#[derive(Debug, Clone)]
pub struct DispatchFailure {
    /// Short description of the effect ("planner t-123", "approval a-456")
    pub effect: String,
    pub error: String,
}

/// Everything a dispatch round produced
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    /// `agent_result` intents to feed back into the machine
    pub followups: Vec<Intent>,
    pub failures: Vec<DispatchFailure>,
}

/// Serializes side effects on behalf of the machine.
pub struct Dispatcher {
    planner: Arc<dyn PlannerBackend>,
    executor: Arc<dyn ExecutorBackend>,
    approvals: Arc<dyn ApprovalSurface>,
    events: Arc<dyn EventLogger>,
    planner_mode: PlannerMode,
    cancellation_token: Option<CancellationToken>,
}

impl Dispatcher {
    pub fn new(
        planner: Arc<dyn PlannerBackend>,
        executor: Arc<dyn ExecutorBackend>,
        approvals: Arc<dyn ApprovalSurface>,
    ) -> Self {
        Self {
            planner,
            executor,
            approvals,
            events: Arc::new(NullEventLogger),
            planner_mode: PlannerMode::default(),
            cancellation_token: None,
        }
    }

    pub fn with_event_logger(mut self, events: Arc<dyn EventLogger>) -> Self {
        self.events = events;
        self
    }

    pub fn with_planner_mode(mut self, mode: PlannerMode) -> Self {
        self.planner_mode = mode;
        self
    }

    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Execute effects in list order, awaiting each before the next.
    pub async fn dispatch(&self, effects: &[Effect]) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();

        for effect in effects {
            match effect {
                Effect::RequestApproval(approval) => {
                    self.events.log(OrchestrationEvent::new(
                        "approval_surfaced",
                        json!({"approvalId": approval.id, "kind": approval.kind.as_str()}),
                    ));
                    if let Err(e) = self.approvals.notify(approval).await {
                        warn!("Failed to surface approval {}: {}", approval.id, e);
                        outcome.failures.push(DispatchFailure {
                            effect: format!("approval {}", approval.id),
                            error: e.to_string(),
                        });
                    }
                }
                Effect::DispatchAgentTask(task) => {
                    if self.is_cancelled() {
                        outcome.failures.push(DispatchFailure {
                            effect: format!("task {}", task.id),
                            error: BackendError::Cancelled.to_string(),
                        });
                        outcome.followups.push(Intent::AgentResult(AgentResult::failure(
                            &task.id,
                            BackendError::Cancelled.to_string(),
                        )));
                        continue;
                    }
                    let (intent, failure) = match task.kind {
                        AgentTaskKind::Planning => self.run_planner(task).await,
                        AgentTaskKind::Execution => self.run_executor(task).await,
                    };
                    if let Some(failure) = failure {
                        outcome.failures.push(failure);
                    }
                    outcome.followups.push(intent);
                }
            }
        }

        outcome
    }

    /// Invoke the planner: one attempt with the domain prompt, one
    /// retry with a strict-JSON reminder, then give up and report the
    /// task as failed.
    async fn run_planner(&self, task: &AgentTask) -> (Intent, Option<DispatchFailure>) {
        let context: PromptContext =
            serde_json::from_value(task.input.clone()).unwrap_or_default();
        let prompt = PlannerPromptTemplate::build(&context, self.planner_mode);

        self.events.log(OrchestrationEvent::new(
            "planner_invoked",
            json!({"taskId": task.id, "stage": context.stage.as_str()}),
        ));

        let raw = match self.planner.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => return self.planner_failure(task, e.to_string()),
        };

        let parse_error = match parse_planner_text(&raw) {
            Ok(parsed) => return self.planner_success(task, parsed.to_value()),
            Err(e) => e,
        };

        debug!(
            "Planner reply for {} unparseable ({}), retrying with strict reminder",
            task.id, parse_error
        );
        self.events.log(OrchestrationEvent::new(
            "planner_retry",
            json!({"taskId": task.id, "error": parse_error.to_string()}),
        ));

        let retry_prompt = format!(
            "{}\n\n{}",
            prompt,
            PlannerPromptTemplate::strict_json_reminder()
        );
        let retry_raw = match self.planner.complete(&retry_prompt).await {
            Ok(raw) => raw,
            Err(e) => return self.planner_failure(task, e.to_string()),
        };

        match parse_planner_text(&retry_raw) {
            Ok(parsed) => self.planner_success(task, parsed.to_value()),
            Err(e) => self.planner_failure(
                task,
                format!(
                    "planner output invalid after retry: {} (reply: {})",
                    e,
                    truncate_str(&retry_raw, RAW_QUOTE_BYTES)
                ),
            ),
        }
    }

    fn planner_success(
        &self,
        task: &AgentTask,
        output: serde_json::Value,
    ) -> (Intent, Option<DispatchFailure>) {
        info!("Planner replied for task {}", task.id);
        (
            Intent::AgentResult(AgentResult::success(&task.id).with_output(output)),
            None,
        )
    }

    fn planner_failure(
        &self,
        task: &AgentTask,
        error: String,
    ) -> (Intent, Option<DispatchFailure>) {
        warn!("Planner dispatch for task {} failed: {}", task.id, error);
        self.events.log(OrchestrationEvent::new(
            "planner_failed",
            json!({"taskId": task.id, "error": error}),
        ));
        (
            Intent::AgentResult(AgentResult::failure(&task.id, error.clone())),
            Some(DispatchFailure {
                effect: format!("planner {}", task.id),
                error,
            }),
        )
    }

    async fn run_executor(&self, task: &AgentTask) -> (Intent, Option<DispatchFailure>) {
        let envelope = TaskEnvelope::from_task(task);
        self.events.log(OrchestrationEvent::new(
            "executor_invoked",
            json!({"taskId": task.id}),
        ));

        match self.executor.execute(&envelope).await {
            Ok(raw) => {
                let result = parse_executor_reply(&task.id, &raw);
                self.events.log(OrchestrationEvent::new(
                    "executor_replied",
                    json!({"taskId": task.id, "status": result.status.as_str()}),
                ));
                (Intent::AgentResult(result), None)
            }
            Err(e) => {
                warn!("Executor dispatch for task {} failed: {}", task.id, e);
                self.events.log(OrchestrationEvent::new(
                    "executor_failed",
                    json!({"taskId": task.id, "error": e.to_string()}),
                ));
                (
                    Intent::AgentResult(AgentResult::failure(&task.id, e.to_string())),
                    Some(DispatchFailure {
                        effect: format!("executor {}", task.id),
                        error: e.to_string(),
                    }),
                )
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation_token
            .as_ref()
            .is_some_and(|t| t.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::approval_surface::RecordingApprovalSurface;
    use foreman_domain::{AgentResultStatus, ApprovalRequest, PlanningStage};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const T1: &str = "2026-01-01T00:00:01.000Z";

    struct QueuedPlanner {
        replies: Mutex<VecDeque<Result<String, BackendError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl QueuedPlanner {
        fn new(replies: Vec<Result<String, BackendError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl PlannerBackend for QueuedPlanner {
        async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(BackendError::Unavailable("no reply queued".to_string())))
        }
    }

    struct QueuedExecutor {
        replies: Mutex<VecDeque<Result<String, BackendError>>>,
    }

    impl QueuedExecutor {
        fn new(replies: Vec<Result<String, BackendError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
            }
        }
    }

    #[async_trait::async_trait]
    impl ExecutorBackend for QueuedExecutor {
        async fn execute(&self, _envelope: &TaskEnvelope) -> Result<String, BackendError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(BackendError::Unavailable("no reply queued".to_string())))
        }
    }

    fn planning_task() -> AgentTask {
        let context = PromptContext {
            goal: Some("build X".to_string()),
            stage: PlanningStage::Final,
            ..Default::default()
        };
        let mut task = AgentTask::planning(&context, T1);
        task.mark_dispatched(T1);
        task
    }

    fn plan_reply() -> String {
        serde_json::json!({
            "plan": {
                "roadmap": [{"title": "M1"}],
                "features": [{"title": "F1"}],
                "tasks": [{"title": "T1", "role": "backend"}]
            }
        })
        .to_string()
    }

    fn dispatcher(planner: Arc<QueuedPlanner>, executor: Arc<QueuedExecutor>) -> Dispatcher {
        Dispatcher::new(
            planner,
            executor,
            Arc::new(RecordingApprovalSurface::new()),
        )
    }

    #[tokio::test]
    async fn test_planner_reply_becomes_success_followup() {
        let planner = Arc::new(QueuedPlanner::new(vec![Ok(plan_reply())]));
        let executor = Arc::new(QueuedExecutor::new(vec![]));
        let dispatcher = dispatcher(Arc::clone(&planner), executor);

        let task = planning_task();
        let outcome = dispatcher
            .dispatch(&[Effect::DispatchAgentTask(task.clone())])
            .await;

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.followups.len(), 1);
        match &outcome.followups[0] {
            Intent::AgentResult(result) => {
                assert_eq!(result.task_id, task.id);
                assert_eq!(result.status, AgentResultStatus::Success);
                assert!(result.output.as_ref().unwrap().get("plan").is_some());
            }
            other => panic!("expected agent_result, got {:?}", other),
        }
        assert_eq!(planner.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_reply_retries_with_reminder() {
        // S3: first call returns garbage, retry succeeds
        let planner = Arc::new(QueuedPlanner::new(vec![
            Ok("garbage".to_string()),
            Ok(plan_reply()),
        ]));
        let executor = Arc::new(QueuedExecutor::new(vec![]));
        let dispatcher = dispatcher(Arc::clone(&planner), executor);

        let outcome = dispatcher
            .dispatch(&[Effect::DispatchAgentTask(planning_task())])
            .await;

        assert!(outcome.failures.is_empty());
        match &outcome.followups[0] {
            Intent::AgentResult(result) => assert_eq!(result.status, AgentResultStatus::Success),
            other => panic!("expected agent_result, got {:?}", other),
        }

        let prompts = planner.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains("REMINDER"));
        assert!(prompts[1].contains("strict JSON"));
    }

    #[tokio::test]
    async fn test_two_unparseable_replies_become_failure() {
        let planner = Arc::new(QueuedPlanner::new(vec![
            Ok("garbage".to_string()),
            Ok("still garbage".to_string()),
        ]));
        let executor = Arc::new(QueuedExecutor::new(vec![]));
        let dispatcher = dispatcher(Arc::clone(&planner), executor);

        let outcome = dispatcher
            .dispatch(&[Effect::DispatchAgentTask(planning_task())])
            .await;

        assert_eq!(outcome.failures.len(), 1);
        match &outcome.followups[0] {
            Intent::AgentResult(result) => {
                assert_eq!(result.status, AgentResultStatus::Failure);
                assert!(result.error.as_ref().unwrap().contains("after retry"));
            }
            other => panic!("expected agent_result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_backend_error_becomes_failure_followup() {
        let planner = Arc::new(QueuedPlanner::new(vec![Err(BackendError::Timeout)]));
        let executor = Arc::new(QueuedExecutor::new(vec![]));
        let dispatcher = dispatcher(Arc::clone(&planner), executor);

        let outcome = dispatcher
            .dispatch(&[Effect::DispatchAgentTask(planning_task())])
            .await;

        assert_eq!(outcome.failures.len(), 1);
        match &outcome.followups[0] {
            Intent::AgentResult(result) => {
                assert_eq!(result.status, AgentResultStatus::Failure);
                assert_eq!(result.error.as_deref(), Some("Timeout"));
            }
            other => panic!("expected agent_result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_effects_run_in_list_order() {
        let planner = Arc::new(QueuedPlanner::new(vec![]));
        let executor = Arc::new(QueuedExecutor::new(vec![Ok(
            serde_json::json!({"task_id": "x", "status": "success"}).to_string(),
        )]));
        let surface = Arc::new(RecordingApprovalSurface::new());
        let dispatcher = Dispatcher::new(
            planner,
            executor,
            Arc::clone(&surface) as Arc<dyn ApprovalSurface>,
        );

        let approval = ApprovalRequest::execution_start(vec!["t1".to_string()], T1);
        let def = foreman_domain::ExecutionTaskDef {
            id: "1".to_string(),
            title: "T1".to_string(),
            description: None,
            role: "backend".to_string(),
            depends_on: vec![],
            payload: None,
        };
        let mut exec_task = AgentTask::execution(&def, "plan-abc", T1);
        exec_task.mark_dispatched(T1);

        let outcome = dispatcher
            .dispatch(&[
                Effect::RequestApproval(approval.clone()),
                Effect::DispatchAgentTask(exec_task),
            ])
            .await;

        // The approval was surfaced before the executor followup landed
        assert_eq!(surface.seen(), vec![approval]);
        assert_eq!(outcome.followups.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_dispatch_fails_cleanly() {
        let planner = Arc::new(QueuedPlanner::new(vec![Ok(plan_reply())]));
        let executor = Arc::new(QueuedExecutor::new(vec![]));
        let token = CancellationToken::new();
        token.cancel();
        let dispatcher = dispatcher(Arc::clone(&planner), executor).with_cancellation_token(token);

        let outcome = dispatcher
            .dispatch(&[Effect::DispatchAgentTask(planning_task())])
            .await;

        // The backend was never invoked
        assert!(planner.prompts().is_empty());
        match &outcome.followups[0] {
            Intent::AgentResult(result) => {
                assert_eq!(result.status, AgentResultStatus::Failure);
                assert!(result.error.as_ref().unwrap().contains("cancelled"));
            }
            other => panic!("expected agent_result, got {:?}", other),
        }
    }
}
