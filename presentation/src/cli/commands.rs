//! Command-line interface definitions.
//!
//! Subcommands map 1:1 onto orchestrator intents; `status` only
//! renders the committed snapshot and `result` feeds an out-of-band
//! agent result back into the lifecycle.

use clap::{ArgAction, Parser, Subcommand};
use foreman_domain::{Intent, ProjectContext, SettingsPatch};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "foreman",
    about = "Local human-in-the-loop agent orchestrator",
    version
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Explicit config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the state file path
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Write tracing output to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a project and start the first planning round
    Init {
        /// Project identifier
        #[arg(long, default_value = "default")]
        project_id: String,
        /// What the project should achieve
        #[arg(long)]
        goal: String,
        /// Ideal customer profile
        #[arg(long)]
        icp: Option<String>,
        /// Technology the project commits to (repeatable)
        #[arg(long = "tech")]
        tech_stack: Vec<String>,
        /// Hard constraint (repeatable)
        #[arg(long = "constraint")]
        constraints: Vec<String>,
        /// Core feature (repeatable)
        #[arg(long = "feature")]
        core_features: Vec<String>,
        /// Require an approval before execution starts
        #[arg(long)]
        require_execution_approval: bool,
        /// Skip the approval gate on retries
        #[arg(long)]
        no_retry_approval: bool,
    },
    /// Show the committed project state
    Status,
    /// Plan an additional feature
    Feature {
        /// What to add
        description: String,
    },
    /// Record clarification questions without invoking the planner
    Clarify {
        /// Questions to put to the user
        questions: Vec<String>,
        /// Optional note for the discussion timeline
        #[arg(long)]
        note: Option<String>,
    },
    /// Answer an open clarification
    Answer {
        /// Clarification id
        clarification_id: String,
        /// Answers, aligned with the questions
        answers: Vec<String>,
    },
    /// Resolve all clarifications and force a final plan
    Finalize {
        #[arg(long)]
        note: Option<String>,
    },
    /// Adopt a proposed plan
    ApprovePlan {
        approval_id: String,
        plan_id: String,
    },
    /// Consume an execution-start or retry approval
    ApproveExecution { approval_id: String },
    /// Re-enter planning
    Replan {
        #[arg(long)]
        reason: Option<String>,
    },
    /// Dispatch pending execution tasks
    Run {
        /// Restrict to these task ids
        task_ids: Vec<String>,
    },
    /// Retry failed execution tasks
    Retry {
        /// Restrict to these task ids
        task_ids: Vec<String>,
    },
    /// Pause execution
    Pause {
        #[arg(long)]
        reason: Option<String>,
    },
    /// Feed an agent result JSON (from a file, or stdin with -)
    Result {
        /// Path to the result JSON; "-" reads stdin
        #[arg(default_value = "-")]
        source: String,
    },
}

impl Command {
    /// Convert to an intent. `Status` and `Result` have no direct
    /// mapping here: `Status` is read-only and `Result` needs I/O the
    /// binary performs.
    pub fn to_intent(&self) -> Option<Intent> {
        match self {
            Command::Init {
                project_id,
                goal,
                icp,
                tech_stack,
                constraints,
                core_features,
                require_execution_approval,
                no_retry_approval,
            } => {
                let context = ProjectContext {
                    icp: icp.clone(),
                    tech_stack: tech_stack.clone(),
                    constraints: constraints.clone(),
                    core_features: core_features.clone(),
                };
                let has_context = context != ProjectContext::default();
                Some(Intent::CreateProject {
                    project_id: project_id.clone(),
                    goal: Some(goal.clone()),
                    context: has_context.then_some(context),
                    settings: Some(SettingsPatch {
                        require_execution_approval: require_execution_approval
                            .then_some(true),
                        require_retry_approval: no_retry_approval.then_some(false),
                    }),
                })
            }
            Command::Status | Command::Result { .. } => None,
            Command::Feature { description } => Some(Intent::AddFeature {
                description: description.clone(),
            }),
            Command::Clarify { questions, note } => Some(Intent::RequestClarifications {
                questions: questions.clone(),
                discussion: note.clone(),
            }),
            Command::Answer {
                clarification_id,
                answers,
            } => Some(Intent::AnswerClarifications {
                clarification_id: clarification_id.clone(),
                answers: answers.clone(),
            }),
            Command::Finalize { note } => Some(Intent::FinalizeScope { note: note.clone() }),
            Command::ApprovePlan {
                approval_id,
                plan_id,
            } => Some(Intent::ApprovePlan {
                approval_id: approval_id.clone(),
                plan_id: plan_id.clone(),
            }),
            Command::ApproveExecution { approval_id } => Some(Intent::ApproveExecution {
                approval_id: approval_id.clone(),
            }),
            Command::Replan { reason } => Some(Intent::Replan {
                reason: reason.clone(),
            }),
            Command::Run { task_ids } => Some(Intent::RunTasks {
                task_ids: (!task_ids.is_empty()).then(|| task_ids.clone()),
            }),
            Command::Retry { task_ids } => Some(Intent::RetryTasks {
                task_ids: (!task_ids.is_empty()).then(|| task_ids.clone()),
            }),
            Command::Pause { reason } => Some(Intent::PauseExecution {
                reason: reason.clone(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_maps_to_create_project() {
        let cli = Cli::parse_from([
            "foreman",
            "init",
            "--goal",
            "build X",
            "--icp",
            "SMB",
            "--tech",
            "rust",
            "--require-execution-approval",
        ]);
        let intent = cli.command.to_intent().unwrap();
        match intent {
            Intent::CreateProject {
                goal,
                context,
                settings,
                ..
            } => {
                assert_eq!(goal.as_deref(), Some("build X"));
                assert_eq!(context.unwrap().tech_stack, vec!["rust"]);
                assert_eq!(
                    settings.unwrap().require_execution_approval,
                    Some(true)
                );
            }
            other => panic!("expected create_project, got {:?}", other),
        }
    }

    #[test]
    fn test_status_has_no_intent() {
        let cli = Cli::parse_from(["foreman", "status"]);
        assert!(cli.command.to_intent().is_none());
    }

    #[test]
    fn test_run_with_no_ids_means_all() {
        let cli = Cli::parse_from(["foreman", "run"]);
        assert_eq!(
            cli.command.to_intent(),
            Some(Intent::RunTasks { task_ids: None })
        );
    }

    #[test]
    fn test_retry_with_ids_restricts() {
        let cli = Cli::parse_from(["foreman", "retry", "t-1", "t-2"]);
        match cli.command.to_intent().unwrap() {
            Intent::RetryTasks { task_ids } => {
                assert_eq!(task_ids.unwrap(), vec!["t-1", "t-2"]);
            }
            other => panic!("expected retry_tasks, got {:?}", other),
        }
    }

    #[test]
    fn test_result_defaults_to_stdin() {
        let cli = Cli::parse_from(["foreman", "result"]);
        match cli.command {
            Command::Result { source } => assert_eq!(source, "-"),
            other => panic!("expected result, got {:?}", other),
        }
    }
}
