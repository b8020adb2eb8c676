//! Configuration file schema

use foreman_domain::{PlannerMode, SettingsPatch};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration merged from defaults, the global config
/// file, the project file, and an explicit `--config` path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub store: StoreConfig,
    pub approvals: ApprovalConfig,
    pub planner: PlannerConfig,
    pub executor: ExecutorConfig,
    pub log: LogConfig,
}

/// Where the canonical state lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(".foreman/state.json"),
        }
    }
}

/// Which lifecycle gates require explicit approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    pub require_execution_approval: bool,
    pub require_retry_approval: bool,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            require_execution_approval: false,
            require_retry_approval: true,
        }
    }
}

impl ApprovalConfig {
    /// Settings patch applied when creating a project.
    pub fn settings_patch(&self) -> SettingsPatch {
        SettingsPatch {
            require_execution_approval: Some(self.require_execution_approval),
            require_retry_approval: Some(self.require_retry_approval),
        }
    }
}

/// Planner backend configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Prompt register; the source default is `conversation`
    pub mode: PlannerMode,
    /// Shell command invoked per planning round (prompt on stdin)
    pub command: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Executor backend configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Shell command invoked per task (envelope JSON on stdin)
    pub command: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Observability sinks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// JSONL orchestration event log path
    pub events: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FileConfig::default();
        assert_eq!(config.store.path, PathBuf::from(".foreman/state.json"));
        assert!(!config.approvals.require_execution_approval);
        assert!(config.approvals.require_retry_approval);
        assert_eq!(config.planner.mode, PlannerMode::Conversation);
        assert!(config.planner.command.is_none());
        assert!(config.log.events.is_none());
    }

    #[test]
    fn test_parses_from_toml() {
        let config: FileConfig = toml::from_str(
            r#"
            [store]
            path = "/tmp/project/state.json"

            [approvals]
            require_execution_approval = true

            [planner]
            mode = "checklist"
            command = "my-planner --json"

            [log]
            events = "/tmp/project/events.jsonl"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.path, PathBuf::from("/tmp/project/state.json"));
        assert!(config.approvals.require_execution_approval);
        assert!(config.approvals.require_retry_approval);
        assert_eq!(config.planner.mode, PlannerMode::Checklist);
        assert_eq!(config.planner.command.as_deref(), Some("my-planner --json"));
        assert_eq!(
            config.log.events,
            Some(PathBuf::from("/tmp/project/events.jsonl"))
        );
    }

    #[test]
    fn test_settings_patch_mirrors_approvals() {
        let approvals = ApprovalConfig {
            require_execution_approval: true,
            require_retry_approval: false,
        };
        let patch = approvals.settings_patch();
        assert_eq!(patch.require_execution_approval, Some(true));
        assert_eq!(patch.require_retry_approval, Some(false));
    }
}
