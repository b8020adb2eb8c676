//! CLI entrypoint for foreman
//!
//! Wires the layers together with dependency injection: config file,
//! JSON state store, command or scripted backends, console approval
//! surface, and the orchestrator facade.

use anyhow::{Context, Result, bail};
use clap::Parser;
use foreman_application::ports::approval_surface::ApprovalSurface;
use foreman_application::ports::event_logger::{EventLogger, NullEventLogger};
use foreman_application::ports::executor_backend::ExecutorBackend;
use foreman_application::ports::planner_backend::PlannerBackend;
use foreman_application::{Dispatcher, Orchestrator};
use foreman_domain::{AgentResult, Intent};
use foreman_infrastructure::{
    CommandExecutor, CommandPlanner, ConfigLoader, JsonStateStore, JsonlEventLogger,
    ScriptedExecutor, ScriptedPlanner,
};
use foreman_presentation::{Cli, Command, ConsoleApprovalSurface, StatusFormatter};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    // Keep the non-blocking writer guard alive for the whole run
    let _log_guard = match &cli.log_file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path
                .file_name()
                .context("--log-file must name a file")?;
            let appender = tracing_appender::rolling::never(
                directory.unwrap_or(std::path::Path::new(".")),
                file_name,
            );
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    };

    // Load configuration
    let config = ConfigLoader::load(cli.config.as_ref())
        .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
    let store_path = cli.state.clone().unwrap_or(config.store.path.clone());

    // === Dependency Injection ===
    let planner: Arc<dyn PlannerBackend> = match &config.planner.command {
        Some(command) => {
            let mut backend = CommandPlanner::new(command);
            if let Some(secs) = config.planner.timeout_secs {
                backend = backend.with_timeout(Duration::from_secs(secs));
            }
            Arc::new(backend)
        }
        None => {
            warn!("No planner command configured; planning rounds will fail until one is set");
            Arc::new(ScriptedPlanner::new(vec![]))
        }
    };
    let executor: Arc<dyn ExecutorBackend> = match &config.executor.command {
        Some(command) => {
            let mut backend = CommandExecutor::new(command);
            if let Some(secs) = config.executor.timeout_secs {
                backend = backend.with_timeout(Duration::from_secs(secs));
            }
            Arc::new(backend)
        }
        None => {
            warn!(
                "No executor command configured; feed results with `foreman result` instead"
            );
            Arc::new(ScriptedExecutor::new(vec![]))
        }
    };
    let approvals: Arc<dyn ApprovalSurface> = Arc::new(ConsoleApprovalSurface);
    let events: Arc<dyn EventLogger> = match &config.log.events {
        Some(path) => match JsonlEventLogger::new(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NullEventLogger),
        },
        None => Arc::new(NullEventLogger),
    };

    let dispatcher = Dispatcher::new(planner, executor, approvals)
        .with_event_logger(Arc::clone(&events))
        .with_planner_mode(config.planner.mode);
    let orchestrator =
        Orchestrator::new(JsonStateStore::new(&store_path), dispatcher).with_event_logger(events);

    let loaded = orchestrator.initialize().await?;
    info!(
        "State store: {} ({})",
        store_path.display(),
        if loaded.is_some() { "existing project" } else { "empty" }
    );

    // Read-only path
    if matches!(cli.command, Command::Status) {
        match loaded {
            Some(state) => println!("{}", StatusFormatter::format(&state)),
            None => println!("No project yet. Start one with `foreman init --goal \"...\"`."),
        }
        return Ok(());
    }

    let intent = match &cli.command {
        Command::Result { source } => {
            let raw = read_source(source)?;
            let result: AgentResult = serde_json::from_str(&raw)
                .context("agent result must be a JSON result object")?;
            Intent::AgentResult(result)
        }
        command => match command.to_intent() {
            Some(intent) => intent,
            None => bail!("unsupported command"),
        },
    };

    let state = orchestrator.drive(intent).await?;
    println!("{}", StatusFormatter::format(&state));

    Ok(())
}

fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {}", source))
    }
}
