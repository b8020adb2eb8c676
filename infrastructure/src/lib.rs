//! Infrastructure layer for foreman
//!
//! Adapters for the application ports: a JSON file state store,
//! command-spawning and scripted agent backends, a JSONL event
//! logger, and the figment-based configuration loader.

pub mod backends;
pub mod config;
pub mod logging;
pub mod persistence;

pub use backends::command::{CommandExecutor, CommandPlanner};
pub use backends::scripted::{ScriptedExecutor, ScriptedPlanner};
pub use config::file_config::FileConfig;
pub use config::loader::ConfigLoader;
pub use logging::jsonl_logger::JsonlEventLogger;
pub use persistence::json_store::JsonStateStore;
