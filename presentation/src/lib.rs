//! Presentation layer for foreman
//!
//! The clap CLI surface, the console approval surface, and the
//! plain-text status formatter.

pub mod approval;
pub mod cli;
pub mod output;

pub use approval::console::ConsoleApprovalSurface;
pub use cli::commands::{Cli, Command};
pub use output::formatter::StatusFormatter;
