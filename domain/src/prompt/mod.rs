//! Prompt templates for the planner

pub mod planner;

pub use planner::{PlannerMode, PlannerPromptTemplate};
