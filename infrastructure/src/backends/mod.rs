//! Agent backend adapters

pub mod command;
pub mod scripted;
