//! Event logging adapters

pub mod jsonl_logger;
