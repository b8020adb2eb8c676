//! Persistence adapters

pub mod json_store;
