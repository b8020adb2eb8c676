//! Approval surface adapters

pub mod console;
