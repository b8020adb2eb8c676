//! Plans: snapshots, drafts, parsing and normalization

pub mod entities;
pub mod normalize;
pub mod parser;
pub mod value_objects;
