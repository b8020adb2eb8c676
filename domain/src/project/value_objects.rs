//! Project value objects

use serde::{Deserialize, Serialize};

/// Structured scoping context supplied at project creation or refined
/// through clarifications (Value Object).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectContext {
    /// Ideal customer profile
    pub icp: Option<String>,
    /// Technologies the project commits to
    pub tech_stack: Vec<String>,
    /// Hard constraints (budget, timeline, licensing, ...)
    pub constraints: Vec<String>,
    /// Features the project must ship
    pub core_features: Vec<String>,
}

impl ProjectContext {
    pub fn has_icp(&self) -> bool {
        self.icp.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    pub fn has_tech_stack(&self) -> bool {
        !self.tech_stack.is_empty()
    }

    pub fn has_constraints(&self) -> bool {
        !self.constraints.is_empty()
    }

    pub fn has_core_features(&self) -> bool {
        !self.core_features.is_empty()
    }
}
