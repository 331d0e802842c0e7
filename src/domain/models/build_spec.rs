//! Build specification consumed by the gate pipeline.
//!
//! Derived upstream from questionnaire answers; the orchestration core only
//! reads its scope budget and policy limits.

use serde::{Deserialize, Serialize};

/// Session-wide scope budget the feasibility gate enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeBudget {
    /// Maximum files the whole build may create or modify.
    pub max_files: u32,
    /// Maximum UI screens the build may create.
    pub max_screens: u32,
    /// Maximum data entities the build may create.
    pub max_entities: u32,
}

impl Default for ScopeBudget {
    fn default() -> Self {
        Self {
            max_files: 60,
            max_screens: 8,
            max_entities: 12,
        }
    }
}

/// Per-task policy limits the diff/command gate enforces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyLimits {
    /// Maximum files a single task's diff may touch.
    pub max_files_per_task: u32,
    /// Maximum changed lines a single task's diff may contain.
    pub max_diff_lines_per_task: u32,
    /// Whether tasks may run network-accessing commands.
    pub allow_network: bool,
}

impl Default for PolicyLimits {
    fn default() -> Self {
        Self {
            max_files_per_task: 10,
            max_diff_lines_per_task: 500,
            allow_network: false,
        }
    }
}

/// Deterministic build specification (stack, scope budget, policy limits).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSpec {
    /// Project name.
    pub name: String,
    /// Target stack description (informational for the core).
    #[serde(default)]
    pub stack: String,
    #[serde(default)]
    pub scope: ScopeBudget,
    #[serde(default)]
    pub policy: PolicyLimits,
}

impl BuildSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stack: String::new(),
            scope: ScopeBudget::default(),
            policy: PolicyLimits::default(),
        }
    }
}

impl Default for BuildSpec {
    fn default() -> Self {
        Self::new("unnamed")
    }
}
