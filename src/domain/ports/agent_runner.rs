//! Agent execution port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{RoleAssignment, Task};

/// Result of one agent dispatch.
#[derive(Debug, Clone, Default)]
pub struct TaskOutcome {
    pub success: bool,
    /// Artifacts/outputs reported by the agent, keyed by name.
    pub outputs: serde_json::Value,
    pub logs: Vec<String>,
    pub error: Option<String>,
}

impl TaskOutcome {
    pub fn succeeded(outputs: serde_json::Value) -> Self {
        Self {
            success: true,
            outputs,
            logs: Vec::new(),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            outputs: serde_json::Value::Null,
            logs: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Executes one task under a role/model assignment.
///
/// An opaque async call; the core does not know whether it is backed by a
/// direct LLM call or a multi-agent framework.
#[async_trait]
pub trait AgentRunner: Send + Sync {
    async fn run_task(&self, task: &Task, assignment: &RoleAssignment) -> DomainResult<TaskOutcome>;
}
