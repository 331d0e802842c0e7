//! Domain errors for the taskforge orchestration core.

use thiserror::Error;

use super::models::execution::ExecutionStatus;
use super::models::session::SessionPhase;

/// Format a cycle path as a human-readable string: `a -> b -> c -> a`.
fn format_cycle_path(path: &[String]) -> String {
    path.join(" -> ")
}

/// Domain-level errors that can occur in the orchestration core.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed task graph: duplicate ids, dangling dependencies, invalid
    /// task definitions. Fatal; rejected before any execution begins.
    #[error("Task graph validation failed: {}", .0.join("; "))]
    GraphValidation(Vec<String>),

    /// The dependency relation contains a cycle.
    #[error("Task dependency cycle detected: {}", format_cycle_path(.0))]
    DependencyCycle(Vec<String>),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// A task execution record is not in the status an operation requires.
    #[error("Task '{task_id}' is {actual:?}, expected {expected:?}")]
    InvalidExecutionState {
        task_id: String,
        expected: ExecutionStatus,
        actual: ExecutionStatus,
    },

    /// A session-phase transition not permitted by the transition table.
    /// The session phase is left unchanged.
    #[error("Illegal session transition from {from:?} to {to:?}")]
    IllegalTransition { from: SessionPhase, to: SessionPhase },

    /// The VERIFICATION -> EXECUTION fix loop exceeded its bound.
    #[error("Fix loop exhausted after {cycles} cycles")]
    FixLoopExhausted { cycles: u32 },

    /// No task graph is attached to the session where one is required.
    #[error("Session has no task graph: {0}")]
    MissingTaskGraph(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The session was aborted by an external request.
    #[error("Session aborted: {0}")]
    Aborted(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
