//! Per-task execution state.
//!
//! `TaskExecution` records are created on enqueue and mutated only by the
//! task master; everything else reads them through status queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a task in the execution pipeline.
///
/// ```text
/// Pending -> Ready -> Running -> { Done | retried -> Ready | Failed }
/// Failed propagates Skipped to all transitive dependents.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Defined but dependencies not yet satisfied.
    Pending,
    /// Dependencies satisfied; eligible for scheduling.
    Ready,
    /// Currently dispatched to an agent.
    Running,
    /// Completed successfully.
    Done,
    /// Terminally failed (retries exhausted or gate-blocked).
    Failed,
    /// Never ran; an upstream dependency failed.
    Skipped,
}

impl Default for ExecutionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Whether this status is terminal for the task.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Skipped)
    }

    /// Valid transitions from this status.
    pub fn valid_transitions(&self) -> &'static [ExecutionStatus] {
        match self {
            Self::Pending => &[Self::Ready, Self::Skipped],
            Self::Ready => &[Self::Running, Self::Skipped],
            // Running -> Ready is the retry path.
            Self::Running => &[Self::Done, Self::Failed, Self::Ready],
            Self::Done | Self::Failed | Self::Skipped => &[],
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        self.valid_transitions().contains(&next)
    }
}

/// Mutable execution record for one task, owned exclusively by the task
/// master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskExecution {
    pub task_id: String,
    pub status: ExecutionStatus,
    /// Scheduling attempts in the current fix cycle.
    pub attempts: u32,
    /// Lifetime failure count; never reset, drives role escalation.
    pub failures_total: u32,
    pub max_retries: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub result: Option<serde_json::Value>,
}

impl TaskExecution {
    pub fn new(task_id: impl Into<String>, max_retries: u32) -> Self {
        Self {
            task_id: task_id.into(),
            status: ExecutionStatus::default(),
            attempts: 0,
            failures_total: 0,
            max_retries,
            started_at: None,
            completed_at: None,
            error_message: None,
            result: None,
        }
    }

    /// Failures observed so far, as fed to the routing escalation ladder.
    pub fn failure_count(&self) -> u32 {
        self.failures_total
    }

    /// Whether another retry is permitted. A task may consume at most
    /// `max_retries + 1` attempts before becoming terminally Failed.
    pub fn can_retry(&self) -> bool {
        self.attempts <= self.max_retries
    }
}

/// Aggregate counts across all execution records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub total: usize,
    pub pending: usize,
    pub ready: usize,
    pub running: usize,
    pub done: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StatusSummary {
    /// All tasks are in a terminal state.
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.done + self.failed + self.skipped == self.total
    }

    /// At least one task failed or was skipped.
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.skipped > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        assert!(ExecutionStatus::Pending.can_transition_to(ExecutionStatus::Ready));
        assert!(ExecutionStatus::Ready.can_transition_to(ExecutionStatus::Running));
        assert!(ExecutionStatus::Running.can_transition_to(ExecutionStatus::Done));
        assert!(ExecutionStatus::Running.can_transition_to(ExecutionStatus::Ready));
        assert!(!ExecutionStatus::Done.can_transition_to(ExecutionStatus::Ready));
        assert!(!ExecutionStatus::Pending.can_transition_to(ExecutionStatus::Running));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ExecutionStatus::Done.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(ExecutionStatus::Skipped.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
    }

    #[test]
    fn test_retry_budget() {
        let mut exec = TaskExecution::new("t", 2);
        // Three total attempts permitted: retry allowed after attempts 1 and 2,
        // exhausted after attempt 3.
        exec.attempts = 1;
        assert!(exec.can_retry());
        exec.attempts = 2;
        assert!(exec.can_retry());
        exec.attempts = 3;
        assert!(!exec.can_retry());
    }

    #[test]
    fn test_summary_completion() {
        let summary = StatusSummary {
            total: 3,
            done: 2,
            skipped: 1,
            ..Default::default()
        };
        assert!(summary.is_complete());
        assert!(summary.has_failures());

        let running = StatusSummary {
            total: 3,
            done: 2,
            running: 1,
            ..Default::default()
        };
        assert!(!running.is_complete());
        assert!(!running.has_failures());
    }
}
