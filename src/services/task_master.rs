//! Task master: the single-writer scheduler over a validated task graph.
//!
//! Owns every `TaskExecution` record. The coordinator is the only caller of
//! the mutating methods, which keeps "promote dependents to Ready" and "pick
//! next Ready task" from ever interleaving inconsistently.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    ExecutionStatus, StatusSummary, Task, TaskExecution, TaskGraph,
};

/// Stateful scheduler wrapping one validated [`TaskGraph`].
#[derive(Debug, Default)]
pub struct TaskMaster {
    graph: Option<TaskGraph>,
    executions: HashMap<String, TaskExecution>,
    /// Deterministic topological order computed at enqueue.
    execution_order: Vec<String>,
    /// dependency id -> dependent ids, for skip propagation.
    dependents: HashMap<String, Vec<String>>,
    max_retries: u32,
}

impl TaskMaster {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Load a task graph: validate it, compute the execution order, create
    /// one Pending execution record per task, then promote zero-dependency
    /// tasks to Ready.
    pub fn enqueue(&mut self, graph: TaskGraph) -> DomainResult<()> {
        graph.validate()?;
        let order = graph.execution_order()?;

        self.executions = graph
            .tasks
            .iter()
            .map(|t| (t.id.clone(), TaskExecution::new(&t.id, self.max_retries)))
            .collect();
        self.dependents = graph.dependents_map();
        self.execution_order = order;

        for task in &graph.tasks {
            if task.dependencies.is_empty() {
                if let Some(exec) = self.executions.get_mut(&task.id) {
                    exec.status = ExecutionStatus::Ready;
                }
            }
        }

        info!(
            session_id = %graph.session_id,
            tasks = graph.len(),
            "task graph enqueued"
        );
        self.graph = Some(graph);
        Ok(())
    }

    /// Select the first Ready task in execution order, mark it Running, and
    /// return it. `None` means nothing is currently schedulable: either all
    /// work is terminal, tasks are still running, or the remainder is blocked
    /// behind failures.
    pub fn schedule_next(&mut self) -> Option<Task> {
        let next_id = self
            .execution_order
            .iter()
            .find(|id| {
                self.executions
                    .get(id.as_str())
                    .is_some_and(|e| e.status == ExecutionStatus::Ready)
            })?
            .clone();

        let exec = self.executions.get_mut(&next_id)?;
        exec.status = ExecutionStatus::Running;
        exec.started_at = Some(Utc::now());
        exec.attempts += 1;

        debug!(task_id = %next_id, attempt = exec.attempts, "task scheduled");
        self.graph.as_ref()?.get(&next_id).cloned()
    }

    /// Mark a Running task Done, store its result, and promote any Pending
    /// task whose dependencies are now all Done.
    pub fn mark_done(&mut self, task_id: &str, result: serde_json::Value) -> DomainResult<()> {
        let exec = self.execution_mut(task_id)?;
        if exec.status != ExecutionStatus::Running {
            return Err(DomainError::InvalidExecutionState {
                task_id: task_id.to_string(),
                expected: ExecutionStatus::Running,
                actual: exec.status,
            });
        }
        exec.status = ExecutionStatus::Done;
        exec.completed_at = Some(Utc::now());
        exec.result = Some(result);
        debug!(task_id = %task_id, "task done");

        self.promote_ready();
        Ok(())
    }

    /// Mark a Running task failed.
    ///
    /// Returns `true` when the task was reset to Ready for another attempt
    /// and `false` when retries are exhausted, in which case every transitive
    /// dependent still Pending/Ready is marked Skipped.
    pub fn mark_failed(&mut self, task_id: &str, error: impl Into<String>) -> DomainResult<bool> {
        let error = error.into();
        let exec = self.execution_mut(task_id)?;
        if exec.status != ExecutionStatus::Running {
            return Err(DomainError::InvalidExecutionState {
                task_id: task_id.to_string(),
                expected: ExecutionStatus::Running,
                actual: exec.status,
            });
        }

        exec.failures_total += 1;
        exec.error_message = Some(error.clone());

        if exec.can_retry() {
            exec.status = ExecutionStatus::Ready;
            debug!(task_id = %task_id, attempt = exec.attempts, "task failed, retrying");
            return Ok(true);
        }

        exec.status = ExecutionStatus::Failed;
        exec.completed_at = Some(Utc::now());
        warn!(task_id = %task_id, error = %error, "task terminally failed");

        self.skip_dependents(task_id);
        Ok(false)
    }

    /// Worklist DFS over the dependents map: every transitive dependent that
    /// has not yet run is Skipped. Tasks already Done/Failed are untouched.
    fn skip_dependents(&mut self, failed_id: &str) {
        let mut worklist: Vec<String> = self
            .dependents
            .get(failed_id)
            .cloned()
            .unwrap_or_default();

        while let Some(id) = worklist.pop() {
            let Some(exec) = self.executions.get_mut(&id) else {
                continue;
            };
            if !matches!(
                exec.status,
                ExecutionStatus::Pending | ExecutionStatus::Ready
            ) {
                continue;
            }
            exec.status = ExecutionStatus::Skipped;
            exec.completed_at = Some(Utc::now());
            debug!(task_id = %id, blocked_by = %failed_id, "task skipped");
            if let Some(children) = self.dependents.get(&id) {
                worklist.extend(children.iter().cloned());
            }
        }
    }

    /// Promote every Pending task whose dependency set is fully Done.
    fn promote_ready(&mut self) {
        let Some(graph) = &self.graph else { return };
        let promotable: Vec<String> = graph
            .tasks
            .iter()
            .filter(|t| {
                self.executions
                    .get(&t.id)
                    .is_some_and(|e| e.status == ExecutionStatus::Pending)
                    && t.dependencies.iter().all(|d| {
                        self.executions
                            .get(d)
                            .is_some_and(|e| e.status == ExecutionStatus::Done)
                    })
            })
            .map(|t| t.id.clone())
            .collect();

        for id in promotable {
            if let Some(exec) = self.executions.get_mut(&id) {
                exec.status = ExecutionStatus::Ready;
                debug!(task_id = %id, "task ready");
            }
        }
    }

    /// Re-arm failed work for a fix cycle: Failed -> Ready, Skipped ->
    /// Pending, with a fresh per-cycle attempt budget. Lifetime failure
    /// counts are preserved so routing keeps escalating. Returns the number
    /// of re-armed tasks.
    pub fn requeue_failed(&mut self) -> usize {
        let mut requeued = 0;
        for exec in self.executions.values_mut() {
            match exec.status {
                ExecutionStatus::Failed => {
                    exec.status = ExecutionStatus::Ready;
                    exec.attempts = 0;
                    exec.completed_at = None;
                    requeued += 1;
                }
                ExecutionStatus::Skipped => {
                    exec.status = ExecutionStatus::Pending;
                    exec.attempts = 0;
                    exec.completed_at = None;
                }
                _ => {}
            }
        }
        // Skipped tasks whose dependencies were in fact Done can go straight
        // back to Ready.
        self.promote_ready();
        info!(requeued, "failed tasks re-armed for fix cycle");
        requeued
    }

    /// Execution record for a task, if known.
    pub fn execution(&self, task_id: &str) -> Option<&TaskExecution> {
        self.executions.get(task_id)
    }

    /// Aggregate status counts.
    pub fn status_summary(&self) -> StatusSummary {
        let mut summary = StatusSummary {
            total: self.executions.len(),
            ..StatusSummary::default()
        };
        for exec in self.executions.values() {
            match exec.status {
                ExecutionStatus::Pending => summary.pending += 1,
                ExecutionStatus::Ready => summary.ready += 1,
                ExecutionStatus::Running => summary.running += 1,
                ExecutionStatus::Done => summary.done += 1,
                ExecutionStatus::Failed => summary.failed += 1,
                ExecutionStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }

    /// Ids of terminally failed tasks, in execution order.
    pub fn failed_task_ids(&self) -> Vec<String> {
        self.execution_order
            .iter()
            .filter(|id| {
                self.executions
                    .get(id.as_str())
                    .is_some_and(|e| e.status == ExecutionStatus::Failed)
            })
            .cloned()
            .collect()
    }

    fn execution_mut(&mut self, task_id: &str) -> DomainResult<&mut TaskExecution> {
        self.executions
            .get_mut(task_id)
            .ok_or_else(|| DomainError::TaskNotFound(task_id.to_string()))
    }
}
