//! Session coordinator: drives the phase machine and the execution loop.
//!
//! The coordinator owns the session, the task master, the routing policy and
//! the gate pipeline, and is the single writer for all of them. Workers only
//! run agents and apply approved effects; every scheduling decision happens
//! here, which keeps the task state machine free of data races without locks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    BuildSpec, ExecutionStatus, FailureReport, GateContext, OrchestratorConfig, RoleAssignment,
    ScopeCounters, Session, SessionPhase, StatusSummary, Task, TaskGraph,
};
use crate::domain::ports::{
    AgentRunner, EffectExecutor, EventSink, OrchestrationEvent, Verifier,
};
use crate::services::gates::{diff_paths, GateAdapter, GatePipeline};
use crate::services::{Distributor, TaskMaster};

/// What a worker sends back over the completion channel.
struct WorkerOutcome {
    task_id: String,
    result: Result<(serde_json::Value, usize), String>,
}

/// Orchestrates one build session from start to a terminal phase.
pub struct SessionCoordinator {
    session: Session,
    task_master: TaskMaster,
    distributor: Distributor,
    pipeline: GatePipeline,
    adapter: GateAdapter,
    runner: Arc<dyn AgentRunner>,
    effects: Arc<dyn EffectExecutor>,
    verifier: Arc<dyn Verifier>,
    events: Arc<dyn EventSink>,
    cancel: CancellationToken,
    config: OrchestratorConfig,
    scope: ScopeCounters,
}

impl SessionCoordinator {
    pub fn new(
        config: OrchestratorConfig,
        runner: Arc<dyn AgentRunner>,
        effects: Arc<dyn EffectExecutor>,
        verifier: Arc<dyn Verifier>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            session: Session::new(),
            task_master: TaskMaster::new(config.scheduler.default_max_retries),
            distributor: Distributor::new(config.routing.clone()),
            pipeline: GatePipeline::standard(&config.gates),
            adapter: GateAdapter::new(),
            runner,
            effects,
            verifier,
            events,
            cancel: CancellationToken::new(),
            config,
            scope: ScopeCounters::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Aggregate status counts across all execution records.
    pub fn status(&self) -> StatusSummary {
        self.task_master.status_summary()
    }

    /// Token observed at every suspension point of [`run`](Self::run).
    /// Cancelling it aborts the session at the next opportunity.
    pub fn abort_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// SESSION_START -> QUESTIONNAIRE.
    pub async fn begin(&mut self) -> DomainResult<()> {
        self.transition(SessionPhase::Questionnaire, "session started")
            .await
    }

    /// QUESTIONNAIRE -> SPEC_BUILD, storing the answers' build spec.
    pub async fn submit_questionnaire(&mut self, build_spec: BuildSpec) -> DomainResult<()> {
        self.transition(SessionPhase::SpecBuild, "questionnaire complete")
            .await?;
        self.session.build_spec = Some(build_spec);
        Ok(())
    }

    /// SPEC_BUILD -> IDEA. Requires a stored build spec.
    pub async fn finalize_spec(&mut self) -> DomainResult<()> {
        if self.session.build_spec.is_none() {
            return Err(DomainError::ExecutionFailed(
                "cannot finalize: no build spec has been submitted".to_string(),
            ));
        }
        self.transition(SessionPhase::Idea, "build spec finalized")
            .await
    }

    /// IDEA -> PLAN_REVIEW. The graph is validated on entry; an invalid
    /// graph is rejected and the session stays in IDEA.
    pub async fn submit_plan(&mut self, graph: TaskGraph) -> DomainResult<()> {
        graph.validate()?;
        self.session.graph = Some(graph);
        self.transition(SessionPhase::PlanReview, "plan submitted for review")
            .await
    }

    /// PLAN_REVIEW -> EXECUTION. Enqueues the reviewed graph.
    pub async fn approve_plan(&mut self) -> DomainResult<()> {
        if !self
            .session
            .phase
            .can_transition_to(SessionPhase::Execution)
        {
            return Err(DomainError::IllegalTransition {
                from: self.session.phase,
                to: SessionPhase::Execution,
            });
        }
        let graph = self
            .session
            .graph
            .clone()
            .ok_or_else(|| DomainError::MissingTaskGraph(self.session.id.to_string()))?;
        self.task_master.enqueue(graph)?;
        self.transition(SessionPhase::Execution, "plan approved")
            .await
    }

    /// PLAN_REVIEW -> IDEA, recording the rejection reason.
    pub async fn reject_plan(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        let reason = reason.into();
        self.session.record_error(format!("plan rejected: {reason}"));
        self.transition(SessionPhase::Idea, "plan rejected").await
    }

    /// Abort the session from outside the run loop.
    pub async fn abort(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        self.cancel.cancel();
        if !self.session.phase.is_terminal() {
            self.transition(SessionPhase::Aborted, reason).await?;
        }
        Ok(())
    }

    /// Drive the session from EXECUTION to a terminal phase.
    ///
    /// Loops EXECUTION -> VERIFICATION, re-arming failed work for up to
    /// `max_fix_cycles` fix cycles, and ends in COMPLETE, FAILED, or
    /// ABORTED.
    pub async fn run(&mut self, workspace: &str) -> DomainResult<SessionPhase> {
        if self.session.phase != SessionPhase::Execution {
            return Err(DomainError::ExecutionFailed(format!(
                "run requires the execution phase, session is in {}",
                self.session.phase.as_str()
            )));
        }

        loop {
            self.run_execution().await?;
            self.transition(SessionPhase::Verification, "all tasks terminal")
                .await?;

            if self.cancel.is_cancelled() {
                return self.finish_aborted().await;
            }

            let verification = self.verifier.run_global_verification(workspace).await?;
            let failed_tasks = self.task_master.failed_task_ids();

            if verification.passed && failed_tasks.is_empty() {
                self.transition(SessionPhase::Complete, "verification passed")
                    .await?;
                info!(session_id = %self.session.id, "session complete");
                return Ok(SessionPhase::Complete);
            }

            for failure in &verification.failures {
                self.session.record_error(failure.clone());
            }
            if !failed_tasks.is_empty() {
                self.session
                    .record_error(format!("tasks failed terminally: {}", failed_tasks.join(", ")));
            }

            self.session.fix_cycles += 1;
            let max = self.config.scheduler.max_fix_cycles;
            if self.session.fix_cycles > max {
                return self
                    .finish_failed(format!("build did not converge within {max} fix cycles"))
                    .await;
            }

            let requeued = self.task_master.requeue_failed();
            self.transition(
                SessionPhase::Execution,
                format!(
                    "fix cycle {} ({requeued} tasks re-armed)",
                    self.session.fix_cycles
                ),
            )
            .await?;
        }
    }

    /// One EXECUTION phase: dispatch until every task is terminal.
    async fn run_execution(&mut self) -> DomainResult<()> {
        let pool_size = self.config.scheduler.worker_pool_size.max(1);
        let (tx, mut rx) = mpsc::channel::<WorkerOutcome>(pool_size);
        let mut in_flight = 0usize;
        // Cloned so the select arm does not hold a borrow of self.
        let cancel = self.cancel.clone();

        loop {
            if cancel.is_cancelled() {
                self.finish_aborted().await?;
                return Ok(());
            }

            while in_flight < pool_size {
                let Some(task) = self.task_master.schedule_next() else {
                    break;
                };

                let (failure_count, attempt) = self
                    .task_master
                    .execution(&task.id)
                    .map(|e| (e.failure_count(), e.attempts))
                    .unwrap_or((0, 1));
                let assignment = self.distributor.route(&task, failure_count);

                let build_spec = self.session.build_spec.clone().unwrap_or_default();
                let report = {
                    let ctx = GateContext {
                        task_id: &task.id,
                        build_spec: &build_spec,
                        proposed_commands: &task.proposed_commands,
                        proposed_diff: task.proposed_diff.as_deref(),
                        scope: self.projected_scope(&task),
                        max_files_per_task: task.constraints.max_files,
                        max_diff_lines_per_task: task.constraints.max_diff_lines,
                    };
                    self.pipeline.evaluate(&ctx)
                };

                if report.is_blocked() {
                    let message = self
                        .adapter
                        .block_message(&report)
                        .unwrap_or_else(|| "blocked by gate pipeline".to_string());
                    self.events
                        .emit(OrchestrationEvent::GateVerdict {
                            session_id: self.session.id,
                            task_id: task.id.clone(),
                            status: report.status,
                            message: message.clone(),
                        })
                        .await;
                    self.fail_task(&task.id, message).await?;
                    continue;
                }

                if let Some(clarification) = self.adapter.clarification(&report) {
                    // Warnings never block dispatch; surface the structured
                    // question and proceed.
                    warn!(
                        task_id = %task.id,
                        question = %clarification.question,
                        "gate warnings raised"
                    );
                    self.events
                        .emit(OrchestrationEvent::GateVerdict {
                            session_id: self.session.id,
                            task_id: task.id.clone(),
                            status: report.status,
                            message: clarification.question,
                        })
                        .await;
                }

                self.events
                    .emit(OrchestrationEvent::TaskScheduled {
                        session_id: self.session.id,
                        task_id: task.id.clone(),
                        attempt,
                        role: assignment.role.as_str().to_string(),
                        model: assignment.model.clone(),
                    })
                    .await;

                let runner = Arc::clone(&self.runner);
                let effects = Arc::clone(&self.effects);
                let tx = tx.clone();
                let limit = Duration::from_secs(self.config.scheduler.task_timeout_secs);
                tokio::spawn(async move {
                    let outcome = run_worker(runner, effects, task, assignment, limit).await;
                    let _ = tx.send(outcome).await;
                });
                in_flight += 1;
            }

            if in_flight == 0 {
                // Nothing running and nothing schedulable: the phase is over.
                return Ok(());
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    self.finish_aborted().await?;
                    return Ok(());
                }
                received = rx.recv() => {
                    let Some(done) = received else { return Ok(()) };
                    in_flight -= 1;
                    match done.result {
                        Ok((outputs, files_patched)) => {
                            self.absorb_scope(&outputs, files_patched);
                            self.task_master.mark_done(&done.task_id, outputs)?;
                            self.events
                                .emit(OrchestrationEvent::TaskDone {
                                    session_id: self.session.id,
                                    task_id: done.task_id,
                                })
                                .await;
                        }
                        Err(error) => {
                            self.fail_task(&done.task_id, error).await?;
                        }
                    }
                }
            }
        }
    }

    /// Record a task failure, emitting retry/failure/skip events.
    async fn fail_task(&mut self, task_id: &str, error: String) -> DomainResult<()> {
        let before = self.status_snapshot();
        let retrying = self.task_master.mark_failed(task_id, error.clone())?;
        self.session.record_error(format!("{task_id}: {error}"));

        if retrying {
            let attempt = self
                .task_master
                .execution(task_id)
                .map(|e| e.attempts)
                .unwrap_or(0);
            self.events
                .emit(OrchestrationEvent::TaskRetried {
                    session_id: self.session.id,
                    task_id: task_id.to_string(),
                    attempt,
                })
                .await;
        } else {
            self.events
                .emit(OrchestrationEvent::TaskFailed {
                    session_id: self.session.id,
                    task_id: task_id.to_string(),
                    error,
                })
                .await;
            self.emit_skips(&before, task_id).await;
        }
        Ok(())
    }

    /// Emit one TaskSkipped per task newly Skipped by a terminal failure.
    async fn emit_skips(
        &self,
        before: &HashMap<String, ExecutionStatus>,
        failed_id: &str,
    ) {
        for (id, old_status) in before {
            if *old_status == ExecutionStatus::Skipped {
                continue;
            }
            let now_skipped = self
                .task_master
                .execution(id)
                .is_some_and(|e| e.status == ExecutionStatus::Skipped);
            if now_skipped {
                self.events
                    .emit(OrchestrationEvent::TaskSkipped {
                        session_id: self.session.id,
                        task_id: id.clone(),
                        failed_dependency: failed_id.to_string(),
                    })
                    .await;
            }
        }
    }

    fn status_snapshot(&self) -> HashMap<String, ExecutionStatus> {
        self.session
            .graph
            .iter()
            .flat_map(|g| g.tasks.iter())
            .filter_map(|t| {
                self.task_master
                    .execution(&t.id)
                    .map(|e| (t.id.clone(), e.status))
            })
            .collect()
    }

    /// Scope the session would have consumed if this task's diff landed.
    fn projected_scope(&self, task: &Task) -> ScopeCounters {
        let mut scope = self.scope;
        if let Some(diff) = &task.proposed_diff {
            scope.files_touched += diff_paths(diff).len() as u32;
        }
        scope
    }

    /// Fold a completed task's reported consumption into the counters.
    fn absorb_scope(&mut self, outputs: &serde_json::Value, files_patched: usize) {
        self.scope.files_touched += files_patched as u32;
        if let Some(n) = outputs.get("screens_created").and_then(|v| v.as_u64()) {
            self.scope.screens_created += n as u32;
        }
        if let Some(n) = outputs.get("entities_created").and_then(|v| v.as_u64()) {
            self.scope.entities_created += n as u32;
        }
    }

    async fn finish_failed(&mut self, root_cause: String) -> DomainResult<SessionPhase> {
        let mut report = FailureReport::new(root_cause.clone());
        report.attempted_fixes = self.session.error_history.clone();
        self.session.failure_report = Some(report);

        self.events
            .emit(OrchestrationEvent::SessionFailed {
                session_id: self.session.id,
                root_cause,
            })
            .await;
        self.transition(SessionPhase::Failed, "fix loop exhausted")
            .await?;
        Err(DomainError::FixLoopExhausted {
            cycles: self.config.scheduler.max_fix_cycles,
        })
    }

    async fn finish_aborted(&mut self) -> DomainResult<SessionPhase> {
        if !self.session.phase.is_terminal() {
            self.transition(SessionPhase::Aborted, "abort requested")
                .await?;
        }
        Err(DomainError::Aborted(self.session.id.to_string()))
    }

    /// Perform a phase transition and emit the PhaseChanged event.
    async fn transition(
        &mut self,
        to: SessionPhase,
        reason: impl Into<String>,
    ) -> DomainResult<()> {
        let from = self.session.phase;
        self.session.transition_to(to)?;
        self.events
            .emit(OrchestrationEvent::PhaseChanged {
                session_id: self.session.id,
                from,
                to,
                reason: reason.into(),
            })
            .await;
        Ok(())
    }
}

/// Runs one task outside the coordinator: agent call under a timeout, then
/// effect application. Only the coordinator mutates scheduler state with the
/// result.
async fn run_worker(
    runner: Arc<dyn AgentRunner>,
    effects: Arc<dyn EffectExecutor>,
    task: Task,
    assignment: RoleAssignment,
    limit: Duration,
) -> WorkerOutcome {
    let task_id = task.id.clone();

    let outcome = match tokio::time::timeout(limit, runner.run_task(&task, &assignment)).await {
        Err(_) => {
            return WorkerOutcome {
                task_id,
                result: Err(format!("task timed out after {}s", limit.as_secs())),
            }
        }
        Ok(Err(e)) => {
            return WorkerOutcome {
                task_id,
                result: Err(e.to_string()),
            }
        }
        Ok(Ok(outcome)) => outcome,
    };

    if !outcome.success {
        return WorkerOutcome {
            task_id,
            result: Err(outcome
                .error
                .unwrap_or_else(|| "agent reported failure".to_string())),
        };
    }

    let mut files_patched = 0;
    if !task.proposed_commands.is_empty() || task.proposed_diff.is_some() {
        match effects
            .apply(&task.id, &task.proposed_commands, task.proposed_diff.as_deref())
            .await
        {
            Ok(report) if report.success => files_patched = report.files_patched,
            Ok(report) => {
                return WorkerOutcome {
                    task_id,
                    result: Err(report
                        .error
                        .unwrap_or_else(|| "effect application failed".to_string())),
                }
            }
            Err(e) => {
                return WorkerOutcome {
                    task_id,
                    result: Err(e.to_string()),
                }
            }
        }
    }

    WorkerOutcome {
        task_id,
        result: Ok((outcome.outputs, files_patched)),
    }
}
