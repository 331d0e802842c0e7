//! Deterministic port implementations for dry runs and tests.
//!
//! Real deployments plug LLM-backed runners into the same ports; these
//! scripted ones make `taskforge run` usable offline and give integration
//! tests full control over failure timing.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::errors::DomainResult;
use crate::domain::models::{RoleAssignment, Task};
use crate::domain::ports::{
    AgentRunner, EffectExecutor, EffectReport, TaskOutcome, VerificationReport, Verifier,
};

/// Agent runner with scripted per-task failure budgets.
///
/// A task with `n` scripted failures fails its first `n` dispatches and
/// succeeds afterwards. Unscripted tasks always succeed.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    remaining_failures: Mutex<HashMap<String, u32>>,
}

impl ScriptedRunner {
    /// A runner where every task succeeds on the first attempt.
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Script `failures` consecutive failures for a task.
    pub fn with_failures(self, task_id: impl Into<String>, failures: u32) -> Self {
        self.remaining_failures
            .lock()
            .expect("runner poisoned")
            .insert(task_id.into(), failures);
        self
    }
}

#[async_trait]
impl AgentRunner for ScriptedRunner {
    async fn run_task(
        &self,
        task: &Task,
        assignment: &RoleAssignment,
    ) -> DomainResult<TaskOutcome> {
        let mut budgets = self.remaining_failures.lock().expect("runner poisoned");
        if let Some(remaining) = budgets.get_mut(&task.id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(TaskOutcome::failed(format!(
                    "scripted failure for '{}'",
                    task.id
                )));
            }
        }
        Ok(TaskOutcome::succeeded(json!({
            "task_id": task.id,
            "role": assignment.role.as_str(),
            "model": assignment.model,
        })))
    }
}

/// One recorded effect application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEffect {
    pub task_id: String,
    pub commands: Vec<String>,
    pub diff: Option<String>,
}

/// Effect executor that records instead of executing.
#[derive(Debug, Default)]
pub struct RecordingEffects {
    applied: Mutex<Vec<RecordedEffect>>,
}

impl RecordingEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of applications so far, oldest first.
    pub fn applications(&self) -> Vec<RecordedEffect> {
        self.applied.lock().expect("effects poisoned").clone()
    }
}

#[async_trait]
impl EffectExecutor for RecordingEffects {
    async fn apply(
        &self,
        task_id: &str,
        commands: &[String],
        diff: Option<&str>,
    ) -> DomainResult<EffectReport> {
        let files_patched = diff
            .map(|d| d.lines().filter(|l| l.starts_with("+++ ")).count())
            .unwrap_or(0);
        self.applied
            .lock()
            .expect("effects poisoned")
            .push(RecordedEffect {
                task_id: task_id.to_string(),
                commands: commands.to_vec(),
                diff: diff.map(str::to_string),
            });
        Ok(EffectReport {
            success: true,
            commands_run: commands.len(),
            files_patched,
            error: None,
        })
    }
}

/// Verifier with a scripted sequence of verdicts.
///
/// Each verification pass pops the next scripted verdict; an empty script
/// passes.
#[derive(Debug, Default)]
pub struct ScriptedVerifier {
    verdicts: Mutex<VecDeque<bool>>,
}

impl ScriptedVerifier {
    /// A verifier that always passes.
    pub fn passing() -> Self {
        Self::default()
    }

    /// Script `n` failing passes before verification starts succeeding.
    pub fn failing_times(n: usize) -> Self {
        Self {
            verdicts: Mutex::new(std::iter::repeat_n(false, n).collect()),
        }
    }
}

#[async_trait]
impl Verifier for ScriptedVerifier {
    async fn run_global_verification(&self, workspace: &str) -> DomainResult<VerificationReport> {
        let verdict = self
            .verdicts
            .lock()
            .expect("verifier poisoned")
            .pop_front()
            .unwrap_or(true);
        if verdict {
            Ok(VerificationReport::passing())
        } else {
            Ok(VerificationReport::failing(vec![format!(
                "scripted verification failure in {workspace}"
            )]))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AgentRole, ModelTier};

    fn assignment() -> RoleAssignment {
        RoleAssignment {
            role: AgentRole::Worker,
            tier: ModelTier::Balanced,
            model: "sonnet".to_string(),
            reason: "test".to_string(),
            escalated: false,
        }
    }

    #[tokio::test]
    async fn test_scripted_runner_fails_then_succeeds() {
        let runner = ScriptedRunner::succeeding().with_failures("flaky", 2);
        let task = Task::new("flaky", "A flaky task");

        for _ in 0..2 {
            let outcome = runner.run_task(&task, &assignment()).await.unwrap();
            assert!(!outcome.success);
        }
        let outcome = runner.run_task(&task, &assignment()).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.outputs["task_id"], "flaky");
    }

    #[tokio::test]
    async fn test_recording_effects_counts_patched_files() {
        let effects = RecordingEffects::new();
        let diff = "--- a/x.rs\n+++ b/x.rs\n@@\n+line\n";
        let report = effects
            .apply("t1", &["cargo build".to_string()], Some(diff))
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.commands_run, 1);
        assert_eq!(report.files_patched, 1);

        let applied = effects.applications();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].task_id, "t1");
    }

    #[tokio::test]
    async fn test_scripted_verifier_sequence() {
        let verifier = ScriptedVerifier::failing_times(1);
        let first = verifier.run_global_verification(".").await.unwrap();
        assert!(!first.passed);
        let second = verifier.run_global_verification(".").await.unwrap();
        assert!(second.passed);
    }
}
