//! Command/diff application port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Result of applying a task's gate-approved effects.
#[derive(Debug, Clone, Default)]
pub struct EffectReport {
    pub success: bool,
    pub commands_run: usize,
    pub files_patched: usize,
    pub error: Option<String>,
}

/// Applies a gate-approved command list and/or unified diff.
///
/// The coordinator only ever calls this after the gate pipeline returned a
/// non-Block verdict; implementations never see unapproved effects.
#[async_trait]
pub trait EffectExecutor: Send + Sync {
    async fn apply(
        &self,
        task_id: &str,
        commands: &[String],
        diff: Option<&str>,
    ) -> DomainResult<EffectReport>;
}
