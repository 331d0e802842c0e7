//! Global verification port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Outcome of a global verification pass over the workspace.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub passed: bool,
    /// Failure descriptions when `passed` is false.
    pub failures: Vec<String>,
}

impl VerificationReport {
    pub fn passing() -> Self {
        Self {
            passed: true,
            failures: Vec::new(),
        }
    }

    pub fn failing(failures: Vec<String>) -> Self {
        Self {
            passed: false,
            failures,
        }
    }
}

/// Runs the session-wide verification suite (build, tests, acceptance
/// checks). Consumed once per EXECUTION -> VERIFICATION transition.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn run_global_verification(&self, workspace: &str) -> DomainResult<VerificationReport>;
}
