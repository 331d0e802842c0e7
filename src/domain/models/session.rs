//! Session model and phase state machine.
//!
//! The session is the single source of truth for "where are we". All phase
//! mutation goes through [`Session::transition_to`], which checks the one
//! allowed-transition table and leaves the phase untouched on violations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

use super::build_spec::BuildSpec;
use super::graph::TaskGraph;

/// Lifecycle phase of a build session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    SessionStart,
    Questionnaire,
    SpecBuild,
    Idea,
    PlanReview,
    Execution,
    Verification,
    Complete,
    Failed,
    Aborted,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStart => "session_start",
            Self::Questionnaire => "questionnaire",
            Self::SpecBuild => "spec_build",
            Self::Idea => "idea",
            Self::PlanReview => "plan_review",
            Self::Execution => "execution",
            Self::Verification => "verification",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        }
    }

    /// Whether the session can make no further progress from this phase.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Aborted)
    }

    /// The allowed-transition table. `Failed` and `Aborted` are reachable
    /// from every non-terminal phase; everything else is explicit.
    pub fn allowed_transitions(&self) -> &'static [SessionPhase] {
        match self {
            Self::SessionStart => &[Self::Questionnaire, Self::Failed, Self::Aborted],
            Self::Questionnaire => &[Self::SpecBuild, Self::Failed, Self::Aborted],
            Self::SpecBuild => &[Self::Idea, Self::Failed, Self::Aborted],
            Self::Idea => &[Self::PlanReview, Self::Failed, Self::Aborted],
            Self::PlanReview => &[Self::Execution, Self::Idea, Self::Failed, Self::Aborted],
            Self::Execution => &[Self::Verification, Self::Failed, Self::Aborted],
            // Verification -> Execution is the fix loop.
            Self::Verification => &[Self::Complete, Self::Execution, Self::Failed, Self::Aborted],
            Self::Complete | Self::Failed | Self::Aborted => &[],
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

/// Final error artifact produced when a session terminates in `Failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    /// What ultimately sank the session.
    pub root_cause: String,
    /// Fix cycles and retries that were attempted before giving up.
    pub attempted_fixes: Vec<String>,
    /// Suggested recovery options for the operator.
    pub recovery_options: Vec<String>,
}

impl FailureReport {
    pub fn new(root_cause: impl Into<String>) -> Self {
        Self {
            root_cause: root_cause.into(),
            attempted_fixes: Vec::new(),
            recovery_options: vec![
                "restart the session".to_string(),
                "reduce the build scope".to_string(),
                "export logs for inspection".to_string(),
            ],
        }
    }
}

/// A build session: owns the phase, the build spec, and the task graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub phase: SessionPhase,
    pub build_spec: Option<BuildSpec>,
    pub graph: Option<TaskGraph>,
    /// Errors accumulated over the session's lifetime, oldest first.
    pub error_history: Vec<String>,
    /// Completed VERIFICATION -> EXECUTION fix cycles.
    pub fix_cycles: u32,
    /// Final error artifact, set when the session fails.
    pub failure_report: Option<FailureReport>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            phase: SessionPhase::SessionStart,
            build_spec: None,
            graph: None,
            error_history: Vec::new(),
            fix_cycles: 0,
            failure_report: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attempt a phase transition.
    ///
    /// Transitions not present in the table are rejected with
    /// [`DomainError::IllegalTransition`] and the phase is left unchanged —
    /// no partial mutation.
    pub fn transition_to(&mut self, next: SessionPhase) -> DomainResult<()> {
        if !self.phase.can_transition_to(next) {
            return Err(DomainError::IllegalTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record an error without changing phase.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error_history.push(message.into());
        self.updated_at = Utc::now();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut session = Session::new();
        for phase in [
            SessionPhase::Questionnaire,
            SessionPhase::SpecBuild,
            SessionPhase::Idea,
            SessionPhase::PlanReview,
            SessionPhase::Execution,
            SessionPhase::Verification,
            SessionPhase::Complete,
        ] {
            session.transition_to(phase).unwrap();
            assert_eq!(session.phase, phase);
        }
        assert!(session.phase.is_terminal());
    }

    #[test]
    fn test_illegal_transition_leaves_phase_unchanged() {
        let mut session = Session::new();
        session.transition_to(SessionPhase::Questionnaire).unwrap();
        session.transition_to(SessionPhase::SpecBuild).unwrap();
        session.transition_to(SessionPhase::Idea).unwrap();
        session.transition_to(SessionPhase::PlanReview).unwrap();

        let err = session.transition_to(SessionPhase::Complete).unwrap_err();
        assert!(matches!(
            err,
            DomainError::IllegalTransition {
                from: SessionPhase::PlanReview,
                to: SessionPhase::Complete,
            }
        ));
        assert_eq!(session.phase, SessionPhase::PlanReview);
    }

    #[test]
    fn test_fix_loop_transition_allowed() {
        assert!(SessionPhase::Verification.can_transition_to(SessionPhase::Execution));
        assert!(SessionPhase::Verification.can_transition_to(SessionPhase::Complete));
    }

    #[test]
    fn test_failed_reachable_from_all_non_terminal() {
        for phase in [
            SessionPhase::SessionStart,
            SessionPhase::Questionnaire,
            SessionPhase::SpecBuild,
            SessionPhase::Idea,
            SessionPhase::PlanReview,
            SessionPhase::Execution,
            SessionPhase::Verification,
        ] {
            assert!(phase.can_transition_to(SessionPhase::Failed), "{phase:?}");
            assert!(phase.can_transition_to(SessionPhase::Aborted), "{phase:?}");
        }
    }

    #[test]
    fn test_terminal_phases_have_no_exits() {
        assert!(SessionPhase::Complete.allowed_transitions().is_empty());
        assert!(SessionPhase::Failed.allowed_transitions().is_empty());
        assert!(SessionPhase::Aborted.allowed_transitions().is_empty());
    }

    #[test]
    fn test_failure_report_defaults() {
        let report = FailureReport::new("verification never passed");
        assert_eq!(report.root_cause, "verification never passed");
        assert!(!report.recovery_options.is_empty());
    }
}
