//! Translates pipeline reports into user-facing output.
//!
//! Blocks become a short explanation naming the gate and the violation.
//! Warns become a structured clarification with a closed set of options,
//! never a free-text question.

use serde::{Deserialize, Serialize};

use crate::domain::models::PipelineReport;

/// One selectable answer in a clarification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationOption {
    /// Stable identifier the caller answers with.
    pub id: String,
    pub label: String,
}

impl ClarificationOption {
    fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
        }
    }
}

/// A structured question raised by gate warnings. The caller must pick one
/// of the options; there is no free-text channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clarification {
    pub question: String,
    pub options: Vec<ClarificationOption>,
}

/// Stateless report formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateAdapter;

impl GateAdapter {
    pub fn new() -> Self {
        Self
    }

    /// User-facing explanation for a blocked report. Returns `None` when the
    /// report is not blocked.
    pub fn block_message(&self, report: &PipelineReport) -> Option<String> {
        let block = report.first_block()?;
        Some(format!(
            "Task blocked by the {} gate: {}",
            block.gate, block.message
        ))
    }

    /// Structured clarification for a warned report. Returns `None` when
    /// there are no warnings or the report is blocked (blocks do not ask).
    pub fn clarification(&self, report: &PipelineReport) -> Option<Clarification> {
        if report.is_blocked() {
            return None;
        }
        let warnings = report.warnings();
        if warnings.is_empty() {
            return None;
        }

        let summary = warnings
            .iter()
            .map(|w| format!("{}: {}", w.gate, w.message))
            .collect::<Vec<_>>()
            .join("; ");

        Some(Clarification {
            question: format!("Gates raised warnings ({summary}). How should we proceed?"),
            options: vec![
                ClarificationOption::new("proceed", "Proceed anyway"),
                ClarificationOption::new("reduce_scope", "Reduce scope and retry"),
                ClarificationOption::new("abort", "Abort the session"),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{GateResult, GateStatus};

    fn report(results: Vec<GateResult>) -> PipelineReport {
        let status = results
            .iter()
            .map(|r| r.status)
            .max()
            .unwrap_or(GateStatus::Ok);
        PipelineReport { status, results }
    }

    #[test]
    fn test_block_message_names_gate() {
        let adapter = GateAdapter::new();
        let report = report(vec![GateResult::block("policy", "sudo is denied")]);
        let message = adapter.block_message(&report).unwrap();
        assert!(message.contains("policy"));
        assert!(message.contains("sudo is denied"));
    }

    #[test]
    fn test_clean_report_produces_nothing() {
        let adapter = GateAdapter::new();
        let report = report(vec![GateResult::ok("policy")]);
        assert!(adapter.block_message(&report).is_none());
        assert!(adapter.clarification(&report).is_none());
    }

    #[test]
    fn test_warnings_produce_fixed_options() {
        let adapter = GateAdapter::new();
        let report = report(vec![
            GateResult::warn("feasibility", "48/60 files"),
            GateResult::warn("diff_command", "large diff"),
        ]);
        let clarification = adapter.clarification(&report).unwrap();
        assert!(clarification.question.contains("feasibility"));
        assert!(clarification.question.contains("diff_command"));
        let ids: Vec<&str> = clarification.options.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["proceed", "reduce_scope", "abort"]);
    }

    #[test]
    fn test_blocked_report_does_not_ask() {
        let adapter = GateAdapter::new();
        let report = report(vec![
            GateResult::warn("feasibility", "near limit"),
            GateResult::block("risk", "denied"),
        ]);
        assert!(adapter.clarification(&report).is_none());
        assert!(adapter.block_message(&report).is_some());
    }
}
