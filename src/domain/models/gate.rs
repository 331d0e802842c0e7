//! Gate evaluation types.
//!
//! A gate inspects a task's proposed effects and returns Ok/Warn/Block; the
//! pipeline aggregates per-gate results into a report with the same shape.

use serde::{Deserialize, Serialize};

use super::build_spec::BuildSpec;

/// Outcome severity of a single gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    /// No objection.
    Ok,
    /// Allowed, but flagged for a structured clarification.
    Warn,
    /// The task must not execute.
    Block,
}

impl GateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Block => "block",
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block)
    }
}

/// Result of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    /// Name of the gate that produced this result.
    pub gate: String,
    pub status: GateStatus,
    pub message: String,
    /// Structured details (violating patterns, counts, thresholds).
    #[serde(default)]
    pub details: serde_json::Value,
}

impl GateResult {
    pub fn ok(gate: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            status: GateStatus::Ok,
            message: String::new(),
            details: serde_json::Value::Null,
        }
    }

    pub fn warn(gate: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            status: GateStatus::Warn,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn block(gate: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            status: GateStatus::Block,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    /// Attach structured details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Running totals of scope already consumed by the session, plus what the
/// current task would add.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeCounters {
    pub files_touched: u32,
    pub screens_created: u32,
    pub entities_created: u32,
}

/// Everything one gate evaluation needs. Constructed per task and discarded
/// after evaluation.
#[derive(Debug, Clone)]
pub struct GateContext<'a> {
    pub task_id: &'a str,
    pub build_spec: &'a BuildSpec,
    pub proposed_commands: &'a [String],
    pub proposed_diff: Option<&'a str>,
    pub scope: ScopeCounters,
    /// Per-task limits from the task's own constraints.
    pub max_files_per_task: u32,
    pub max_diff_lines_per_task: u32,
}

/// Aggregated verdict of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Worst status across all evaluated gates.
    pub status: GateStatus,
    /// Per-gate results in evaluation order.
    pub results: Vec<GateResult>,
}

impl PipelineReport {
    pub fn is_blocked(&self) -> bool {
        self.status.is_block()
    }

    /// The first blocking result, if any.
    pub fn first_block(&self) -> Option<&GateResult> {
        self.results.iter().find(|r| r.status.is_block())
    }

    /// All warning results.
    pub fn warnings(&self) -> Vec<&GateResult> {
        self.results
            .iter()
            .filter(|r| r.status == GateStatus::Warn)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_ordering() {
        // Worst-status aggregation relies on Ok < Warn < Block.
        assert!(GateStatus::Ok < GateStatus::Warn);
        assert!(GateStatus::Warn < GateStatus::Block);
    }

    #[test]
    fn test_report_accessors() {
        let report = PipelineReport {
            status: GateStatus::Block,
            results: vec![
                GateResult::ok("policy"),
                GateResult::warn("feasibility", "approaching limit"),
                GateResult::block("risk", "denied command"),
            ],
        };
        assert!(report.is_blocked());
        assert_eq!(report.first_block().unwrap().gate, "risk");
        assert_eq!(report.warnings().len(), 1);
    }

    #[test]
    fn test_details_attachment() {
        let result = GateResult::block("policy", "denied").with_details(json!({
            "pattern": "rm -rf",
        }));
        assert_eq!(result.details["pattern"], "rm -rf");
    }
}
