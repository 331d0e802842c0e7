//! Safety gate pipeline.
//!
//! Gates run in a fixed, cost-ascending order: policy (cheapest regex/path
//! checks) -> risk (command-family allowlist) -> feasibility (scope budget)
//! -> diff/command (per-task limits, secret scanning). The first Block
//! short-circuits unless audit mode collects everything; Warns accumulate.
//! Gates run strictly before any command or diff is applied, never after.

mod adapter;
mod diff_command;
mod feasibility;
mod policy;
mod risk;

pub use adapter::{Clarification, ClarificationOption, GateAdapter};
pub(crate) use policy::diff_paths;
pub use diff_command::DiffCommandGate;
pub use feasibility::FeasibilityGate;
pub use policy::PolicyGate;
pub use risk::RiskGate;

use tracing::debug;

use crate::domain::models::{GateConfig, GateContext, GateResult, GateStatus, PipelineReport};

/// A single safety policy check.
pub trait Gate: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &GateContext<'_>) -> GateResult;
}

/// Ordered chain of gates with Block short-circuiting.
pub struct GatePipeline {
    gates: Vec<Box<dyn Gate>>,
    /// Audit mode: evaluate every gate even after a Block.
    collect_all: bool,
}

impl GatePipeline {
    pub fn new(gates: Vec<Box<dyn Gate>>, collect_all: bool) -> Self {
        Self { gates, collect_all }
    }

    /// Standard pipeline in the canonical cost-ascending order.
    pub fn standard(config: &GateConfig) -> Self {
        Self::new(
            vec![
                Box::new(PolicyGate::new(config)),
                Box::new(RiskGate::new(config)),
                Box::new(FeasibilityGate::new()),
                Box::new(DiffCommandGate::new()),
            ],
            config.collect_all_violations,
        )
    }

    /// Run all gates against a context.
    pub fn evaluate(&self, ctx: &GateContext<'_>) -> PipelineReport {
        let mut results = Vec::with_capacity(self.gates.len());
        let mut worst = GateStatus::Ok;

        for gate in &self.gates {
            let result = gate.evaluate(ctx);
            debug!(
                gate = gate.name(),
                status = result.status.as_str(),
                task_id = ctx.task_id,
                "gate evaluated"
            );
            worst = worst.max(result.status);
            let is_block = result.status.is_block();
            results.push(result);
            if is_block && !self.collect_all {
                break;
            }
        }

        PipelineReport {
            status: worst,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BuildSpec, ScopeCounters};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingGate {
        name: &'static str,
        verdict: GateStatus,
        calls: Arc<AtomicUsize>,
    }

    impl Gate for CountingGate {
        fn name(&self) -> &'static str {
            self.name
        }

        fn evaluate(&self, _ctx: &GateContext<'_>) -> GateResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            GateResult {
                gate: self.name.to_string(),
                status: self.verdict,
                message: String::new(),
                details: serde_json::Value::Null,
            }
        }
    }

    fn context(spec: &BuildSpec) -> GateContext<'_> {
        GateContext {
            task_id: "t",
            build_spec: spec,
            proposed_commands: &[],
            proposed_diff: None,
            scope: ScopeCounters::default(),
            max_files_per_task: 10,
            max_diff_lines_per_task: 500,
        }
    }

    fn counting(name: &'static str, verdict: GateStatus) -> (Box<dyn Gate>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(CountingGate {
                name,
                verdict,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    #[test]
    fn test_block_short_circuits_later_gates() {
        let (first, first_calls) = counting("first", GateStatus::Block);
        let (second, second_calls) = counting("second", GateStatus::Ok);
        let pipeline = GatePipeline::new(vec![first, second], false);

        let spec = BuildSpec::default();
        let report = pipeline.evaluate(&context(&spec));

        assert!(report.is_blocked());
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
        assert_eq!(report.results.len(), 1);
    }

    #[test]
    fn test_audit_mode_evaluates_all_gates() {
        let (first, _) = counting("first", GateStatus::Block);
        let (second, second_calls) = counting("second", GateStatus::Block);
        let pipeline = GatePipeline::new(vec![first, second], true);

        let spec = BuildSpec::default();
        let report = pipeline.evaluate(&context(&spec));

        assert!(report.is_blocked());
        assert_eq!(second_calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.results.len(), 2);
    }

    #[test]
    fn test_warnings_accumulate_without_blocking() {
        let (first, _) = counting("first", GateStatus::Warn);
        let (second, _) = counting("second", GateStatus::Ok);
        let (third, _) = counting("third", GateStatus::Warn);
        let pipeline = GatePipeline::new(vec![first, second, third], false);

        let spec = BuildSpec::default();
        let report = pipeline.evaluate(&context(&spec));

        assert_eq!(report.status, GateStatus::Warn);
        assert!(!report.is_blocked());
        assert_eq!(report.warnings().len(), 2);
        assert_eq!(report.results.len(), 3);
    }

    #[test]
    fn test_standard_pipeline_order() {
        let config = GateConfig::default();
        let pipeline = GatePipeline::standard(&config);
        let names: Vec<&str> = pipeline.gates.iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["policy", "risk", "feasibility", "diff_command"]);
    }
}
