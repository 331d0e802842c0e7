//! Feasibility gate: session-wide scope budget.
//!
//! Blocks when running scope counters exceed the build spec's budget and
//! warns once consumption crosses 80% of any axis.

use serde_json::json;

use crate::domain::models::{GateContext, GateResult};

use super::Gate;

#[derive(Default)]
pub struct FeasibilityGate;

impl FeasibilityGate {
    pub fn new() -> Self {
        Self
    }
}

impl Gate for FeasibilityGate {
    fn name(&self) -> &'static str {
        "feasibility"
    }

    fn evaluate(&self, ctx: &GateContext<'_>) -> GateResult {
        let budget = &ctx.build_spec.scope;
        let axes = [
            ("files", ctx.scope.files_touched, budget.max_files),
            ("screens", ctx.scope.screens_created, budget.max_screens),
            ("entities", ctx.scope.entities_created, budget.max_entities),
        ];

        for (axis, used, limit) in axes {
            if used > limit {
                return GateResult::block(
                    self.name(),
                    format!("scope budget exceeded: {used}/{limit} {axis}"),
                )
                .with_details(json!({
                    "axis": axis,
                    "used": used,
                    "limit": limit,
                }));
            }
        }

        // Warn threshold: 80% of any axis, computed without floats.
        for (axis, used, limit) in axes {
            if limit > 0 && used * 5 >= limit * 4 {
                return GateResult::warn(
                    self.name(),
                    format!("scope budget nearly exhausted: {used}/{limit} {axis}"),
                )
                .with_details(json!({
                    "axis": axis,
                    "used": used,
                    "limit": limit,
                }));
            }
        }

        GateResult::ok(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BuildSpec, GateStatus, ScopeCounters};

    fn context(spec: &BuildSpec, scope: ScopeCounters) -> GateContext<'_> {
        GateContext {
            task_id: "t",
            build_spec: spec,
            proposed_commands: &[],
            proposed_diff: None,
            scope,
            max_files_per_task: 10,
            max_diff_lines_per_task: 500,
        }
    }

    #[test]
    fn test_under_budget_passes() {
        let gate = FeasibilityGate::new();
        let spec = BuildSpec::default();
        let scope = ScopeCounters {
            files_touched: 10,
            screens_created: 2,
            entities_created: 3,
        };
        assert_eq!(gate.evaluate(&context(&spec, scope)).status, GateStatus::Ok);
    }

    #[test]
    fn test_near_budget_warns() {
        let gate = FeasibilityGate::new();
        let spec = BuildSpec::default();
        // 48/60 files is exactly 80%.
        let scope = ScopeCounters {
            files_touched: 48,
            ..Default::default()
        };
        let result = gate.evaluate(&context(&spec, scope));
        assert_eq!(result.status, GateStatus::Warn);
        assert_eq!(result.details["axis"], "files");
    }

    #[test]
    fn test_over_budget_blocks() {
        let gate = FeasibilityGate::new();
        let spec = BuildSpec::default();
        let scope = ScopeCounters {
            entities_created: 13,
            ..Default::default()
        };
        let result = gate.evaluate(&context(&spec, scope));
        assert_eq!(result.status, GateStatus::Block);
        assert_eq!(result.details["axis"], "entities");
        assert_eq!(result.details["limit"], 12);
    }

    #[test]
    fn test_block_wins_over_warn() {
        let gate = FeasibilityGate::new();
        let spec = BuildSpec::default();
        // Files over budget while screens only warn-level.
        let scope = ScopeCounters {
            files_touched: 61,
            screens_created: 7,
            entities_created: 0,
        };
        assert_eq!(
            gate.evaluate(&context(&spec, scope)).status,
            GateStatus::Block
        );
    }
}
