//! Risk gate: command-family allowlist and network-access rule.

use serde_json::json;

use crate::domain::models::{GateConfig, GateContext, GateResult};

use super::Gate;

/// Command families that reach the network.
const NETWORK_FAMILIES: &[&str] = &["curl", "wget", "nc", "ssh", "scp", "ftp", "telnet"];

pub struct RiskGate {
    allowed_families: Vec<String>,
}

impl RiskGate {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            allowed_families: config.allowed_command_families.clone(),
        }
    }
}

impl Gate for RiskGate {
    fn name(&self) -> &'static str {
        "risk"
    }

    fn evaluate(&self, ctx: &GateContext<'_>) -> GateResult {
        for command in ctx.proposed_commands {
            let Some(family) = command.split_whitespace().next() else {
                continue;
            };

            if NETWORK_FAMILIES.contains(&family) && !ctx.build_spec.policy.allow_network {
                return GateResult::block(
                    self.name(),
                    format!("network access denied for command: {command}"),
                )
                .with_details(json!({
                    "command": command,
                    "family": family,
                    "rule": "allow_network",
                }));
            }

            if !self.allowed_families.iter().any(|f| f == family)
                && !NETWORK_FAMILIES.contains(&family)
            {
                return GateResult::block(
                    self.name(),
                    format!("command family '{family}' is not allowlisted"),
                )
                .with_details(json!({
                    "command": command,
                    "family": family,
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

    fn context<'a>(spec: &'a BuildSpec, commands: &'a [String]) -> GateContext<'a> {
        GateContext {
            task_id: "t",
            build_spec: spec,
            proposed_commands: commands,
            proposed_diff: None,
            scope: ScopeCounters::default(),
            max_files_per_task: 10,
            max_diff_lines_per_task: 500,
        }
    }

    #[test]
    fn test_allowlisted_family_passes() {
        let gate = RiskGate::new(&GateConfig::default());
        let spec = BuildSpec::default();
        let commands = vec!["cargo test --all".to_string()];
        assert_eq!(gate.evaluate(&context(&spec, &commands)).status, GateStatus::Ok);
    }

    #[test]
    fn test_unknown_family_blocks() {
        let gate = RiskGate::new(&GateConfig::default());
        let spec = BuildSpec::default();
        let commands = vec!["dd if=/dev/zero of=disk.img".to_string()];
        let result = gate.evaluate(&context(&spec, &commands));
        assert_eq!(result.status, GateStatus::Block);
        assert_eq!(result.details["family"], "dd");
    }

    #[test]
    fn test_network_denied_by_default() {
        let gate = RiskGate::new(&GateConfig::default());
        let spec = BuildSpec::default();
        let commands = vec!["curl https://example.com".to_string()];
        let result = gate.evaluate(&context(&spec, &commands));
        assert_eq!(result.status, GateStatus::Block);
        assert_eq!(result.details["rule"], "allow_network");
    }

    #[test]
    fn test_network_allowed_when_policy_permits() {
        let gate = RiskGate::new(&GateConfig::default());
        let mut spec = BuildSpec::default();
        spec.policy.allow_network = true;
        let commands = vec!["curl https://example.com".to_string()];
        assert_eq!(gate.evaluate(&context(&spec, &commands)).status, GateStatus::Ok);
    }
}
