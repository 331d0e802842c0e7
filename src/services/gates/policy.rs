//! Policy gate: regex command denylist and path denylist.
//!
//! Cheapest gate; runs first.

use regex::RegexSet;
use serde_json::json;
use tracing::warn;

use crate::domain::models::{GateConfig, GateContext, GateResult};

use super::Gate;

pub struct PolicyGate {
    denied_commands: RegexSet,
    denied_paths: Vec<String>,
}

impl PolicyGate {
    pub fn new(config: &GateConfig) -> Self {
        let denied_commands = RegexSet::new(&config.denied_command_patterns).unwrap_or_else(|e| {
            // A broken pattern must not silently disable the denylist.
            warn!(error = %e, "invalid denied command pattern, falling back to empty set");
            RegexSet::empty()
        });
        Self {
            denied_commands,
            denied_paths: config.denied_paths.clone(),
        }
    }
}

impl Gate for PolicyGate {
    fn name(&self) -> &'static str {
        "policy"
    }

    fn evaluate(&self, ctx: &GateContext<'_>) -> GateResult {
        for command in ctx.proposed_commands {
            if self.denied_commands.is_match(command) {
                let patterns: Vec<&str> = self
                    .denied_commands
                    .matches(command)
                    .into_iter()
                    .map(|i| self.denied_commands.patterns()[i].as_str())
                    .collect();
                return GateResult::block(
                    self.name(),
                    format!("command matches denied pattern: {command}"),
                )
                .with_details(json!({
                    "command": command,
                    "patterns": patterns,
                }));
            }
        }

        if let Some(diff) = ctx.proposed_diff {
            for path in diff_paths(diff) {
                if let Some(denied) = self
                    .denied_paths
                    .iter()
                    .find(|denied| path.contains(denied.as_str()))
                {
                    return GateResult::block(
                        self.name(),
                        format!("diff touches denied path: {path}"),
                    )
                    .with_details(json!({
                        "path": path,
                        "denied": denied,
                    }));
                }
            }
        }

        GateResult::ok(self.name())
    }
}

/// Target paths named in a unified diff's `+++` headers, with the `b/`
/// prefix stripped.
pub(crate) fn diff_paths(diff: &str) -> Vec<&str> {
    diff.lines()
        .filter_map(|line| line.strip_prefix("+++ "))
        .map(|path| path.strip_prefix("b/").unwrap_or(path))
        .filter(|path| *path != "/dev/null")
        .collect()
}
