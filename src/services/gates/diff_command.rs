//! Diff/command gate: per-task limits and secret scanning.
//!
//! The most detailed (and costliest) gate, so it runs last. Parses the
//! proposed unified diff to count touched files and changed lines, enforces
//! the task's own constraints, and scans added lines for credential-shaped
//! strings.

use regex::Regex;
use serde_json::json;

use crate::domain::models::{GateContext, GateResult};

use super::policy::diff_paths;
use super::Gate;

/// Credential-shaped patterns scanned against added diff lines.
const SECRET_PATTERNS: &[&str] = &[
    r"(?i)api[_-]?key\s*[:=]\s*['\x22]?[A-Za-z0-9_\-]{16,}",
    r"(?i)secret\s*[:=]\s*['\x22]?[A-Za-z0-9_\-]{16,}",
    r"(?i)password\s*[:=]\s*['\x22]?\S{8,}",
    r"(?i)-----BEGIN [A-Z ]*PRIVATE KEY-----",
    r"(?i)aws_access_key_id\s*[:=]",
    r"ghp_[A-Za-z0-9]{36}",
    r"sk-[A-Za-z0-9]{20,}",
];

pub struct DiffCommandGate {
    secrets: Vec<Regex>,
}

impl Default for DiffCommandGate {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffCommandGate {
    pub fn new() -> Self {
        let secrets = SECRET_PATTERNS
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self { secrets }
    }
}

impl Gate for DiffCommandGate {
    fn name(&self) -> &'static str {
        "diff_command"
    }

    fn evaluate(&self, ctx: &GateContext<'_>) -> GateResult {
        let Some(diff) = ctx.proposed_diff else {
            return GateResult::ok(self.name());
        };

        let files = diff_paths(diff).len() as u32;
        if files > ctx.max_files_per_task {
            return GateResult::block(
                self.name(),
                format!(
                    "diff touches {files} files, task limit is {}",
                    ctx.max_files_per_task
                ),
            )
            .with_details(json!({
                "files": files,
                "limit": ctx.max_files_per_task,
            }));
        }

        let changed = changed_lines(diff);
        if changed > ctx.max_diff_lines_per_task {
            return GateResult::block(
                self.name(),
                format!(
                    "diff changes {changed} lines, task limit is {}",
                    ctx.max_diff_lines_per_task
                ),
            )
            .with_details(json!({
                "changed_lines": changed,
                "limit": ctx.max_diff_lines_per_task,
            }));
        }

        for line in added_lines(diff) {
            if let Some(pattern) = self.secrets.iter().find(|re| re.is_match(line)) {
                return GateResult::block(self.name(), "diff adds a credential-shaped string")
                    .with_details(json!({
                        "pattern": pattern.as_str(),
                    }));
            }
        }

        GateResult::ok(self.name())
    }
}

/// Added plus removed lines, excluding file headers.
fn changed_lines(diff: &str) -> u32 {
    diff.lines()
        .filter(|line| {
            (line.starts_with('+') && !line.starts_with("+++"))
                || (line.starts_with('-') && !line.starts_with("---"))
        })
        .count() as u32
}

fn added_lines(diff: &str) -> impl Iterator<Item = &str> {
    diff.lines()
        .filter(|line| line.starts_with('+') && !line.starts_with("+++"))
        .map(|line| &line[1..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BuildSpec, GateStatus, ScopeCounters};

    fn context<'a>(spec: &'a BuildSpec, diff: Option<&'a str>) -> GateContext<'a> {
        GateContext {
            task_id: "t",
            build_spec: spec,
            proposed_commands: &[],
            proposed_diff: diff,
            scope: ScopeCounters::default(),
            max_files_per_task: 2,
            max_diff_lines_per_task: 5,
        }
    }

    fn one_file_diff(body_lines: &[&str]) -> String {
        let mut diff = String::from("--- a/src/lib.rs\n+++ b/src/lib.rs\n@@ -1 +1 @@\n");
        for line in body_lines {
            diff.push_str(line);
            diff.push('\n');
        }
        diff
    }

    #[test]
    fn test_no_diff_passes() {
        let gate = DiffCommandGate::new();
        let spec = BuildSpec::default();
        assert_eq!(gate.evaluate(&context(&spec, None)).status, GateStatus::Ok);
    }

    #[test]
    fn test_small_diff_passes() {
        let gate = DiffCommandGate::new();
        let spec = BuildSpec::default();
        let diff = one_file_diff(&["-let x = 1;", "+let x = 2;"]);
        assert_eq!(
            gate.evaluate(&context(&spec, Some(diff.as_str()))).status,
            GateStatus::Ok
        );
    }

    #[test]
    fn test_too_many_files_blocks() {
        let gate = DiffCommandGate::new();
        let spec = BuildSpec::default();
        let diff = "\
--- a/a.rs\n+++ b/a.rs\n@@\n+x\n\
--- a/b.rs\n+++ b/b.rs\n@@\n+x\n\
--- a/c.rs\n+++ b/c.rs\n@@\n+x\n";
        let result = gate.evaluate(&context(&spec, Some(diff)));
        assert_eq!(result.status, GateStatus::Block);
        assert_eq!(result.details["files"], 3);
        assert_eq!(result.details["limit"], 2);
    }

    #[test]
    fn test_too_many_lines_blocks() {
        let gate = DiffCommandGate::new();
        let spec = BuildSpec::default();
        let diff = one_file_diff(&["+1", "+2", "+3", "+4", "-5", "-6"]);
        let result = gate.evaluate(&context(&spec, Some(diff.as_str())));
        assert_eq!(result.status, GateStatus::Block);
        assert_eq!(result.details["changed_lines"], 6);
    }

    #[test]
    fn test_secret_in_added_line_blocks() {
        let gate = DiffCommandGate::new();
        let spec = BuildSpec::default();
        let diff = one_file_diff(&[r#"+API_KEY = "sk_live_abcdef1234567890abcd""#]);
        let result = gate.evaluate(&context(&spec, Some(diff.as_str())));
        assert_eq!(result.status, GateStatus::Block);
        assert!(result.message.contains("credential"));
    }

    #[test]
    fn test_secret_in_removed_line_is_ignored() {
        // Removing a leaked secret must not be blocked.
        let gate = DiffCommandGate::new();
        let spec = BuildSpec::default();
        let diff = one_file_diff(&[r#"-password = "hunter2hunter2""#]);
        assert_eq!(
            gate.evaluate(&context(&spec, Some(diff.as_str()))).status,
            GateStatus::Ok
        );
    }

    #[test]
    fn test_changed_lines_ignores_headers() {
        let diff = "--- a/x\n+++ b/x\n@@\n+a\n-b\n context\n";
        assert_eq!(changed_lines(diff), 2);
    }
}
