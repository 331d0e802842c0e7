//! Orchestrator configuration model.
//!
//! Loaded hierarchically by `infrastructure::config::ConfigLoader`
//! (defaults -> project yaml -> local yaml -> `TASKFORGE_*` env).

use serde::{Deserialize, Serialize};

/// Scheduler and coordinator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Concurrent dispatch bound. 1 is the safe, source-faithful default.
    pub worker_pool_size: usize,
    /// Default per-task retry budget (a task gets `max_retries + 1` attempts).
    pub default_max_retries: u32,
    /// Session-level bound on VERIFICATION -> EXECUTION fix cycles.
    pub max_fix_cycles: u32,
    /// Per-task dispatch timeout in seconds.
    pub task_timeout_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: 1,
            default_max_retries: 2,
            max_fix_cycles: 3,
            task_timeout_secs: 600,
        }
    }
}

/// Gate pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Collect all violations instead of short-circuiting on the first Block
    /// (audit mode).
    pub collect_all_violations: bool,
    /// Regex patterns for denied commands (policy gate).
    pub denied_command_patterns: Vec<String>,
    /// Path fragments tasks may never touch (policy gate).
    pub denied_paths: Vec<String>,
    /// Command families (first token) permitted by the risk gate.
    pub allowed_command_families: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            collect_all_violations: false,
            denied_command_patterns: vec![
                r"rm\s+-rf\s+/".to_string(),
                r"\bsudo\b".to_string(),
                r"\bchmod\s+777\b".to_string(),
                r">\s*/dev/sd".to_string(),
            ],
            denied_paths: vec![
                ".env".to_string(),
                ".ssh".to_string(),
                "secrets/".to_string(),
                ".git/config".to_string(),
            ],
            allowed_command_families: vec![
                "cargo".to_string(),
                "npm".to_string(),
                "npx".to_string(),
                "node".to_string(),
                "python".to_string(),
                "pytest".to_string(),
                "git".to_string(),
                "mkdir".to_string(),
                "ls".to_string(),
                "cat".to_string(),
                "echo".to_string(),
            ],
        }
    }
}

/// Tier -> model alias mapping for routing decisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub fast_model: String,
    pub balanced_model: String,
    pub powerful_model: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            fast_model: "haiku".to_string(),
            balanced_model: "sonnet".to_string(),
            powerful_model: "opus".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of: trace, debug, info, warn, error.
    pub level: String,
    /// One of: json, pretty.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub gates: GateConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.scheduler.worker_pool_size, 1);
        assert_eq!(config.scheduler.default_max_retries, 2);
        assert_eq!(config.scheduler.max_fix_cycles, 3);
        assert!(!config.gates.collect_all_violations);
        assert_eq!(config.routing.balanced_model, "sonnet");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "scheduler:\n  worker_pool_size: 4\n";
        let config: OrchestratorConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.scheduler.worker_pool_size, 4);
        assert_eq!(config.routing.powerful_model, "opus");
    }
}
