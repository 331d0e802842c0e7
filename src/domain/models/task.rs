//! Task domain model.
//!
//! Tasks are discrete units of work executed by LLM-backed agents. They form
//! a DAG via string-keyed dependencies and carry the proposed effects
//! (commands, diff) that the gate pipeline inspects before dispatch.

use serde::{Deserialize, Serialize};

/// Role an agent assumes when executing a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Implements concrete build steps.
    Worker,
    /// Coordinates and decomposes larger work items.
    Foreman,
    /// Reviews produced artifacts against expectations.
    Reviewer,
    /// Specialized repair role used by the escalation ladder.
    Fixer,
}

impl Default for AgentRole {
    fn default() -> Self {
        Self::Worker
    }
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Foreman => "foreman",
            Self::Reviewer => "reviewer",
            Self::Fixer => "fixer",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "worker" => Some(Self::Worker),
            "foreman" => Some(Self::Foreman),
            "reviewer" => Some(Self::Reviewer),
            "fixer" => Some(Self::Fixer),
            _ => None,
        }
    }
}

/// How a task's output is verified after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationKind {
    /// Run the listed commands; all must exit zero.
    Commands,
    /// Check that the expected output artifacts exist.
    ArtifactCheck,
    /// No per-task verification; covered by global verification only.
    None,
}

impl Default for VerificationKind {
    fn default() -> Self {
        Self::None
    }
}

/// Per-task verification settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSpec {
    pub kind: VerificationKind,
    /// Commands to run when `kind` is `Commands`.
    #[serde(default)]
    pub commands: Vec<String>,
}

/// Resource and command limits for a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConstraints {
    /// Maximum files this task may touch.
    pub max_files: u32,
    /// Maximum diff lines this task may produce.
    pub max_diff_lines: u32,
    /// Maximum commands this task may propose.
    pub max_commands: u32,
}

impl Default for TaskConstraints {
    fn default() -> Self {
        Self {
            max_files: 10,
            max_diff_lines: 500,
            max_commands: 20,
        }
    }
}

/// A discrete unit of work in the build graph.
///
/// Immutable once the owning [`TaskGraph`](super::graph::TaskGraph) has been
/// validated; all mutable execution state lives in
/// [`TaskExecution`](super::execution::TaskExecution).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier within the graph. Execution order ties are broken
    /// lexicographically on this id, so ids double as a determinism key.
    pub id: String,
    /// Detailed description/prompt for the executing agent.
    pub description: String,
    /// Role the task should run under (before any escalation).
    #[serde(default)]
    pub role: AgentRole,
    /// Ids of tasks that must be Done before this one becomes Ready.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Artifacts this task is expected to produce.
    #[serde(default)]
    pub expected_outputs: Vec<String>,
    /// How the task's output is verified.
    #[serde(default)]
    pub verification: VerificationSpec,
    /// Resource/command limits enforced by the gate pipeline.
    #[serde(default)]
    pub constraints: TaskConstraints,
    /// Commands the task proposes to run; inspected by gates before dispatch.
    #[serde(default)]
    pub proposed_commands: Vec<String>,
    /// Unified diff the task proposes to apply, if any.
    #[serde(default)]
    pub proposed_diff: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            role: AgentRole::default(),
            dependencies: Vec::new(),
            expected_outputs: Vec::new(),
            verification: VerificationSpec::default(),
            constraints: TaskConstraints::default(),
            proposed_commands: Vec::new(),
            proposed_diff: None,
        }
    }

    /// Set the agent role.
    pub fn with_role(mut self, role: AgentRole) -> Self {
        self.role = role;
        self
    }

    /// Add a dependency. Self-dependencies and duplicates are ignored.
    pub fn with_dependency(mut self, task_id: impl Into<String>) -> Self {
        let task_id = task_id.into();
        if task_id != self.id && !self.dependencies.contains(&task_id) {
            self.dependencies.push(task_id);
        }
        self
    }

    /// Set the proposed commands.
    pub fn with_commands(mut self, commands: Vec<String>) -> Self {
        self.proposed_commands = commands;
        self
    }

    /// Set the proposed diff.
    pub fn with_diff(mut self, diff: impl Into<String>) -> Self {
        self.proposed_diff = Some(diff.into());
        self
    }

    /// Set the verification spec.
    pub fn with_verification(mut self, verification: VerificationSpec) -> Self {
        self.verification = verification;
        self
    }

    /// Set the constraints.
    pub fn with_constraints(mut self, constraints: TaskConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Structural validation of a single task.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Task id cannot be empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err(format!("Task '{}' has an empty description", self.id));
        }
        if self.dependencies.contains(&self.id) {
            return Err(format!("Task '{}' cannot depend on itself", self.id));
        }
        if self.verification.kind == VerificationKind::Commands
            && self.verification.commands.is_empty()
        {
            return Err(format!(
                "Task '{}' declares command verification but lists no commands",
                self.id
            ));
        }
        Ok(())
    }
}
