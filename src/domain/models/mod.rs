//! Pure domain models.

pub mod build_spec;
pub mod config;
pub mod execution;
pub mod gate;
pub mod graph;
pub mod routing;
pub mod session;
pub mod task;

pub use build_spec::{BuildSpec, PolicyLimits, ScopeBudget};
pub use config::{GateConfig, LoggingConfig, OrchestratorConfig, RoutingConfig, SchedulerConfig};
pub use execution::{ExecutionStatus, StatusSummary, TaskExecution};
pub use gate::{GateContext, GateResult, GateStatus, PipelineReport, ScopeCounters};
pub use graph::TaskGraph;
pub use routing::{ModelTier, RoleAssignment};
pub use session::{FailureReport, Session, SessionPhase};
pub use task::{AgentRole, Task, TaskConstraints, VerificationKind, VerificationSpec};
