//! Taskforge - Phase-gated build orchestration core
//!
//! Taskforge coordinates agent-driven builds: a session walks a strict phase
//! machine from questionnaire to verification, a task master schedules a
//! validated DAG of tasks with retries and failure propagation, a distributor
//! routes each attempt to a role and model tier, and a gate pipeline vets
//! every proposed command and diff before it is applied.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, errors, and collaborator ports
//! - **Service Layer** (`services`): Scheduling, routing, gating, coordination
//! - **Infrastructure Layer** (`infrastructure`): Config, logging, port impls
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use taskforge::domain::models::OrchestratorConfig;
//! use taskforge::domain::ports::TracingEventSink;
//! use taskforge::infrastructure::runners::{RecordingEffects, ScriptedRunner, ScriptedVerifier};
//! use taskforge::services::SessionCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut coordinator = SessionCoordinator::new(
//!         OrchestratorConfig::default(),
//!         Arc::new(ScriptedRunner::succeeding()),
//!         Arc::new(RecordingEffects::new()),
//!         Arc::new(ScriptedVerifier::passing()),
//!         Arc::new(TracingEventSink),
//!     );
//!     coordinator.begin().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AgentRole, BuildSpec, ExecutionStatus, GateStatus, ModelTier, OrchestratorConfig,
    RoleAssignment, Session, SessionPhase, StatusSummary, Task, TaskExecution, TaskGraph,
};
pub use domain::ports::{
    AgentRunner, EffectExecutor, EventSink, OrchestrationEvent, Verifier,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Distributor, GatePipeline, SessionCoordinator, TaskMaster};
