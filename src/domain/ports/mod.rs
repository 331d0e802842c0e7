//! Collaborator ports consumed by the orchestration core.

pub mod agent_runner;
pub mod effect_executor;
pub mod event_sink;
pub mod verifier;

pub use agent_runner::{AgentRunner, TaskOutcome};
pub use effect_executor::{EffectExecutor, EffectReport};
pub use event_sink::{EventSink, MemoryEventSink, OrchestrationEvent, StampedEvent, TracingEventSink};
pub use verifier::{VerificationReport, Verifier};
