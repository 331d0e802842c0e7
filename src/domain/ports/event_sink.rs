//! Structured event emission port.
//!
//! The coordinator emits one event per phase transition and per task
//! lifecycle change. It never reads the log back during execution; sinks are
//! free to persist, forward, or drop events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::models::{GateStatus, SessionPhase};

/// A structured orchestration event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    PhaseChanged {
        session_id: Uuid,
        from: SessionPhase,
        to: SessionPhase,
        reason: String,
    },
    TaskScheduled {
        session_id: Uuid,
        task_id: String,
        attempt: u32,
        role: String,
        model: String,
    },
    TaskDone {
        session_id: Uuid,
        task_id: String,
    },
    TaskFailed {
        session_id: Uuid,
        task_id: String,
        error: String,
    },
    TaskRetried {
        session_id: Uuid,
        task_id: String,
        attempt: u32,
    },
    TaskSkipped {
        session_id: Uuid,
        task_id: String,
        failed_dependency: String,
    },
    GateVerdict {
        session_id: Uuid,
        task_id: String,
        status: GateStatus,
        message: String,
    },
    SessionFailed {
        session_id: Uuid,
        root_cause: String,
    },
}

/// An event stamped with its emission time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: OrchestrationEvent,
}

/// Receives orchestration events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: OrchestrationEvent);
}

/// Sink that forwards events to the tracing subscriber as structured logs.
#[derive(Debug, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn emit(&self, event: OrchestrationEvent) {
        match &event {
            OrchestrationEvent::TaskFailed { task_id, error, .. } => {
                tracing::warn!(task_id = %task_id, error = %error, "task failed");
            }
            OrchestrationEvent::SessionFailed { root_cause, .. } => {
                tracing::error!(root_cause = %root_cause, "session failed");
            }
            other => {
                tracing::info!(event = ?other, "orchestration event");
            }
        }
    }
}

/// In-memory sink for tests and post-mortem inspection.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<StampedEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events emitted so far, oldest first.
    pub fn events(&self) -> Vec<StampedEvent> {
        self.events.lock().expect("event sink poisoned").clone()
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn emit(&self, event: OrchestrationEvent) {
        self.events.lock().expect("event sink poisoned").push(StampedEvent {
            at: Utc::now(),
            event,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sink_records_in_order() {
        let sink = MemoryEventSink::new();
        let session_id = Uuid::new_v4();
        sink.emit(OrchestrationEvent::TaskDone {
            session_id,
            task_id: "a".to_string(),
        })
        .await;
        sink.emit(OrchestrationEvent::TaskDone {
            session_id,
            task_id: "b".to_string(),
        })
        .await;

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0].event,
            OrchestrationEvent::TaskDone { task_id, .. } if task_id == "a"
        ));
    }

    #[test]
    fn test_event_serde_tagging() {
        let event = OrchestrationEvent::PhaseChanged {
            session_id: Uuid::new_v4(),
            from: SessionPhase::Execution,
            to: SessionPhase::Verification,
            reason: "all tasks terminal".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"phase_changed\""));
        assert!(json.contains("\"verification\""));
    }
}
