//! The event sink port: a push interface the scheduler emits lifecycle
//! events to, independent of whatever transport (IPC, UI) the caller wires up.

use crate::domain::models::{AgentStatus, SwarmStatistics};

/// Lifecycle events the scheduler pushes. Mirrors §6.2's minimum surface.
#[derive(Debug, Clone)]
pub enum SwarmEvent {
    Started { agent_count: usize },
    AgentAdded { id: String, name: String, role: Option<String> },
    AgentUpdated {
        id: String,
        status: AgentStatus,
        start_time: Option<chrono::DateTime<chrono::Utc>>,
        iterations: Option<u32>,
    },
    AgentCompleted { id: String, output: String },
    AgentFailed { id: String, error: String },
    Cancelled,
    Completed { statistics: SwarmStatistics },
}

/// Push interface for swarm lifecycle events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SwarmEvent);
}

/// An event sink that drops every event; useful for tests and headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: SwarmEvent) {}
}
