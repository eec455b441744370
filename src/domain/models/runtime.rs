//! Runtime state tracked by the scheduler for one `AgentConfig` per swarm run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle state of a runtime.
///
/// `Pending` (unmet deps) -> `Ready` (deps all completed) -> `Running` ->
/// terminal (`Completed` | `Failed` | `Cancelled`). Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Pending,
    Ready,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl AgentStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Event type an `AgentReport` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Started,
    Progress,
    Completed,
    Failed,
    Conflict,
    Resource,
}

impl ReportType {
    /// Types forwarded to the coordinator when `reportingMode = sparse`.
    pub const SPARSE: [ReportType; 5] = [
        ReportType::Started,
        ReportType::Completed,
        ReportType::Failed,
        ReportType::Conflict,
        ReportType::Resource,
    ];

    pub fn is_sparse_relevant(self) -> bool {
        Self::SPARSE.contains(&self)
    }
}

/// An append-only event an executor emits during one agent's run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    pub agent_id: String,
    pub agent_name: String,
    pub report_type: ReportType,
    pub timestamp: DateTime<Utc>,
    pub data: Value,
}

impl AgentReport {
    pub fn new(agent_id: impl Into<String>, agent_name: impl Into<String>, report_type: ReportType) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            report_type,
            timestamp: Utc::now(),
            data: Value::Null,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

/// Mutable per-run state for one `AgentConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRuntime {
    pub agent_id: String,
    pub agent_name: String,
    pub status: AgentStatus,
    /// Unmet dependency ids; a runtime becomes `Ready` once this is empty.
    pub pending_dependencies: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub iterations: u32,
    pub reports: Vec<AgentReport>,
}

impl AgentRuntime {
    /// Create a fresh runtime. `dependencies` are the config's resolved
    /// dependency ids; an empty list means the runtime starts `Ready`.
    pub fn new(agent_id: impl Into<String>, agent_name: impl Into<String>, dependencies: Vec<String>) -> Self {
        let status = if dependencies.is_empty() {
            AgentStatus::Ready
        } else {
            AgentStatus::Pending
        };
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            status,
            pending_dependencies: dependencies,
            start_time: None,
            end_time: None,
            output: None,
            error: None,
            iterations: 0,
            reports: Vec::new(),
        }
    }
}
