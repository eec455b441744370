//! Routing context/decision types.

use serde::{Deserialize, Serialize};

use super::agent::AgentSpec;
use super::swarm::SwarmConfig;

/// One of the four predefined agent archetypes with fixed prompts/tool sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreRole {
    Coder,
    Reviewer,
    Explore,
    Plan,
}

impl CoreRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Coder => "coder",
            Self::Reviewer => "reviewer",
            Self::Explore => "explore",
            Self::Plan => "plan",
        }
    }
}

/// Input to `TaskRouter::route`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingContext {
    pub task: String,
    pub working_directory: Option<String>,
    pub project_structure: Option<String>,
    pub relevant_files: Vec<String>,
    pub session_id: Option<String>,
    /// When set and it names a known core role, bypasses classification.
    pub forced_agent_id: Option<String>,
}

/// Whether the swarm scheduler should wait for upfront-declared dependency
/// edges (`Dag`) or let agents race to claim tasks from a shared pool
/// (`Optimistic`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Dag,
    Optimistic,
}

/// The router's closed-sum-type output: a single core role, an ad-hoc set of
/// dynamic specialists, or a parallel swarm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingDecision {
    Core {
        role: CoreRole,
        /// Set when a `Profiler` recommendation backed the choice.
        profiler_score: Option<f64>,
    },
    Dynamic {
        specs: Vec<AgentSpec>,
    },
    Swarm {
        specs: Vec<AgentSpec>,
        config: SwarmConfig,
        execution_mode: ExecutionMode,
    },
}

impl RoutingDecision {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Core { .. } => "core",
            Self::Dynamic { .. } => "dynamic",
            Self::Swarm { .. } => "swarm",
        }
    }
}
