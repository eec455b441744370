//! Agent spec/config models.
//!
//! `AgentSpec` is the declarative description the factory is asked to
//! synthesize from; `AgentConfig` is the executable form handed to the
//! scheduler. Specs name dependencies by other specs' `name`; configs resolve
//! those names to globally unique `id`s.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Relative capability tier a worker is launched with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    Fast,
    Balanced,
    Powerful,
}

/// How long an `AgentConfig` should remain addressable after its task ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentTtl {
    /// Destroyed with the parent task via `destroyTaskAgents`.
    Task,
    /// Survives across tasks within the same session.
    Session,
}

/// How the factory recommends the resulting agents be run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOrder {
    /// Every spec is parallelizable and dependency-free.
    Parallel,
    /// No spec is parallelizable, or at least one has a dependency.
    Sequential,
    /// Neither uniformly parallel nor uniformly sequential.
    Mixed,
}

/// Declarative description of a worker, as produced by routing or a caller.
///
/// Immutable once constructed; the factory turns a batch of these into
/// `AgentConfig`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Identifier unique within the batch this spec is synthesized alongside.
    pub name: String,
    pub responsibility: String,
    pub tools: Vec<String>,
    pub parallelizable: bool,
    /// Names of other specs in the same batch that must complete first.
    pub dependencies: Vec<String>,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, responsibility: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            responsibility: responsibility.into(),
            tools: Vec::new(),
            parallelizable: true,
            dependencies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn sequential(mut self) -> Self {
        self.parallelizable = false;
        self
    }
}

/// The executable form of a spec: one per spec per routing decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Globally unique: `dynamic-<name>-<ts>-<idx>` or `core-<role>-<ts>`.
    pub id: String,
    pub prompt: String,
    pub tools: Vec<String>,
    pub model_tier: ModelTier,
    pub max_iterations: u32,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    pub parent_task_id: Option<String>,
    /// Resolved dependency ids (not names) — every entry refers to another
    /// `AgentConfig` in the same decision.
    pub dependencies: Vec<String>,
    pub ttl: AgentTtl,
    pub spec: AgentSpec,
}

impl AgentConfig {
    /// All tool identifiers requested, deduplicated, order-preserving.
    pub fn tool_set(&self) -> HashSet<&str> {
        self.tools.iter().map(String::as_str).collect()
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}
