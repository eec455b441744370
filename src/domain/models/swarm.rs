//! `SwarmConfig`/`SwarmResult` and friends.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::agent::AgentConfig;
use super::runtime::AgentRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingMode {
    Sparse,
    Full,
}

/// How the coordinator resolves competing resource claims.
///
/// `Vote` is declared but never dispatched on — reserved, per the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    Coordinator,
    Vote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// 1..=50.
    pub max_agents: usize,
    pub reporting_mode: ReportingMode,
    pub conflict_resolution: ConflictResolution,
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    pub enable_peer_communication: bool,
}

impl SwarmConfig {
    pub fn validated(self) -> Result<Self, String> {
        if self.max_agents == 0 || self.max_agents > 50 {
            return Err(format!(
                "max_agents must be in 1..=50, got {}",
                self.max_agents
            ));
        }
        Ok(self)
    }
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            max_agents: 6,
            reporting_mode: ReportingMode::Sparse,
            conflict_resolution: ConflictResolution::Coordinator,
            timeout: Duration::from_secs(900),
            enable_peer_communication: false,
        }
    }
}

/// Final aggregate statistics for one `execute` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwarmStatistics {
    pub parallel_peak: usize,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total_iterations: u64,
}

/// The read-only result published at the end of `execute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmResult {
    pub success: bool,
    pub agents: Vec<AgentRuntime>,
    pub aggregated_output: String,
    #[serde(with = "duration_millis")]
    pub total_time: Duration,
    pub statistics: SwarmStatistics,
}

/// Inputs the factory hands the scheduler.
#[derive(Debug, Clone)]
pub struct SwarmPlan {
    pub agents: Vec<AgentConfig>,
    pub config: SwarmConfig,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
