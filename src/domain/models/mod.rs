//! Domain models: plain data types with no dependency on a specific store or
//! transport, shared across services.

pub mod agent;
pub mod analysis;
pub mod claim;
pub mod error_taxonomy;
pub mod lock;
pub mod recovery;
pub mod routing;
pub mod runtime;
pub mod solution;
pub mod swarm;

pub use agent::{AgentConfig, AgentSpec, AgentTtl, ExecutionOrder, ModelTier};
pub use analysis::{Complexity, Specialization, TaskAnalysis, TaskType};
pub use claim::{ClaimStatus, ClaimableTask};
pub use error_taxonomy::{ErrorCategory, ErrorClassification, ErrorRule};
pub use lock::ResourceLock;
pub use recovery::{ErrorRecoveryEvent, LearnedProvenance, RecoveryAction, RecoveryStatus};
pub use routing::{CoreRole, ExecutionMode, RoutingContext, RoutingDecision};
pub use runtime::{AgentReport, AgentRuntime, AgentStatus, ReportType};
pub use solution::{ErrorSolution, SolutionType};
pub use swarm::{ConflictResolution, ReportingMode, SwarmConfig, SwarmPlan, SwarmResult, SwarmStatistics};
