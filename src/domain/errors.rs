//! Domain error types for the orchestration core.
//!
//! Each enum covers one component's failure modes, following the same
//! per-domain `thiserror` split the rest of the codebase uses rather than one
//! monolithic error type.

use thiserror::Error;

/// Errors raised while synthesizing agent specs/configs in the factory.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("spec name '{0}' is not unique within this batch")]
    DuplicateSpecName(String),

    #[error("dependency graph among specs contains a cycle")]
    CyclicDependencies,
}

/// Errors raised while routing a task to core/dynamic/swarm.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    #[error("forced agent id '{0}' does not name a known core role")]
    UnknownForcedAgent(String),
}

/// Errors raised by the resource lock manager.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("resource '{resource}' is held by another agent")]
    Held { resource: String },

    #[error("agent '{agent_id}' does not own the lock on '{resource}'")]
    NotOwner { resource: String, agent_id: String },
}

/// Errors surfaced by the swarm scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("agent config '{0}' references an unknown dependency id '{1}'")]
    UnknownDependency(String, String),

    #[error("scheduler was already cancelled")]
    AlreadyCancelled,
}

impl SchedulerError {
    /// Dependency-graph errors are a caller bug (unknown id slipped past the
    /// factory); everything else is a runtime condition.
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::UnknownDependency(_, _))
    }
}

/// Errors from the error classifier's rule table itself (not the errors being
/// classified).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("pattern compiled for rule '{rule}' is invalid: {source}")]
    InvalidPattern { rule: String, source: String },
}

/// Errors from the learning strategy's solution store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LearningError {
    #[error("imported solution entry for signature '{0}' is structurally invalid: {1}")]
    InvalidImportedEntry(String, String),
}

/// Errors from the recovery engine/learner.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("retry callback failed: {0}")]
    RetryCallbackFailed(String),

    #[error("max retries ({max}) exceeded for error code '{code}'")]
    MaxRetriesExceeded { code: String, max: u32 },
}

/// Errors raised while loading/validating `CoreConfig`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid max_agents: {0}, must be between 1 and 50")]
    InvalidMaxAgents(usize),

    #[error("invalid log level: {0}")]
    InvalidLogLevel(String),

    #[error("learning.history_trim_to ({trim_to}) must be less than learning.history_cap ({cap})")]
    InvalidHistoryBounds { trim_to: usize, cap: usize },

    #[error("invalid confidence threshold for {field}: {value}, must be in [0, 1]")]
    InvalidConfidence { field: String, value: f64 },

    #[error("failed to extract configuration: {0}")]
    ExtractFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_error_permanence() {
        let err = SchedulerError::UnknownDependency("a".into(), "b".into());
        assert!(err.is_permanent());
        assert!(!SchedulerError::AlreadyCancelled.is_permanent());
    }

    #[test]
    fn lock_error_display() {
        let err = LockError::NotOwner {
            resource: "file.rs".into(),
            agent_id: "dynamic-writer-1".into(),
        };
        assert_eq!(
            err.to_string(),
            "agent 'dynamic-writer-1' does not own the lock on 'file.rs'"
        );
    }
}
