//! Recovery action/event models.

use serde::{Deserialize, Serialize};

/// Closed set of actions the recovery engine can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    AutoRetry,
    OpenSettings,
    AutoCompact,
    AutoSwitchProvider,
    NotifyOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Provenance annotation attached when `RecoveryLearner` acted on a learned
/// suggestion rather than the static pattern table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedProvenance {
    pub learned_action: RecoveryAction,
    pub learned_confidence: f64,
    pub learned_source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecoveryEvent {
    pub action: RecoveryAction,
    pub user_message: String,
    pub status: RecoveryStatus,
    pub max_retries: Option<u32>,
    pub attempt: u32,
    pub provenance: Option<LearnedProvenance>,
}

impl ErrorRecoveryEvent {
    pub fn new(action: RecoveryAction, user_message: impl Into<String>, status: RecoveryStatus) -> Self {
        Self {
            action,
            user_message: user_message.into(),
            status,
            max_retries: None,
            attempt: 0,
            provenance: None,
        }
    }
}
