//! Learned-solution model keyed by error signature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionType {
    RetryWithDelay,
    ToolSwitch,
    Decomposition,
    ContextReduction,
    Manual,
}

/// A signature-keyed record of what has worked (or not) for a class of error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorSolution {
    pub signature: String,
    pub solution_type: SolutionType,
    pub action: String,
    /// `WilsonLowerBound95(success_count, failure_count)` after the first
    /// recorded outcome; `0.0` before any outcome has been recorded.
    pub confidence: f64,
    pub success_count: u32,
    pub failure_count: u32,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub tool_name: String,
    pub error_type: String,
}

impl ErrorSolution {
    pub fn new_default(
        signature: impl Into<String>,
        tool_name: impl Into<String>,
        error_type: impl Into<String>,
        solution_type: SolutionType,
        action: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            signature: signature.into(),
            solution_type,
            action: action.into(),
            confidence: 0.0,
            success_count: 0,
            failure_count: 0,
            first_seen: now,
            last_updated: now,
            tool_name: tool_name.into(),
            error_type: error_type.into(),
        }
    }

    /// §4.8: a found solution is usable only if both thresholds hold.
    pub fn is_valid(&self, min_confidence: f64, min_success_count: u32) -> bool {
        self.confidence >= min_confidence && self.success_count >= min_success_count
    }

    pub fn is_default(&self) -> bool {
        self.signature.starts_with("default_")
    }
}
