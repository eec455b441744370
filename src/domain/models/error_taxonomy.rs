//! Error classification taxonomy produced by `ErrorClassifier::classify`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    RateLimit,
    Network,
    Auth,
    Timeout,
    ToolFailure,
    ContextOverflow,
    Unknown,
}

/// The result of matching a raw error message against the rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorClassification {
    /// The matching rule's type name (`"rate_limit_429"`, `"unknown"`, ...).
    pub error_type: String,
    pub category: ErrorCategory,
    pub is_transient: bool,
    pub retryable: bool,
    pub retry_delay_secs: Option<u64>,
    pub max_retries: Option<u32>,
    /// 0.9 for a regex match, 0.8 for a substring match, 0.5 for unknown.
    pub confidence: f64,
}

impl ErrorClassification {
    pub fn unknown() -> Self {
        Self {
            error_type: "unknown".to_string(),
            category: ErrorCategory::Unknown,
            is_transient: false,
            retryable: false,
            retry_delay_secs: None,
            max_retries: None,
            confidence: 0.5,
        }
    }

    /// `retryDelay * 2^attempt`, exponential backoff.
    pub fn retry_delay(&self, attempt: u32) -> Option<std::time::Duration> {
        self.retry_delay_secs
            .map(|base| std::time::Duration::from_secs(base.saturating_mul(1u64 << attempt.min(32))))
    }
}

/// One entry in the fixed classification rule table.
#[derive(Debug, Clone)]
pub struct ErrorRule {
    pub error_type: &'static str,
    pub category: ErrorCategory,
    /// Substring patterns, matched case-insensitively, score 0.8.
    pub substrings: &'static [&'static str],
    /// Regex patterns, score 0.9.
    pub regexes: &'static [&'static str],
    pub is_transient: bool,
    pub retryable: bool,
    pub retry_delay_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_delay_doubles_per_attempt() {
        let cls = ErrorClassification {
            error_type: "rate_limit".into(),
            category: ErrorCategory::RateLimit,
            is_transient: true,
            retryable: true,
            retry_delay_secs: Some(1),
            max_retries: Some(5),
            confidence: 0.9,
        };
        assert_eq!(cls.retry_delay(0), Some(std::time::Duration::from_secs(1)));
        assert_eq!(cls.retry_delay(1), Some(std::time::Duration::from_secs(2)));
        assert_eq!(cls.retry_delay(3), Some(std::time::Duration::from_secs(8)));
    }

    #[test]
    fn unknown_has_fixed_shape() {
        let cls = ErrorClassification::unknown();
        assert_eq!(cls.error_type, "unknown");
        assert!(!cls.retryable);
        assert_eq!(cls.confidence, 0.5);
    }
}
