//! Classifies a raw error message against a fixed rule table (§4.7).

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::models::{ErrorCategory, ErrorClassification, ErrorRule};

const SUBSTRING_CONFIDENCE: f64 = 0.8;
const REGEX_CONFIDENCE: f64 = 0.9;

static RULES: LazyLock<Vec<ErrorRule>> = LazyLock::new(|| {
    vec![
        ErrorRule {
            error_type: "rate_limit_429",
            category: ErrorCategory::RateLimit,
            substrings: &["rate limit", "too many requests", "429"],
            regexes: &[r"(?i)rate[\s_-]?limit"],
            is_transient: true,
            retryable: true,
            retry_delay_secs: Some(5),
            max_retries: Some(5),
        },
        ErrorRule {
            error_type: "network_unreachable",
            category: ErrorCategory::Network,
            substrings: &["connection refused", "econnreset", "network unreachable", "dns"],
            regexes: &[r"(?i)connection\s+(reset|refused|closed)"],
            is_transient: true,
            retryable: true,
            retry_delay_secs: Some(2),
            max_retries: Some(3),
        },
        ErrorRule {
            error_type: "auth_failure",
            category: ErrorCategory::Auth,
            substrings: &["unauthorized", "forbidden", "invalid api key", "401", "403"],
            regexes: &[r"(?i)\b(unauthorized|forbidden)\b"],
            is_transient: false,
            retryable: false,
            retry_delay_secs: None,
            max_retries: None,
        },
        ErrorRule {
            error_type: "timeout",
            category: ErrorCategory::Timeout,
            substrings: &["timed out", "timeout", "deadline exceeded"],
            regexes: &[r"(?i)time(d)?\s*-?\s*out"],
            is_transient: true,
            retryable: true,
            retry_delay_secs: Some(3),
            max_retries: Some(3),
        },
        ErrorRule {
            error_type: "context_overflow",
            category: ErrorCategory::ContextOverflow,
            substrings: &["context length", "context window", "maximum context", "too many tokens"],
            regexes: &[r"(?i)context\s+(length|window)\s+exceeded"],
            is_transient: false,
            retryable: false,
            retry_delay_secs: None,
            max_retries: None,
        },
        ErrorRule {
            error_type: "tool_failure",
            category: ErrorCategory::ToolFailure,
            substrings: &["command not found", "permission denied", "no such file", "exit code"],
            regexes: &[r"(?i)exit\s+code\s+\d+"],
            is_transient: false,
            retryable: true,
            retry_delay_secs: Some(1),
            max_retries: Some(1),
        },
    ]
});

/// `RULES[i].regexes` compiled once, in the same order, instead of on every
/// `classify` call. A malformed pattern here is a startup failure (`panic`),
/// not a rule that's silently skipped.
static COMPILED_REGEXES: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|rule| {
            rule.regexes
                .iter()
                .map(|pattern| Regex::new(pattern).unwrap_or_else(|e| panic!("invalid rule regex {pattern:?}: {e}")))
                .collect()
        })
        .collect()
});

/// Stateless: the rule table is process-static.
#[derive(Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, message: &str) -> ErrorClassification {
        let mut best: Option<(&ErrorRule, f64)> = None;

        for (rule, compiled) in RULES.iter().zip(COMPILED_REGEXES.iter()) {
            if let Some(score) = score_rule(rule, compiled, message) {
                if best.as_ref().is_none_or(|(_, best_score)| score > *best_score) {
                    best = Some((rule, score));
                }
            }
        }

        match best {
            Some((rule, confidence)) => ErrorClassification {
                error_type: rule.error_type.to_string(),
                category: rule.category,
                is_transient: rule.is_transient,
                retryable: rule.retryable,
                retry_delay_secs: rule.retry_delay_secs,
                max_retries: rule.max_retries,
                confidence,
            },
            None => ErrorClassification::unknown(),
        }
    }

    pub fn retry_delay(&self, classification: &ErrorClassification, attempt: u32) -> Option<std::time::Duration> {
        classification.retry_delay(attempt)
    }
}

fn score_rule(rule: &ErrorRule, compiled_regexes: &[Regex], message: &str) -> Option<f64> {
    let lower = message.to_lowercase();
    let regex_hit = compiled_regexes.iter().any(|re| re.is_match(message));
    if regex_hit {
        return Some(REGEX_CONFIDENCE);
    }
    let substring_hit = rule.substrings.iter().any(|s| lower.contains(&s.to_lowercase()));
    if substring_hit {
        return Some(SUBSTRING_CONFIDENCE);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_match_outranks_substring_match() {
        let classifier = ErrorClassifier::new();
        let cls = classifier.classify("Connection reset by peer");
        assert_eq!(cls.error_type, "network_unreachable");
        assert_eq!(cls.confidence, REGEX_CONFIDENCE);
    }

    #[test]
    fn substring_only_match_scores_lower() {
        let classifier = ErrorClassifier::new();
        let cls = classifier.classify("DNS resolution failed for host");
        assert_eq!(cls.error_type, "network_unreachable");
        assert_eq!(cls.confidence, SUBSTRING_CONFIDENCE);
    }

    #[test]
    fn unknown_error_has_fixed_shape() {
        let classifier = ErrorClassifier::new();
        let cls = classifier.classify("the quick brown fox");
        assert_eq!(cls.error_type, "unknown");
        assert!(!cls.retryable);
        assert_eq!(cls.confidence, 0.5);
    }

    #[test]
    fn retry_delay_applies_exponential_backoff() {
        let classifier = ErrorClassifier::new();
        let cls = classifier.classify("429 Too Many Requests");
        let delay = classifier.retry_delay(&cls, 2).unwrap();
        assert_eq!(delay, std::time::Duration::from_secs(20));
    }

    #[test]
    fn auth_failures_are_not_retryable() {
        let classifier = ErrorClassifier::new();
        let cls = classifier.classify("401 Unauthorized: invalid API key");
        assert!(!cls.retryable);
        assert!(!cls.is_transient);
    }
}
