//! Signature-keyed memory of which remediation worked for which error, with
//! a Wilson-score confidence estimate (§4.8).

use std::collections::HashMap;
use std::sync::LazyLock;

use md5::{Digest, Md5};
use regex::Regex;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::errors::LearningError;
use crate::domain::models::{ErrorClassification, ErrorSolution, SolutionType};
use crate::domain::ports::SolutionStore;

const MIN_CONFIDENCE: f64 = 0.3;
const MIN_SUCCESS_COUNT: u32 = 2;
const PRUNE_MIN_CONFIDENCE: f64 = 0.2;
const HISTORY_CAP: usize = 500;
const HISTORY_TRIM_TO: usize = 250;

static PATH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(/[\w.\-]+)+").expect("static pattern is valid regex"));
static LINE_COL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\d+:\d+").expect("static pattern is valid regex"));
static UUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").expect("static pattern is valid regex")
});
static HEX_HASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[0-9a-f]{7,40}\b").expect("static pattern is valid regex"));
static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\b").expect("static pattern is valid regex"));
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static pattern is valid regex"));

/// Normalizes a raw message then MD5-hashes it with the tool name as a
/// disambiguating prefix, truncated to 12 hex chars.
pub fn compute_error_signature(tool_name: &str, message: &str) -> String {
    let mut normalized = message.to_lowercase();
    normalized = PATH_RE.replace_all(&normalized, "<path>").into_owned();
    normalized = LINE_COL_RE.replace_all(&normalized, ":<loc>").into_owned();
    normalized = UUID_RE.replace_all(&normalized, "<uuid>").into_owned();
    // Pure-decimal runs must normalize before hex-hash matching, else a
    // long decimal integer (all digits are valid hex digits) is mistaken
    // for a hash instead of folding to the same `<n>` as a short one.
    normalized = INTEGER_RE.replace_all(&normalized, "<n>").into_owned();
    normalized = HEX_HASH_RE.replace_all(&normalized, "<hash>").into_owned();
    normalized = WHITESPACE_RE.replace_all(&normalized, " ").into_owned();
    let normalized = normalized.trim();

    let mut hasher = Md5::new();
    hasher.update(format!("{tool_name}:{normalized}"));
    let digest = hasher.finalize();
    let hex = format!("{digest:x}");
    hex[..12].to_string()
}

/// 95% lower confidence bound for a Bernoulli success rate (Wilson score
/// interval), used instead of a raw success ratio so a solution with few
/// observations isn't treated as confidently as one with many.
fn wilson_lower_bound(successes: u32, failures: u32) -> f64 {
    let n = f64::from(successes + failures);
    if n == 0.0 {
        return 0.0;
    }
    const Z: f64 = 1.959_963_984_540_054; // 95% two-sided z-score.
    let p_hat = f64::from(successes) / n;
    let z2 = Z * Z;
    let denominator = 1.0 + z2 / n;
    let centre = p_hat + z2 / (2.0 * n);
    let margin = Z * ((p_hat * (1.0 - p_hat) + z2 / (4.0 * n)) / n).sqrt();
    ((centre - margin) / denominator).max(0.0)
}

fn seed_defaults() -> HashMap<String, ErrorSolution> {
    let defaults = [
        ("default_bash_tool_failure", "bash", "tool_failure", SolutionType::RetryWithDelay, "retry the command once after a short delay"),
        ("default_network_network_unreachable", "network", "network_unreachable", SolutionType::RetryWithDelay, "retry with exponential backoff"),
        ("default_llm_rate_limit_429", "llm", "rate_limit_429", SolutionType::RetryWithDelay, "wait for the rate limit window then retry"),
        ("default_llm_context_overflow", "llm", "context_overflow", SolutionType::ContextReduction, "summarize or truncate context and retry"),
        ("default_llm_auth_failure", "llm", "auth_failure", SolutionType::ToolSwitch, "prompt for credential rotation"),
    ];
    defaults
        .into_iter()
        .map(|(sig, tool, error_type, solution_type, action)| {
            (
                sig.to_string(),
                ErrorSolution::new_default(sig, tool, error_type, solution_type, action),
            )
        })
        .collect()
}

struct State {
    solutions: HashMap<String, ErrorSolution>,
    history: Vec<String>,
}

/// The map is process-wide and must stay safe for concurrent readers and
/// serialized writers, since `learn` mutates on every recovery outcome.
pub struct LearningStrategy {
    state: RwLock<State>,
    store: Box<dyn SolutionStore>,
}

impl LearningStrategy {
    pub fn new(store: Box<dyn SolutionStore>) -> Self {
        Self {
            state: RwLock::new(State {
                solutions: seed_defaults(),
                history: Vec::new(),
            }),
            store,
        }
    }

    /// Tries the exact signature, then `default_<tool>_<type>`, then
    /// `default_*_<type>`. A hit is only usable if it clears both thresholds.
    pub async fn find_solution(&self, tool_name: &str, message: &str, cls: &ErrorClassification) -> Option<ErrorSolution> {
        let signature = compute_error_signature(tool_name, message);
        let state = self.state.read().await;

        let candidates = [
            signature,
            format!("default_{tool_name}_{}", cls.error_type),
            format!("default_*_{}", cls.error_type),
        ];
        for key in candidates {
            if let Some(solution) = state.solutions.get(&key) {
                if solution.is_valid(MIN_CONFIDENCE, MIN_SUCCESS_COUNT) {
                    return Some(solution.clone());
                }
            }
        }
        None
    }

    /// Returns a found, valid solution, or a default retry suggestion derived
    /// from the classifier's `retryable` field.
    pub async fn suggest_solution(&self, tool_name: &str, message: &str, cls: &ErrorClassification) -> ErrorSolution {
        if let Some(solution) = self.find_solution(tool_name, message, cls).await {
            return solution;
        }
        let signature = compute_error_signature(tool_name, message);
        let solution_type = if cls.retryable {
            SolutionType::RetryWithDelay
        } else {
            SolutionType::Manual
        };
        let action = if cls.retryable {
            "retry after the classifier's suggested delay".to_string()
        } else {
            "no automatic remedy known; surface to the user".to_string()
        };
        ErrorSolution::new_default(signature, tool_name, cls.error_type.clone(), solution_type, action)
    }

    /// Records an outcome against the message's signature and recomputes its
    /// Wilson-bound confidence. Creates the entry only on a first-seen
    /// success; a first-seen failure has no existing entry to update and is
    /// dropped rather than materializing a confidence-0 entry.
    pub async fn learn(&self, tool_name: &str, message: &str, error_type: &str, solution_type: SolutionType, action: &str, success: bool) {
        let signature = compute_error_signature(tool_name, message);
        let mut state = self.state.write().await;

        let entry = if success {
            Some(
                state
                    .solutions
                    .entry(signature.clone())
                    .or_insert_with(|| ErrorSolution::new_default(signature.clone(), tool_name, error_type, solution_type, action)),
            )
        } else {
            state.solutions.get_mut(&signature)
        };

        let Some(entry) = entry else {
            return;
        };

        if success {
            entry.success_count += 1;
        } else {
            entry.failure_count += 1;
        }
        entry.confidence = wilson_lower_bound(entry.success_count, entry.failure_count);
        entry.last_updated = chrono::Utc::now();

        state.history.push(signature);
        if state.history.len() > HISTORY_CAP {
            let overflow = state.history.len() - HISTORY_TRIM_TO;
            state.history.drain(0..overflow);
        }
    }

    /// Removes non-default entries whose confidence has fallen below the
    /// threshold. Seeded defaults are never pruned.
    pub async fn prune_weak_solutions(&self) {
        self.prune_weak_solutions_below(PRUNE_MIN_CONFIDENCE).await;
    }

    pub async fn prune_weak_solutions_below(&self, min_confidence: f64) {
        let mut state = self.state.write().await;
        let before = state.solutions.len();
        state
            .solutions
            .retain(|_, solution| solution.is_default() || solution.confidence >= min_confidence);
        debug!(removed = before - state.solutions.len(), "pruned weak solutions");
    }

    pub async fn export_solutions(&self) -> Vec<ErrorSolution> {
        self.state.read().await.solutions.values().cloned().collect()
    }

    /// Merges imported entries into the live map; on a signature collision
    /// the entry with the newer `last_updated` wins.
    pub async fn import_solutions(&self, entries: Vec<ErrorSolution>) -> Result<(), LearningError> {
        let mut state = self.state.write().await;
        for entry in entries {
            if entry.signature.is_empty() {
                return Err(LearningError::InvalidImportedEntry(
                    entry.signature.clone(),
                    "signature must not be empty".to_string(),
                ));
            }
            match state.solutions.get(&entry.signature) {
                Some(existing) if existing.last_updated >= entry.last_updated => {}
                _ => {
                    state.solutions.insert(entry.signature.clone(), entry);
                }
            }
        }
        Ok(())
    }

    /// Flushes the current map to the backing store.
    pub async fn persist(&self) -> anyhow::Result<()> {
        self.store.save(self.export_solutions().await).await
    }

    /// Loads and merges entries from the backing store.
    pub async fn restore(&self) -> anyhow::Result<()> {
        let entries = self.store.load().await?;
        self.import_solutions(entries)
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::NullSolutionStore;

    fn strategy() -> LearningStrategy {
        LearningStrategy::new(Box::new(NullSolutionStore))
    }

    #[test]
    fn signature_normalizes_paths_and_integers() {
        let a = compute_error_signature("bash", "file /home/user/project/src/main.rs:42:7 not found");
        let b = compute_error_signature("bash", "file /tmp/other/path.rs:9:2 not found");
        assert_eq!(a, b);
    }

    #[test]
    fn signature_is_12_hex_chars() {
        let sig = compute_error_signature("bash", "anything");
        assert_eq!(sig.len(), 12);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn wilson_bound_is_conservative_with_few_trials() {
        let one_of_one = wilson_lower_bound(1, 0);
        let hundred_of_hundred = wilson_lower_bound(100, 0);
        assert!(one_of_one < hundred_of_hundred);
        assert!(one_of_one < 1.0);
    }

    #[tokio::test]
    async fn find_solution_rejects_entries_below_threshold() {
        let strategy = strategy();
        let cls = ErrorClassification {
            error_type: "some_error".into(),
            category: crate::domain::models::ErrorCategory::Unknown,
            is_transient: false,
            retryable: true,
            retry_delay_secs: Some(1),
            max_retries: Some(1),
            confidence: 0.8,
        };
        assert!(strategy.find_solution("bash", "a brand new failure", &cls).await.is_none());
    }

    #[tokio::test]
    async fn learn_then_find_returns_the_entry_once_thresholds_clear() {
        let strategy = strategy();
        let cls = ErrorClassification {
            error_type: "flaky_tool".into(),
            category: crate::domain::models::ErrorCategory::ToolFailure,
            is_transient: true,
            retryable: true,
            retry_delay_secs: Some(1),
            max_retries: Some(2),
            confidence: 0.8,
        };
        let message = "transient flake in step 3";
        strategy
            .learn("bash", message, &cls.error_type, SolutionType::RetryWithDelay, "retry", true)
            .await;
        strategy
            .learn("bash", message, &cls.error_type, SolutionType::RetryWithDelay, "retry", true)
            .await;
        let found = strategy.find_solution("bash", message, &cls).await;
        assert!(found.is_some());
        assert!(found.unwrap().confidence >= MIN_CONFIDENCE);
    }

    #[tokio::test]
    async fn suggest_solution_falls_back_to_retry_for_retryable_unknowns() {
        let strategy = strategy();
        let cls = ErrorClassification {
            error_type: "brand_new".into(),
            category: crate::domain::models::ErrorCategory::Unknown,
            is_transient: true,
            retryable: true,
            retry_delay_secs: Some(1),
            max_retries: Some(1),
            confidence: 0.5,
        };
        let suggestion = strategy.suggest_solution("bash", "never seen before", &cls).await;
        assert_eq!(suggestion.solution_type, SolutionType::RetryWithDelay);
    }

    #[tokio::test]
    async fn prune_removes_only_weak_non_default_entries() {
        let strategy = strategy();
        {
            let mut state = strategy.state.write().await;
            state.solutions.insert(
                "weak_entry".to_string(),
                ErrorSolution {
                    confidence: 0.05,
                    ..ErrorSolution::new_default("weak_entry", "bash", "x", SolutionType::Manual, "noop")
                },
            );
        }
        let before = strategy.export_solutions().await.len();
        strategy.prune_weak_solutions().await;
        let after = strategy.export_solutions().await.len();
        assert_eq!(after, before - 1);
        assert!(strategy.export_solutions().await.iter().all(|s| s.signature != "weak_entry"));
    }

    #[tokio::test]
    async fn import_prefers_newer_last_updated() {
        let strategy = strategy();
        let mut older = ErrorSolution::new_default("sig-1", "bash", "x", SolutionType::Manual, "old action");
        older.last_updated = chrono::Utc::now() - chrono::Duration::days(1);
        let mut newer = older.clone();
        newer.action = "new action".to_string();
        newer.last_updated = chrono::Utc::now();

        strategy.import_solutions(vec![older]).await.unwrap();
        strategy.import_solutions(vec![newer]).await.unwrap();

        let solutions = strategy.export_solutions().await;
        let entry = solutions.iter().find(|s| s.signature == "sig-1").unwrap();
        assert_eq!(entry.action, "new action");
    }

    #[tokio::test]
    async fn history_ring_is_trimmed_on_overflow() {
        let strategy = strategy();
        let cls_error_type = "repeated_error";
        for i in 0..(HISTORY_CAP + 10) {
            // Always a success: a first-seen failure creates no entry and
            // pushes nothing to history, which would starve this test of the
            // overflow it's meant to exercise.
            strategy
                .learn("bash", &format!("failure variant {i}"), cls_error_type, SolutionType::RetryWithDelay, "retry", true)
                .await;
        }
        let history_len = strategy.state.read().await.history.len();
        assert!(history_len <= HISTORY_CAP);
        assert!(history_len >= HISTORY_TRIM_TO);
    }

    #[tokio::test]
    async fn a_first_seen_failure_creates_no_entry() {
        let strategy = strategy();
        strategy
            .learn("bash", "never seen before, and it failed", "brand_new", SolutionType::Manual, "noop", false)
            .await;
        assert!(strategy.export_solutions().await.is_empty());
        assert!(strategy.state.read().await.history.is_empty());
    }

    #[tokio::test]
    async fn a_failure_after_a_success_updates_the_existing_entry() {
        let strategy = strategy();
        let message = "flaky then flaky again";
        strategy
            .learn("bash", message, "flaky_tool", SolutionType::RetryWithDelay, "retry", true)
            .await;
        strategy
            .learn("bash", message, "flaky_tool", SolutionType::RetryWithDelay, "retry", false)
            .await;
        let solutions = strategy.export_solutions().await;
        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].success_count, 1);
        assert_eq!(solutions[0].failure_count, 1);
    }
}
