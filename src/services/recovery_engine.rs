//! Maps a classified error to a concrete recovery action and drives simple
//! automated remediation (§4.9).

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::info;

use crate::domain::models::{RecoveryAction, RecoveryStatus};

/// Callbacks the caller supplies for the side-effecting recovery actions.
/// Any absent callback degrades its action to a no-op success/failure per
/// the source's `if present` language.
#[async_trait]
pub trait RecoveryContext: Send + Sync {
    async fn on_retry(&self) -> anyhow::Result<()>;
    async fn on_compact(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn on_switch_provider(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

struct PatternRule {
    matches: fn(&str) -> bool,
    action: RecoveryAction,
    max_retries: Option<u32>,
}

static PATTERN_TABLE: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        PatternRule {
            matches: |m| m.to_lowercase().contains("rate limit"),
            action: RecoveryAction::AutoRetry,
            max_retries: Some(5),
        },
        PatternRule {
            matches: |m| m.to_lowercase().contains("context") && m.to_lowercase().contains("exceed"),
            action: RecoveryAction::AutoCompact,
            max_retries: None,
        },
        PatternRule {
            matches: |m| {
                let lower = m.to_lowercase();
                lower.contains("unauthorized") || lower.contains("invalid api key")
            },
            action: RecoveryAction::OpenSettings,
            max_retries: None,
        },
        PatternRule {
            matches: |m| m.to_lowercase().contains("provider") && m.to_lowercase().contains("unavailable"),
            action: RecoveryAction::AutoSwitchProvider,
            max_retries: None,
        },
        PatternRule {
            matches: |m| {
                let lower = m.to_lowercase();
                lower.contains("timed out") || lower.contains("connection reset")
            },
            action: RecoveryAction::AutoRetry,
            max_retries: Some(3),
        },
    ]
});

fn select_action(message: &str) -> (RecoveryAction, Option<u32>) {
    PATTERN_TABLE
        .iter()
        .find(|rule| (rule.matches)(message))
        .map_or((RecoveryAction::NotifyOnly, None), |rule| (rule.action, rule.max_retries))
}

fn user_message(action: RecoveryAction, raw: &str) -> String {
    match action {
        RecoveryAction::AutoRetry => format!("Retrying after: {raw}"),
        RecoveryAction::AutoCompact => "Context grew too large; compacting and retrying.".to_string(),
        RecoveryAction::OpenSettings => "Credentials need attention; opening settings.".to_string(),
        RecoveryAction::AutoSwitchProvider => "Provider unavailable; switching to a backup.".to_string(),
        RecoveryAction::NotifyOnly => format!("Unrecoverable error: {raw}"),
    }
}

/// One per logical error source; tracks `auto_retry`'s per-error-code attempt
/// counter across calls.
#[derive(Default)]
pub struct RecoveryEngine {
    retry_counts: Mutex<HashMap<String, u32>>,
}

impl RecoveryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn handle_error(
        &self,
        error_code: &str,
        message: &str,
        ctx: Option<&dyn RecoveryContext>,
    ) -> crate::domain::models::ErrorRecoveryEvent {
        let (action, max_retries) = select_action(message);
        self.execute_action(action, error_code, message, ctx, max_retries).await
    }

    /// Runs a specific `RecoveryAction` directly, bypassing the pattern
    /// table. Used by `RecoveryLearner` to act on a learned override.
    pub async fn execute_action(
        &self,
        action: RecoveryAction,
        error_code: &str,
        message: &str,
        ctx: Option<&dyn RecoveryContext>,
        max_retries: Option<u32>,
    ) -> crate::domain::models::ErrorRecoveryEvent {
        let user_msg = user_message(action, message);
        let mut event = crate::domain::models::ErrorRecoveryEvent::new(action, user_msg, RecoveryStatus::Pending);
        event.max_retries = max_retries;

        match action {
            RecoveryAction::AutoRetry => {
                let attempt = self.next_attempt(error_code).await;
                event.attempt = attempt;
                if let Some(max) = max_retries {
                    if attempt > max {
                        event.status = RecoveryStatus::Failed;
                        return event;
                    }
                }
                let delay = Duration::from_secs(u64::from(attempt.saturating_sub(1)).saturating_mul(2).min(10));
                sleep(delay).await;
                match ctx {
                    Some(ctx) => match ctx.on_retry().await {
                        Ok(()) => event.status = RecoveryStatus::Succeeded,
                        Err(err) => {
                            info!(error = %err, "retry callback failed");
                            event.status = RecoveryStatus::Failed;
                        }
                    },
                    None => event.status = RecoveryStatus::Succeeded,
                }
            }
            RecoveryAction::AutoCompact => {
                if let Some(ctx) = ctx {
                    match ctx.on_compact().await {
                        Ok(()) => event.status = RecoveryStatus::Succeeded,
                        Err(_) => event.status = RecoveryStatus::Failed,
                    }
                } else {
                    event.status = RecoveryStatus::Succeeded;
                }
            }
            RecoveryAction::AutoSwitchProvider => {
                if let Some(ctx) = ctx {
                    match ctx.on_switch_provider().await {
                        Ok(()) => event.status = RecoveryStatus::Succeeded,
                        Err(_) => event.status = RecoveryStatus::Failed,
                    }
                } else {
                    event.status = RecoveryStatus::Succeeded;
                }
            }
            RecoveryAction::OpenSettings | RecoveryAction::NotifyOnly => {
                event.status = RecoveryStatus::Pending;
            }
        }

        event
    }

    async fn next_attempt(&self, error_code: &str) -> u32 {
        let mut counts = self.retry_counts.lock().await;
        let count = counts.entry(error_code.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub async fn reset_retry_counter(&self, error_code: &str) {
        self.retry_counts.lock().await.remove(error_code);
    }
}
