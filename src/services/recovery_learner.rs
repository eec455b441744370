//! Ties the fixed-rule `RecoveryEngine` to `LearningStrategy` so past
//! outcomes bias future recovery choices (§4.9 second half).

use std::sync::Arc;

use crate::domain::models::{ErrorRecoveryEvent, LearnedProvenance, RecoveryAction, RecoveryStatus, SolutionType};
use crate::services::error_classifier::ErrorClassifier;
use crate::services::learning_strategy::LearningStrategy;
use crate::services::recovery_engine::{RecoveryContext, RecoveryEngine};

/// Confidence at which a learned solution overrides the pattern table.
const LEARNED_ACTION_THRESHOLD: f64 = 0.6;

fn solution_to_action(solution_type: SolutionType) -> RecoveryAction {
    match solution_type {
        SolutionType::RetryWithDelay => RecoveryAction::AutoRetry,
        SolutionType::ToolSwitch => RecoveryAction::AutoSwitchProvider,
        SolutionType::Decomposition | SolutionType::ContextReduction => RecoveryAction::AutoCompact,
        SolutionType::Manual => RecoveryAction::NotifyOnly,
    }
}

fn action_to_solution(action: RecoveryAction) -> SolutionType {
    match action {
        RecoveryAction::AutoRetry => SolutionType::RetryWithDelay,
        RecoveryAction::AutoSwitchProvider => SolutionType::ToolSwitch,
        RecoveryAction::AutoCompact => SolutionType::ContextReduction,
        RecoveryAction::OpenSettings | RecoveryAction::NotifyOnly => SolutionType::Manual,
    }
}

/// Wraps `RecoveryEngine` with a learned-override step and feeds real
/// outcomes back into `LearningStrategy`.
pub struct RecoveryLearner {
    engine: RecoveryEngine,
    classifier: ErrorClassifier,
    learning: Arc<LearningStrategy>,
}

impl RecoveryLearner {
    pub fn new(learning: Arc<LearningStrategy>) -> Self {
        Self { engine: RecoveryEngine::new(), classifier: ErrorClassifier::new(), learning }
    }

    /// Classifies `message`, asks `LearningStrategy` for a suggestion, and
    /// either forces that suggestion's action (annotating the event with
    /// `LearnedProvenance`) or falls back to the engine's own pattern-table
    /// lookup. Either way the real outcome is fed back via `learn`.
    pub async fn handle_error(
        &self,
        error_code: &str,
        message: &str,
        ctx: Option<&dyn RecoveryContext>,
        tool_name: &str,
    ) -> ErrorRecoveryEvent {
        let classification = self.classifier.classify(message);
        let solution = self.learning.suggest_solution(tool_name, message, &classification).await;

        let event = if solution.confidence >= LEARNED_ACTION_THRESHOLD {
            let action = solution_to_action(solution.solution_type);
            let mut event = self
                .engine
                .execute_action(action, error_code, message, ctx, classification.max_retries)
                .await;
            event.provenance = Some(LearnedProvenance {
                learned_action: action,
                learned_confidence: solution.confidence,
                learned_source: solution.signature.clone(),
            });
            event
        } else {
            self.engine.handle_error(error_code, message, ctx).await
        };

        let success = event.status == RecoveryStatus::Succeeded;
        let solution_type = action_to_solution(event.action);
        self.learning
            .learn(tool_name, message, &classification.error_type, solution_type, &event.user_message, success)
            .await;

        event
    }

    pub async fn reset_retry_counter(&self, error_code: &str) {
        self.engine.reset_retry_counter(error_code).await;
    }
}
