//! The `AgentExecutor` port: the one capability this core needs from the
//! (out of scope) worker implementation.

use async_trait::async_trait;

use crate::domain::models::{AgentConfig, AgentReport};

/// Outcome of one `AgentExecutor::execute` call.
#[derive(Debug, Clone)]
pub struct ExecutorOutcome {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
    pub iterations: u32,
}

/// A single-method capability, expressed as a trait object rather than a
/// class hierarchy: dynamic dispatch over `Arc<dyn AgentExecutor>`.
///
/// Contract: invoked at most once per runtime; `on_report` may be called any
/// number of times; an `Err` return is treated as `failed`, same as a thrown
/// exception in the source.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(
        &self,
        config: &AgentConfig,
        on_report: &(dyn Fn(AgentReport) + Send + Sync),
    ) -> anyhow::Result<ExecutorOutcome>;
}
