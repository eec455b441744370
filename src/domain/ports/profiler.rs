//! Optional pluggable profiler the router consults for `core` decisions.

use async_trait::async_trait;

use crate::domain::models::{CoreRole, TaskType};

/// A learned recommendation for which core role handles a given task type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilerRecommendation {
    pub role: CoreRole,
    pub wilson_score: f64,
    pub executions: u32,
}

/// Pluggable source of historical role recommendations. If absent or it
/// returns `None`, the router falls back to a static task-type -> role map.
#[async_trait]
pub trait Profiler: Send + Sync {
    async fn recommend(&self, task_type: TaskType) -> Option<ProfilerRecommendation>;
}
