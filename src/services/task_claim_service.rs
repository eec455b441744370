//! Shared task pool for optimistic-claim swarm execution (§4.6.6).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::models::{ClaimStatus, ClaimableTask};

const CLAIM_EXPIRY: i64 = 300; // 5 minutes, per §4.6.6.

#[derive(Default)]
pub struct TaskClaimService {
    tasks: Arc<RwLock<HashMap<String, ClaimableTask>>>,
}

impl TaskClaimService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publish(&self, tasks: Vec<ClaimableTask>) {
        let mut store = self.tasks.write().await;
        for task in tasks {
            store.insert(task.id.clone(), task);
        }
    }

    /// Returns expired claims to `available`. Called before every claim
    /// attempt, and separately on a periodic cleanup tick.
    pub async fn sweep_expired(&self) {
        let now = Utc::now();
        let mut store = self.tasks.write().await;
        for task in store.values_mut() {
            if let ClaimStatus::Claimed { expires_at, .. } = task.status {
                if expires_at <= now {
                    task.status = ClaimStatus::Available;
                }
            }
        }
    }

    /// Selects the highest-priority available task, preferring one whose
    /// tags intersect `prefer_tags`, and claims it for `agent_id`.
    pub async fn claim_next(&self, agent_id: &str, prefer_tags: &[String]) -> Option<ClaimableTask> {
        self.sweep_expired().await;

        let mut store = self.tasks.write().await;
        let candidate_id = {
            let mut candidates: Vec<&ClaimableTask> = store.values().filter(|t| t.is_available()).collect();
            if candidates.is_empty() {
                return None;
            }
            candidates.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.created_at.cmp(&b.created_at)));

            if !prefer_tags.is_empty() {
                if let Some(tagged) = candidates
                    .iter()
                    .find(|t| t.tags.iter().any(|tag| prefer_tags.contains(tag)))
                {
                    tagged.id.clone()
                } else {
                    candidates[0].id.clone()
                }
            } else {
                candidates[0].id.clone()
            }
        };

        let task = store.get_mut(&candidate_id)?;
        task.status = ClaimStatus::Claimed {
            agent_id: agent_id.to_string(),
            expires_at: Utc::now() + ChronoDuration::seconds(CLAIM_EXPIRY),
        };
        Some(task.clone())
    }

    pub async fn complete(&self, task_id: &str, agent_id: &str) -> bool {
        let mut store = self.tasks.write().await;
        match store.get_mut(task_id) {
            Some(task) if task.claimed_by() == Some(agent_id) => {
                task.status = ClaimStatus::Completed;
                true
            }
            _ => false,
        }
    }

    /// Marks the claim done (not retried): the pool has no separate "failed"
    /// state, and retrying a claimed task is the swarm-level recovery path's
    /// job, not this pool's. Leaving it `Claimed` forever would keep
    /// `isAllDone` from ever returning true, so a failure settles the claim.
    pub async fn fail(&self, task_id: &str, agent_id: &str, error: &str) -> bool {
        let mut store = self.tasks.write().await;
        match store.get_mut(task_id) {
            Some(task) if task.claimed_by() == Some(agent_id) => {
                warn!(task_id, agent_id, error, "claimed task failed");
                task.status = ClaimStatus::Completed;
                true
            }
            _ => false,
        }
    }

    pub async fn is_all_done(&self) -> bool {
        let store = self.tasks.read().await;
        store
            .values()
            .all(|t| matches!(t.status, ClaimStatus::Completed))
    }
}
