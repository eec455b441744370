//! Cooperative, best-effort resource locking between concurrently running
//! agents (§4.5).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use tokio::sync::RwLock;
use tracing::warn;

use crate::domain::errors::LockError;
use crate::domain::models::ResourceLock;

/// Holds the current map of `resource -> ResourceLock`.
///
/// Re-acquiring a lock you already hold is *not* special-cased: it still goes
/// through the staleness check like any other acquisition attempt, exactly as
/// the source specifies.
#[derive(Default)]
pub struct ResourceLockManager {
    locks: Arc<RwLock<HashMap<String, ResourceLock>>>,
}

impl ResourceLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, resource: &str, agent_id: &str, timeout: ChronoDuration) -> Result<(), LockError> {
        let mut locks = self.locks.write().await;
        match locks.get(resource) {
            None => {
                locks.insert(resource.to_string(), ResourceLock::new(agent_id));
                Ok(())
            }
            Some(existing) if existing.is_stale(timeout) => {
                warn!(resource, previous_owner = %existing.owner, "forcibly releasing stale lock");
                locks.insert(resource.to_string(), ResourceLock::new(agent_id));
                Ok(())
            }
            Some(_) => Err(LockError::Held {
                resource: resource.to_string(),
            }),
        }
    }

    pub async fn release(&self, resource: &str, agent_id: &str) -> Result<(), LockError> {
        let mut locks = self.locks.write().await;
        match locks.get(resource) {
            Some(lock) if lock.owner == agent_id => {
                locks.remove(resource);
                Ok(())
            }
            Some(_) => Err(LockError::NotOwner {
                resource: resource.to_string(),
                agent_id: agent_id.to_string(),
            }),
            None => Err(LockError::NotOwner {
                resource: resource.to_string(),
                agent_id: agent_id.to_string(),
            }),
        }
    }

    /// Releases every lock owned by `agent_id`, silently. Invoked
    /// unconditionally when a runtime reaches a terminal state.
    pub async fn release_all(&self, agent_id: &str) {
        let mut locks = self.locks.write().await;
        locks.retain(|_, lock| lock.owner != agent_id);
    }

    pub async fn held_count(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Clears every held lock. Invoked alongside the coordinator's reset at
    /// the start of every `SwarmScheduler::execute`.
    pub async fn reset(&self) {
        self.locks.write().await.clear();
    }
}
