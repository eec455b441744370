//! Resource lock model: `{resource -> (owner, acquiredAt)}`.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ResourceLock {
    pub owner: String,
    pub acquired_at: DateTime<Utc>,
}

impl ResourceLock {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            acquired_at: Utc::now(),
        }
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.acquired_at
    }

    pub fn is_stale(&self, timeout: chrono::Duration) -> bool {
        self.age() > timeout
    }
}
