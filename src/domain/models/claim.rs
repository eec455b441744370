//! Optimistic-concurrency task pool models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Available,
    Claimed { agent_id: String, expires_at: DateTime<Utc> },
    Completed,
}

/// A unit of work published into the `TaskClaimService`'s shared pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimableTask {
    pub id: String,
    pub description: String,
    /// Lower = higher priority.
    pub priority: i32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub status: ClaimStatus,
}

impl ClaimableTask {
    pub fn new(id: impl Into<String>, description: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            priority,
            tags: Vec::new(),
            created_at: Utc::now(),
            status: ClaimStatus::Available,
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_available(&self) -> bool {
        matches!(self.status, ClaimStatus::Available)
    }

    pub fn claimed_by(&self) -> Option<&str> {
        match &self.status {
            ClaimStatus::Claimed { agent_id, .. } => Some(agent_id.as_str()),
            _ => None,
        }
    }
}
