//! Persistence port for learned solutions: two opaque calls, merge policy is
//! newer `last_updated` wins. The core must function with the null store.

use async_trait::async_trait;

use crate::domain::models::ErrorSolution;

#[async_trait]
pub trait SolutionStore: Send + Sync {
    async fn save(&self, entries: Vec<ErrorSolution>) -> anyhow::Result<()>;
    async fn load(&self) -> anyhow::Result<Vec<ErrorSolution>>;
}

/// No-op store: `save` discards, `load` returns nothing. Mirrors the
/// teacher's `null_memory`/`null_embedding` no-op adapters — the default so
/// the learning strategy works with no persistence wired in at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSolutionStore;

#[async_trait]
impl SolutionStore for NullSolutionStore {
    async fn save(&self, _entries: Vec<ErrorSolution>) -> anyhow::Result<()> {
        Ok(())
    }

    async fn load(&self) -> anyhow::Result<Vec<ErrorSolution>> {
        Ok(Vec::new())
    }
}
