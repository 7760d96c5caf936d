//! Idea Repository Trait
//!
//! Storage seam for the `ideas` collection. Implementations perform no access
//! control; the idea store evaluates the policy before calling them.
//!
//! Writes are compare-and-swap on `version`: a write only lands if the stored
//! version still equals the snapshot the policy decision was made against.

use crate::domain::entities::idea::{Idea, IdeaFilter};
use crate::domain::errors::RepositoryResult;
use async_trait::async_trait;

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// Insert: id already taken. Replace/delete: stored version moved on or
    /// the document vanished.
    Rejected,
}

#[async_trait]
pub trait IdeaRepository: Send + Sync {
    async fn get(&self, id: &str) -> RepositoryResult<Option<Idea>>;

    /// All documents matching `filter`, most recently updated first.
    async fn query(&self, filter: &IdeaFilter) -> RepositoryResult<Vec<Idea>>;

    /// Insert a new document unless the id is already taken.
    async fn insert(&self, idea: &Idea) -> RepositoryResult<WriteOutcome>;

    /// Replace the document if its stored version equals `expected_version`.
    async fn replace(&self, idea: &Idea, expected_version: u64) -> RepositoryResult<WriteOutcome>;

    /// Delete the document if its stored version equals `expected_version`.
    async fn delete(&self, id: &str, expected_version: u64) -> RepositoryResult<WriteOutcome>;

    /// Unconditional write used by platform tooling (seeding).
    async fn upsert(&self, idea: &Idea) -> RepositoryResult<()>;
}
