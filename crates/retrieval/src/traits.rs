//! Core trait for candidate retrieval.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Candidate;

/// Produces ranked candidates for a free-text query.
///
/// ## Design Note
/// - `Send + Sync` so one index can serve concurrent requests behind an `Arc`
/// - Implementations are read-only; searching never mutates the index
#[async_trait]
pub trait CandidateRetriever: Send + Sync {
    /// Return up to `top_k` candidates ordered by ascending distance.
    ///
    /// An empty index (or nothing within range) yields an empty vector, not
    /// an error. Errors are reserved for failures of the embedding service.
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<Candidate>>;
}
