//! Types produced by retrieval.

use catalog::{BookId, CatalogEntry};
use serde::{Deserialize, Serialize};

/// A catalog entry surfaced for one query.
///
/// `score` is a distance: lower means closer to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: BookId,
    pub title: String,
    pub summary: String,
    pub score: f32,
}

impl Candidate {
    pub fn new(
        id: impl Into<BookId>,
        title: impl Into<String>,
        summary: impl Into<String>,
        score: f32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: summary.into(),
            score,
        }
    }

    /// Build a candidate from a catalog entry and its distance to the query
    pub fn from_entry(entry: &CatalogEntry, score: f32) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            summary: entry.summary.clone(),
            score,
        }
    }
}
