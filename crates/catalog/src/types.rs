//! Core domain types for the book catalog.
//!
//! The catalog is populated once at start-up and read-only afterwards, so
//! everything here hands out references rather than owned values.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Type Aliases
// =============================================================================

/// Stable opaque identifier for a book (e.g. "book_0")
pub type BookId = String;

// =============================================================================
// Catalog Entry
// =============================================================================

/// A single book in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: BookId,
    /// Unique, case-sensitive title. The only key shared between retrieval
    /// output and the summary lookup.
    pub title: String,
    /// Short summary; this is the text that gets embedded.
    pub summary: String,
    /// Long summary returned verbatim by the lookup tool.
    pub full_summary: Option<String>,
}

impl CatalogEntry {
    pub fn new(id: impl Into<BookId>, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            summary: summary.into(),
            full_summary: None,
        }
    }

    /// Attach the long summary (builder style)
    pub fn with_full_summary(mut self, full_summary: impl Into<String>) -> Self {
        self.full_summary = Some(full_summary.into());
        self
    }
}

// =============================================================================
// Catalog - ordered, title-indexed collection
// =============================================================================

/// The book catalog.
///
/// Entries keep their insertion order (retrieval breaks distance ties by it)
/// and are additionally indexed by exact title.
#[derive(Debug, Default)]
pub struct Catalog {
    pub(crate) entries: Vec<CatalogEntry>,
    pub(crate) title_index: HashMap<String, usize>,
    pub(crate) id_index: HashMap<BookId, usize>,
}

impl Catalog {
    /// Creates a new, empty Catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Get an entry by its position in the catalog
    pub fn get(&self, position: usize) -> Option<&CatalogEntry> {
        self.entries.get(position)
    }

    /// Get an entry by exact (case-sensitive) title
    pub fn get_by_title(&self, title: &str) -> Option<&CatalogEntry> {
        self.title_index.get(title).map(|&i| &self.entries[i])
    }

    /// Get an entry by id
    pub fn get_by_id(&self, id: &str) -> Option<&CatalogEntry> {
        self.id_index.get(id).map(|&i| &self.entries[i])
    }

    /// Long summary for an exact title, if the catalog has one
    pub fn full_summary(&self, title: &str) -> Option<&str> {
        self.get_by_title(title)
            .and_then(|entry| entry.full_summary.as_deref())
    }

    /// Short summaries in insertion order (the texts to embed)
    pub fn summaries(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.summary.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
