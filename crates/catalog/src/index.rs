//! Catalog building and validation.
//!
//! Builds the title and id indices over parsed records and enforces the
//! uniqueness rules the rest of the system relies on.

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::types::*;
use std::path::Path;
use tracing::info;

/// Catalog bundled with the crate (the twelve books of the original corpus)
const BUILTIN_CATALOG: &str = include_str!("../data/books.json");

impl Catalog {
    /// Load a catalog from a JSON file.
    ///
    /// Steps:
    /// 1. Parse the records
    /// 2. Insert them in file order, building the title and id indices
    /// 3. Fail on duplicate titles or ids
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading book catalog from {:?}", path);
        let entries = parser::parse_file(path)?;
        let catalog = Self::from_entries(entries)?;
        info!("Loaded {} books", catalog.len());
        Ok(catalog)
    }

    /// The catalog shipped with the crate
    pub fn builtin() -> Result<Self> {
        let entries = parser::parse_records(BUILTIN_CATALOG, "builtin catalog")?;
        Self::from_entries(entries)
    }

    /// Build a catalog from already-parsed entries, keeping their order
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>) -> Result<Self> {
        let mut catalog = Catalog::new();
        for entry in entries {
            catalog.insert_entry(entry)?;
        }
        Ok(catalog)
    }

    /// Append an entry and update the indices.
    ///
    /// Titles are compared exactly (case-sensitive), matching the lookup tool.
    /// A blank title is rejected.
    pub fn insert_entry(&mut self, entry: CatalogEntry) -> Result<()> {
        let position = self.entries.len();

        if entry.title.trim().is_empty() {
            return Err(CatalogError::InvalidValue {
                field: "title".to_string(),
                index: position,
                value: entry.title,
            });
        }

        if let Some(&first) = self.title_index.get(&entry.title) {
            return Err(CatalogError::DuplicateTitle {
                title: entry.title,
                first,
                second: position,
            });
        }
        if self.id_index.contains_key(&entry.id) {
            return Err(CatalogError::DuplicateId { id: entry.id });
        }

        self.title_index.insert(entry.title.clone(), position);
        self.id_index.insert(entry.id.clone(), position);
        self.entries.push(entry);
        Ok(())
    }

    /// Number of entries that carry a long summary
    pub fn full_summary_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.full_summary.is_some())
            .count()
    }
}
