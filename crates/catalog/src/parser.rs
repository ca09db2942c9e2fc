//! Parser for catalog JSON files.
//!
//! Format: a JSON array of book records
//!
//! ```json
//! [
//!   { "id": "book_0", "title": "1984", "summary": "...", "full_summary": "..." },
//!   { "title": "The Hobbit", "summary": "..." }
//! ]
//! ```
//!
//! `id` is optional and defaults to `book_{index}`; `full_summary` is optional.

use crate::error::{CatalogError, Result};
use crate::types::CatalogEntry;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One record as it appears on disk
#[derive(Debug, Deserialize)]
struct BookRecord {
    #[serde(default)]
    id: Option<String>,
    title: String,
    summary: String,
    #[serde(default, alias = "fullSummary")]
    full_summary: Option<String>,
}

/// Id assigned to records that don't carry one
pub fn default_book_id(index: usize) -> String {
    format!("book_{}", index)
}

/// Parse catalog records from a JSON string.
///
/// `source` is only used for error messages (usually the file name).
/// Titles and summaries are trimmed; an empty title or summary is rejected.
pub fn parse_records(json: &str, source: &str) -> Result<Vec<CatalogEntry>> {
    let records: Vec<BookRecord> =
        serde_json::from_str(json).map_err(|e| CatalogError::ParseError {
            file: source.to_string(),
            reason: e.to_string(),
        })?;

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| to_entry(index, record))
        .collect()
}

/// Read and parse a catalog file
pub fn parse_file(path: &Path) -> Result<Vec<CatalogEntry>> {
    if !path.exists() {
        return Err(CatalogError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    parse_records(&content, &path.display().to_string())
}

fn to_entry(index: usize, record: BookRecord) -> Result<CatalogEntry> {
    let title = record.title.trim().to_string();
    if title.is_empty() {
        return Err(CatalogError::InvalidValue {
            field: "title".to_string(),
            index,
            value: record.title,
        });
    }

    let summary = record.summary.trim().to_string();
    if summary.is_empty() {
        return Err(CatalogError::InvalidValue {
            field: "summary".to_string(),
            index,
            value: record.summary,
        });
    }

    let id = match record.id {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => default_book_id(index),
    };

    // Blank long summaries count as missing
    let full_summary = record
        .full_summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(CatalogEntry {
        id,
        title,
        summary,
        full_summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_records_assigns_default_ids() {
        let json = r#"[
            {"title": "1984", "summary": "Distopie."},
            {"id": "custom", "title": "The Hobbit", "summary": "Aventura.", "full_summary": "Bilbo..."}
        ]"#;

        let entries = parse_records(json, "inline").unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "book_0");
        assert_eq!(entries[0].full_summary, None);
        assert_eq!(entries[1].id, "custom");
        assert_eq!(entries[1].full_summary.as_deref(), Some("Bilbo..."));
    }

    #[test]
    fn test_parse_records_accepts_camel_case_full_summary() {
        let json = r#"[{"title": "Moby Dick", "summary": "Ahab.", "fullSummary": "Balena albă."}]"#;
        let entries = parse_records(json, "inline").unwrap();
        assert_eq!(entries[0].full_summary.as_deref(), Some("Balena albă."));
    }

    #[test]
    fn test_parse_records_rejects_empty_title() {
        let json = r#"[{"title": "   ", "summary": "x"}]"#;
        let err = parse_records(json, "inline").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidValue { ref field, index: 0, .. } if field == "title"));
    }

    #[test]
    fn test_parse_records_rejects_malformed_json() {
        let err = parse_records("{not json", "broken.json").unwrap_err();
        match err {
            CatalogError::ParseError { file, .. } => assert_eq!(file, "broken.json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_file_missing() {
        let err = parse_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound { .. }));
    }

    #[test]
    fn test_parse_file_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"title": "Fahrenheit 451", "summary": "Cărți arse."}}]"#).unwrap();

        let entries = parse_file(file.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Fahrenheit 451");
    }
}
