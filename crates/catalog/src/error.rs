//! Error types for the catalog crate.

use thiserror::Error;

/// Errors that can occur while loading or validating the book catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file could not be found
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading the catalog file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Catalog file is not valid JSON or doesn't match the record shape
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// A record field had an invalid value (e.g. an empty title)
    #[error("Invalid value for {field} in record {index}: {value:?}")]
    InvalidValue {
        field: String,
        index: usize,
        value: String,
    },

    /// Two records share the same title
    ///
    /// Titles are the only key linking retrieval output to the summary
    /// lookup, so they must be unique.
    #[error("Duplicate title {title:?} (records {first} and {second})")]
    DuplicateTitle {
        title: String,
        first: usize,
        second: usize,
    },

    /// Two records share the same id
    #[error("Duplicate id {id:?}")]
    DuplicateId { id: String },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
