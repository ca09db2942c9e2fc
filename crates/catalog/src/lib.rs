//! # Catalog Crate
//!
//! Loads and indexes the fixed book corpus the librarian recommends from.
//!
//! ## Main Components
//!
//! - **types**: `CatalogEntry` and the title-indexed `Catalog`
//! - **parser**: Parse the JSON catalog format
//! - **index**: Build and validate the catalog (unique titles and ids)
//! - **error**: Error types for catalog loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::Catalog;
//! use std::path::Path;
//!
//! let catalog = Catalog::load_from_file(Path::new("data/books.json"))?;
//! let hobbit = catalog.get_by_title("The Hobbit").unwrap();
//! println!("{}: {}", hobbit.id, hobbit.summary);
//! ```

pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use types::{BookId, Catalog, CatalogEntry};
