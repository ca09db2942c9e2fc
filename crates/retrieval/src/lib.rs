//! # Retrieval Crate
//!
//! Semantic retrieval over the book catalog: the first stage of every
//! recommendation, producing the shortlist the language model chooses from.
//!
//! ## Components
//!
//! - **index**: `RetrievalIndex`, an in-memory vector index built by
//!   embedding every catalog summary once at start-up
//! - **distance**: cosine distance and parallel ranking
//! - **hashing**: `HashingEmbedder`, a deterministic offline embedding
//!   provider
//! - **traits**: `CandidateRetriever`, the seam the orchestrator depends on
//!
//! ## Example Usage
//!
//! ```ignore
//! use retrieval::{CandidateRetriever, RetrievalIndex};
//! use std::sync::Arc;
//!
//! let index = RetrievalIndex::build(catalog.clone(), embedder.clone()).await?;
//! let candidates = index.search("o carte despre prietenie și curaj", 3).await?;
//! for c in &candidates {
//!     println!("{} ({:.3})", c.title, c.score);
//! }
//! ```

pub mod distance;
pub mod hashing;
pub mod index;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use hashing::HashingEmbedder;
pub use index::RetrievalIndex;
pub use traits::CandidateRetriever;
pub use types::Candidate;
