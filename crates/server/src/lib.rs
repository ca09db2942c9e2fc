//! Server crate for the Smart Librarian.
//!
//! This crate contains the orchestrator that turns a reader's question into
//! one book recommendation, and the service that puts moderation in front
//! of it.

pub mod config;
pub mod orchestrator;
pub mod prompt;
pub mod resolve;
pub mod service;
pub mod state;
pub mod tool;

pub use config::{ConfigError, RecommenderConfig, Settings};
pub use orchestrator::RecommendationOrchestrator;
pub use service::{Librarian, LibrarianResponse, load_catalog};
pub use state::{RecommendationResult, Stage};
pub use tool::{LookupTool, SUMMARY_NOT_FOUND, TOOL_NAME};
