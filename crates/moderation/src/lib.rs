//! Input moderation for librarian queries.
//!
//! This crate provides:
//! - Check trait and implementations (policy classifier, profanity classifier)
//! - ModerationGate for composing checks
//! - ModerationVerdict, the serializable decision plus diagnostics
//!
//! ## Architecture
//! Every query passes the gate before any retrieval or generation happens:
//! 1. PolicyCheck asks the moderation classifier and applies strict or
//!    category-allowlist rules
//! 2. ProfanityCheck asks the chat model for a one-word ALLOW/BLOCK verdict
//! 3. The first block wins; the user sees a fixed safe message
//!
//! ## Example Usage
//! ```ignore
//! use moderation::{ModerationConfig, ModerationGate};
//!
//! let gate = ModerationGate::from_config(&ModerationConfig::default(), classifier, chat);
//! let verdict = gate.moderate("Recomandă-mi o carte despre curaj").await?;
//! if verdict.blocked {
//!     println!("{}", verdict.message);
//! }
//! ```

pub mod checks;
pub mod config;
pub mod gate;
pub mod traits;
pub mod verdict;

// Re-export main types
pub use checks::{PolicyCheck, ProfanityCheck};
pub use config::{ModerationConfig, PolicyMode, parse_block_categories};
pub use gate::ModerationGate;
pub use traits::Check;
pub use verdict::{CheckDiagnostics, CheckReport, ModerationVerdict, SAFE_RESPONSE};
