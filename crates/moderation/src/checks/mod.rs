//! Check implementations for the moderation gate.
//!
//! Checks run in the order they are added to a ModerationGate; the first
//! one that blocks stops the chain.

pub mod policy;
pub mod profanity;

// Re-export for convenience
pub use policy::PolicyCheck;
pub use profanity::ProfanityCheck;
