//! Core traits for the moderation gate.
//!
//! This module defines the Check trait that allows composable moderation
//! checks to be chained in a ModerationGate.

use anyhow::Result;
use async_trait::async_trait;

use crate::verdict::CheckReport;

/// Core trait for moderation checks.
///
/// All checks must implement this trait to be used in the ModerationGate.
///
/// ## Design Note
/// - `Send + Sync` allows one gate to serve concurrent requests
/// - A check that cannot reach its classifier returns `Err`; it never
///   reports "allowed" for a call that did not happen
#[async_trait]
pub trait Check: Send + Sync {
    /// Returns the name of this check (for logging and diagnostics)
    fn name(&self) -> &str;

    /// Classify `text` and report whether it should be blocked.
    async fn evaluate(&self, text: &str) -> Result<CheckReport>;
}
