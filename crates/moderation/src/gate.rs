//! The ModerationGate runs checks in order and stops at the first block.
//!
//! This module provides the main ModerationGate struct that chains
//! multiple checks together using the builder pattern.

use crate::checks::{PolicyCheck, ProfanityCheck};
use crate::config::ModerationConfig;
use crate::traits::Check;
use crate::verdict::ModerationVerdict;
use anyhow::Result;
use llm_client::{ChatModel, ModerationClassifier};
use std::sync::Arc;

/// Chains moderation checks into a single allow/block decision.
///
/// ## Usage
/// ```ignore
/// let gate = ModerationGate::new()
///     .add_check(PolicyCheck::new(classifier, PolicyMode::Strict))
///     .add_check(ProfanityCheck::new(chat, true));
///
/// let verdict = gate.moderate(&query).await?;
/// ```
pub struct ModerationGate {
    checks: Vec<Box<dyn Check>>,
}

impl ModerationGate {
    /// Create a new empty ModerationGate (allows everything).
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// The standard gate: policy classifier first, then profanity.
    pub fn from_config(
        config: &ModerationConfig,
        classifier: Arc<dyn ModerationClassifier>,
        chat: Arc<dyn ChatModel>,
    ) -> Self {
        Self::new()
            .add_check(PolicyCheck::new(classifier, config.policy_mode()))
            .add_check(ProfanityCheck::new(chat, config.profanity_enabled))
    }

    /// Add a check to the gate (builder pattern).
    pub fn add_check(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Names of the configured checks, in run order
    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Run the checks in sequence.
    ///
    /// ## Algorithm
    /// 1. For each check in order, evaluate the text and record its report
    /// 2. On the first block, return a blocked verdict; later checks never run
    /// 3. Otherwise return an allowed verdict with an empty message
    ///
    /// # Returns
    /// * `Ok(ModerationVerdict)` - The decision plus per-check diagnostics
    /// * `Err` - If a classifier call fails; the text is neither allowed nor blocked
    pub async fn moderate(&self, text: &str) -> Result<ModerationVerdict> {
        let mut reports = Vec::with_capacity(self.checks.len());

        for check in &self.checks {
            tracing::debug!("Running moderation check: {}", check.name());
            let report = check.evaluate(text).await?;
            tracing::debug!(
                "Moderation check finished: {} (blocked: {})",
                check.name(),
                report.blocked
            );

            let blocked = report.blocked;
            reports.push(report);
            if blocked {
                tracing::info!("Query blocked by {} check", check.name());
                return Ok(ModerationVerdict::blocked(check.name(), reports));
            }
        }

        Ok(ModerationVerdict::allowed(reports))
    }
}

impl Default for ModerationGate {
    fn default() -> Self {
        Self::new()
    }
}
