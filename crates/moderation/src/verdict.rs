//! Moderation verdict schema.
//!
//! Diagnostics are explicit, serializable records. Category names come from
//! the remote classifier and are kept as an open map.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bumped whenever the serialized shape of [`ModerationVerdict`] changes
pub const VERDICT_SCHEMA_VERSION: u32 = 1;

/// Message shown to the user whenever any check blocks.
///
/// Fixed text: the blocked query is never echoed back.
pub const SAFE_RESPONSE: &str = "Îți mulțumesc! Din motive de siguranță, nu pot procesa întrebarea exact așa cum a fost formulată. \
Te rog reformulează fără termeni ofensatori sau conținut nepotrivit. \
Exemplu: «Te rog recomandă-mi o carte despre prietenie și curaj.»";

/// Raw classifier output recorded by one check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckDiagnostics {
    Policy {
        /// "strict" or "category_allowlist"
        mode: String,
        flagged: bool,
        categories: BTreeMap<String, bool>,
        category_scores: BTreeMap<String, f64>,
        /// Flagged categories that caused (or would cause) a block
        matched_categories: Vec<String>,
    },
    Profanity {
        /// Classifier output, trimmed and upper-cased
        verdict: String,
    },
    /// The check is disabled by configuration
    Skipped,
}

/// Outcome of a single check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    pub check: String,
    pub blocked: bool,
    pub diagnostics: CheckDiagnostics,
}

impl CheckReport {
    pub fn new(check: impl Into<String>, blocked: bool, diagnostics: CheckDiagnostics) -> Self {
        Self {
            check: check.into(),
            blocked,
            diagnostics,
        }
    }

    pub fn skipped(check: impl Into<String>) -> Self {
        Self::new(check, false, CheckDiagnostics::Skipped)
    }
}

/// Result of running text through the moderation gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub schema_version: u32,
    pub blocked: bool,
    /// [`SAFE_RESPONSE`] when blocked, empty otherwise
    pub message: String,
    /// Name of the check that blocked, if any
    pub fired_by: Option<String>,
    /// Reports of the checks that ran, in order
    pub reports: Vec<CheckReport>,
}

impl ModerationVerdict {
    pub fn allowed(reports: Vec<CheckReport>) -> Self {
        Self {
            schema_version: VERDICT_SCHEMA_VERSION,
            blocked: false,
            message: String::new(),
            fired_by: None,
            reports,
        }
    }

    pub fn blocked(fired_by: impl Into<String>, reports: Vec<CheckReport>) -> Self {
        Self {
            schema_version: VERDICT_SCHEMA_VERSION,
            blocked: true,
            message: SAFE_RESPONSE.to_string(),
            fired_by: Some(fired_by.into()),
            reports,
        }
    }

    /// Report of the named check, if it ran
    pub fn report(&self, check: &str) -> Option<&CheckReport> {
        self.reports.iter().find(|r| r.check == check)
    }
}
