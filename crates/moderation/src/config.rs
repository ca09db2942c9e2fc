//! Moderation settings.

use std::collections::BTreeSet;

/// How the policy check turns a classifier result into a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyMode {
    /// Block whenever the classifier flags the text
    Strict,
    /// Block only when a flagged category's base name is listed.
    /// An empty list never blocks.
    CategoryAllowlist(BTreeSet<String>),
}

impl PolicyMode {
    /// Allowlist mode with names trimmed and lowercased
    pub fn allowlist<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        PolicyMode::CategoryAllowlist(
            categories
                .into_iter()
                .map(|c| c.as_ref().trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            PolicyMode::Strict => "strict",
            PolicyMode::CategoryAllowlist(_) => "category_allowlist",
        }
    }
}

/// Toggles for the two moderation checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationConfig {
    /// Block on any flag from the policy classifier
    pub strict: bool,
    /// Lowercased base category names; consulted only when `strict` is off
    pub block_categories: BTreeSet<String>,
    /// Run the profanity classifier
    pub profanity_enabled: bool,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            strict: true,
            block_categories: BTreeSet::new(),
            profanity_enabled: true,
        }
    }
}

impl ModerationConfig {
    pub fn policy_mode(&self) -> PolicyMode {
        if self.strict {
            PolicyMode::Strict
        } else {
            PolicyMode::allowlist(&self.block_categories)
        }
    }
}

/// Parse a comma-separated category list such as `"Hate, violence,"`.
///
/// Entries are trimmed and lowercased; empty entries are dropped.
pub fn parse_block_categories(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Base name of a classifier category: the part before the first `/`, lowercased.
///
/// `"violence/graphic"` becomes `"violence"`.
pub fn base_category(name: &str) -> String {
    name.split('/').next().unwrap_or(name).trim().to_lowercase()
}
