//! Policy-category check backed by the remote moderation classifier.

use crate::config::{PolicyMode, base_category};
use crate::traits::Check;
use crate::verdict::{CheckDiagnostics, CheckReport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use llm_client::ModerationClassifier;
use std::sync::Arc;

/// Blocks text the moderation classifier objects to.
///
/// ## Algorithm
/// 1. Classify the text
/// 2. Strict mode: block iff the result is flagged
/// 3. Allowlist mode: block iff some category marked true has a base name
///    (lowercased, before any `/`) in the configured set
pub struct PolicyCheck {
    classifier: Arc<dyn ModerationClassifier>,
    mode: PolicyMode,
}

impl PolicyCheck {
    pub const NAME: &'static str = "policy";

    pub fn new(classifier: Arc<dyn ModerationClassifier>, mode: PolicyMode) -> Self {
        Self { classifier, mode }
    }

    pub fn mode(&self) -> &PolicyMode {
        &self.mode
    }
}

#[async_trait]
impl Check for PolicyCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn evaluate(&self, text: &str) -> Result<CheckReport> {
        let result = self
            .classifier
            .classify(text)
            .await
            .with_context(|| format!("moderation call to {} failed", self.classifier.model_name()))?;

        let (blocked, matched_categories) = match &self.mode {
            PolicyMode::Strict => (
                result.flagged,
                result.flagged_categories().map(String::from).collect::<Vec<_>>(),
            ),
            PolicyMode::CategoryAllowlist(block) => {
                let matched: Vec<String> = result
                    .flagged_categories()
                    .filter(|name| block.contains(&base_category(name)))
                    .map(String::from)
                    .collect();
                (!matched.is_empty(), matched)
            }
        };

        Ok(CheckReport::new(
            Self::NAME,
            blocked,
            CheckDiagnostics::Policy {
                mode: self.mode.label().to_string(),
                flagged: result.flagged,
                categories: result.categories,
                category_scores: result.category_scores,
                matched_categories,
            },
        ))
    }
}
