//! Profanity check backed by the chat model used as a one-word classifier.

use crate::traits::Check;
use crate::verdict::{CheckDiagnostics, CheckReport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use llm_client::{ChatMessage, ChatModel, ChatRequest};
use std::sync::Arc;

/// Instruction given to the classifier model
pub const PROFANITY_PROMPT: &str = "You are a strict profanity detector for user queries to a book-recommendation assistant. \
If the text contains clear profanity, slurs, or vulgar language (any language), respond exactly 'BLOCK'. \
If it is acceptable (even if critical but not profane), respond exactly 'ALLOW'. \
No explanation. Only one token: ALLOW or BLOCK.";

/// Classifier output that blocks; anything else allows
pub const BLOCK_TOKEN: &str = "BLOCK";

const CLASSIFIER_TEMPERATURE: f32 = 0.0;
const CLASSIFIER_MAX_TOKENS: u32 = 3;

/// Asks the chat model for a single ALLOW/BLOCK word.
///
/// When disabled the check reports `Skipped` without calling the model.
pub struct ProfanityCheck {
    chat: Arc<dyn ChatModel>,
    enabled: bool,
}

impl ProfanityCheck {
    pub const NAME: &'static str = "profanity";

    pub fn new(chat: Arc<dyn ChatModel>, enabled: bool) -> Self {
        Self { chat, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[async_trait]
impl Check for ProfanityCheck {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn evaluate(&self, text: &str) -> Result<CheckReport> {
        if !self.enabled {
            return Ok(CheckReport::skipped(Self::NAME));
        }

        let request = ChatRequest::new(
            vec![ChatMessage::system(PROFANITY_PROMPT), ChatMessage::user(text)],
            CLASSIFIER_TEMPERATURE,
        )
        .with_max_tokens(CLASSIFIER_MAX_TOKENS);

        let response = self
            .chat
            .complete(request)
            .await
            .with_context(|| format!("profanity classification with {} failed", self.chat.model_name()))?;

        let verdict = response.trimmed_content().to_uppercase();
        let blocked = verdict == BLOCK_TOKEN;

        Ok(CheckReport::new(
            Self::NAME,
            blocked,
            CheckDiagnostics::Profanity { verdict },
        ))
    }
}
