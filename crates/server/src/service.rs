//! The librarian service: moderation in front of the recommendation pipeline.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use catalog::Catalog;
use llm_client::OpenAiClient;
use moderation::{ModerationGate, ModerationVerdict};
use retrieval::RetrievalIndex;

use crate::config::Settings;
use crate::orchestrator::RecommendationOrchestrator;
use crate::state::RecommendationResult;
use crate::tool::LookupTool;

/// What the caller gets back for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LibrarianResponse {
    /// Rejected by moderation; `message` is the fixed safe response
    Blocked {
        message: String,
        verdict: ModerationVerdict,
    },
    Recommendation(RecommendationResult),
}

impl LibrarianResponse {
    /// Text to show the user
    pub fn answer(&self) -> &str {
        match self {
            LibrarianResponse::Blocked { message, .. } => message,
            LibrarianResponse::Recommendation(result) => &result.answer,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, LibrarianResponse::Blocked { .. })
    }
}

/// Moderation gate plus orchestrator, shared across requests
pub struct Librarian {
    gate: ModerationGate,
    orchestrator: RecommendationOrchestrator,
}

impl Librarian {
    pub fn new(gate: ModerationGate, orchestrator: RecommendationOrchestrator) -> Self {
        Self { gate, orchestrator }
    }

    /// Wire the live OpenAI-backed services and build the index over `catalog`.
    pub async fn connect(settings: &Settings, catalog: Arc<Catalog>) -> Result<Self> {
        let client = Arc::new(
            OpenAiClient::new(settings.openai_config()?).context("Failed to create OpenAI client")?,
        );

        let index = RetrievalIndex::build(catalog.clone(), client.clone())
            .await
            .context("Failed to build retrieval index")?;
        info!(
            "Retrieval index ready ({} entries, model {})",
            index.len(),
            index.embedding_model()
        );

        let gate = ModerationGate::from_config(&settings.moderation, client.clone(), client.clone());
        let orchestrator = RecommendationOrchestrator::new(
            Arc::new(index),
            client,
            LookupTool::new(catalog),
            settings.recommender,
        );
        Ok(Self::new(gate, orchestrator))
    }

    pub fn gate(&self) -> &ModerationGate {
        &self.gate
    }

    pub fn orchestrator(&self) -> &RecommendationOrchestrator {
        &self.orchestrator
    }

    /// Moderate `query`, then recommend if it passes.
    pub async fn handle(&self, query: &str) -> Result<LibrarianResponse> {
        let verdict = self
            .gate
            .moderate(query)
            .await
            .context("Moderation failed")?;

        if verdict.blocked {
            return Ok(LibrarianResponse::Blocked {
                message: verdict.message.clone(),
                verdict,
            });
        }

        let result = self.orchestrator.recommend(query).await?;
        Ok(LibrarianResponse::Recommendation(result))
    }
}

/// Catalog from `path`, or the bundled one when no path is given
pub fn load_catalog(path: Option<&Path>) -> Result<Arc<Catalog>> {
    let catalog = match path {
        Some(path) => Catalog::load_from_file(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display()))?,
        None => Catalog::builtin().context("Failed to load bundled catalog")?,
    };
    Ok(Arc::new(catalog))
}
