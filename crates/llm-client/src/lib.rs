//! Clients for the remote language-model services.
//!
//! This crate provides the three network-backed collaborators the librarian
//! needs, each behind a trait so the pipeline can be exercised with
//! deterministic stand-ins:
//! - [`ChatModel`] - chat completions with optional tool calling
//! - [`EmbeddingProvider`] - text embeddings for retrieval
//! - [`ModerationClassifier`] - policy-category moderation
//!
//! [`OpenAiClient`] implements all three against an OpenAI-compatible HTTP
//! API. Calls are never retried here; failures surface as
//! [`LlmClientError`] and it is up to the caller to decide what to do.

use async_trait::async_trait;
use thiserror::Error;

pub mod openai;
pub mod types;

pub use openai::{OpenAiClient, OpenAiConfig};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, FunctionCall, FunctionDefinition, ModerationResult,
    ToolCall, ToolChoice, ToolDefinition,
};

/// Errors that can occur when talking to the model services
#[derive(Error, Debug)]
pub enum LlmClientError {
    #[error("Failed to build HTTP client: {0}")]
    ConnectionError(String),

    #[error("Missing API key for {0}")]
    MissingApiKey(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    ServiceError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {service}: {reason}")]
    InvalidResponse { service: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Chat-completion service with optional tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion over the given dialogue.
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmClientError>;

    /// Model identifier (for logging)
    fn model_name(&self) -> &str;
}

/// Trait for embedding providers that convert text to vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmClientError>;

    /// Generate embeddings for a batch of texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmClientError>;

    /// Return the model name.
    fn model_name(&self) -> &str;
}

/// Policy-category moderation classifier.
#[async_trait]
pub trait ModerationClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ModerationResult, LlmClientError>;

    fn model_name(&self) -> &str;
}
