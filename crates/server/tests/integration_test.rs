//! Integration tests for the librarian.
//!
//! These tests run the real catalog, retrieval index and moderation gate
//! with deterministic stand-ins for the remote models.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use catalog::Catalog;
use llm_client::{
    ChatMessage, ChatModel, ChatRequest, ChatResponse, LlmClientError, ModerationClassifier,
    ModerationResult, ToolCall,
};
use moderation::{ModerationConfig, ModerationGate, SAFE_RESPONSE};
use retrieval::{HashingEmbedder, RetrievalIndex};
use server::{
    Librarian, LibrarianResponse, LookupTool, RecommendationOrchestrator, RecommenderConfig,
    TOOL_NAME,
};

// =============================================================================
// Test Fixtures
// =============================================================================

/// Plays the librarian model:
/// - profanity prompts get ALLOW, or BLOCK when the text contains "idiot"
/// - round 1 looks up The Hobbit when it is among the candidates
/// - round 2 echoes the looked-up title
struct LibrarianChat {
    requests: Mutex<Vec<ChatRequest>>,
}

impl LibrarianChat {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }

    fn recorded(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn user_text(request: &ChatRequest) -> &str {
    request
        .messages
        .iter()
        .find_map(|m| match m {
            ChatMessage::User { content } => Some(content.as_str()),
            _ => None,
        })
        .unwrap_or("")
}

#[async_trait]
impl ChatModel for LibrarianChat {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmClientError> {
        self.requests.lock().unwrap().push(request.clone());

        if request.max_tokens == Some(3) {
            let verdict = if user_text(&request).contains("idiot") {
                "BLOCK"
            } else {
                "ALLOW"
            };
            return Ok(ChatResponse::text(verdict));
        }

        if !request.tools.is_empty() {
            if user_text(&request).contains("The Hobbit") {
                return Ok(ChatResponse::with_tool_calls(
                    None,
                    vec![ToolCall::function(
                        "call_hobbit",
                        TOOL_NAME,
                        r#"{"title": "The Hobbit"}"#,
                    )],
                ));
            }
            return Ok(ChatResponse::text("Nu am o preferință clară."));
        }

        Ok(ChatResponse::text(
            "Îți recomand The Hobbit: o călătorie despre prietenie și curaj.",
        ))
    }

    fn model_name(&self) -> &str {
        "librarian-stand-in"
    }
}

struct CleanClassifier;

#[async_trait]
impl ModerationClassifier for CleanClassifier {
    async fn classify(&self, _text: &str) -> Result<ModerationResult, LlmClientError> {
        Ok(ModerationResult::default())
    }

    fn model_name(&self) -> &str {
        "clean"
    }
}

async fn build_librarian(chat: Arc<LibrarianChat>) -> Librarian {
    let catalog = Arc::new(Catalog::builtin().unwrap());
    let index = RetrievalIndex::build(catalog.clone(), Arc::new(HashingEmbedder::new(512)))
        .await
        .unwrap();

    let gate = ModerationGate::from_config(
        &ModerationConfig::default(),
        Arc::new(CleanClassifier),
        chat.clone(),
    );
    let orchestrator = RecommendationOrchestrator::new(
        Arc::new(index),
        chat,
        LookupTool::new(catalog),
        RecommenderConfig::default(),
    );
    Librarian::new(gate, orchestrator)
}

const HOBBIT_QUERY: &str = "o carte despre prietenie și curaj";

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_hobbit_is_retrieved_in_top_three() {
    let librarian = build_librarian(LibrarianChat::new()).await;

    let candidates = librarian
        .orchestrator()
        .retriever()
        .search(HOBBIT_QUERY, 3)
        .await
        .unwrap();

    assert!(candidates.len() <= 3);
    assert!(candidates.iter().any(|c| c.title == "The Hobbit"));
}

#[tokio::test]
async fn test_friendship_and_courage_scenario() {
    let chat = LibrarianChat::new();
    let librarian = build_librarian(chat.clone()).await;

    let response = librarian.handle(HOBBIT_QUERY).await.unwrap();

    let result = match response {
        LibrarianResponse::Recommendation(result) => result,
        other => panic!("unexpected response: {other:?}"),
    };
    assert_eq!(result.recommended_title.as_deref(), Some("The Hobbit"));
    let summary = result.full_summary.unwrap();
    assert!(summary.contains("Bilbo"));
    assert!(result.candidates.iter().any(|c| c.title == "The Hobbit"));

    // profanity check, round 1, round 2
    let requests = chat.recorded();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[1].tools.len(), 1);
    assert!(requests[2].tools.is_empty());
}

#[tokio::test]
async fn test_blocked_query_never_reaches_pipeline() {
    let chat = LibrarianChat::new();
    let librarian = build_librarian(chat.clone()).await;

    let response = librarian
        .handle("recomandă-mi ceva, idiot")
        .await
        .unwrap();

    assert!(response.is_blocked());
    assert_eq!(response.answer(), SAFE_RESPONSE);
    // only the profanity classifier ran
    assert_eq!(chat.recorded().len(), 1);
}

#[tokio::test]
async fn test_same_query_same_title() {
    let first = build_librarian(LibrarianChat::new())
        .await
        .handle(HOBBIT_QUERY)
        .await
        .unwrap();
    let second = build_librarian(LibrarianChat::new())
        .await
        .handle(HOBBIT_QUERY)
        .await
        .unwrap();

    assert_eq!(first, second);
}
