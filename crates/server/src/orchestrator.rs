//! # Recommendation Orchestrator
//!
//! Drives one query through the recommendation pipeline:
//! 1. Retrieve candidates from the index
//! 2. Round 1: ask the chat model to pick one book, exposing the lookup tool
//! 3. Run any lookup calls locally and feed the results back
//! 4. Round 2: ask for the final answer over the extended dialogue
//! 5. Resolve which title was recommended
//!
//! Each step is a transition between [`Stage`]s, so the pipeline can be
//! driven one step at a time with deterministic stand-ins.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use llm_client::{ChatMessage, ChatModel, ChatRequest, ToolCall, ToolChoice};
use retrieval::{Candidate, CandidateRetriever};

use crate::config::RecommenderConfig;
use crate::prompt::{self, EMPTY_ANSWER_PLACEHOLDER, SYSTEM_PROMPT};
use crate::resolve::resolve_title;
use crate::state::{RecommendationResult, Stage};
use crate::tool::{LookupTool, TOOL_NAME};

/// Coordinates retrieval, the two chat rounds and the lookup tool
#[derive(Clone)]
pub struct RecommendationOrchestrator {
    retriever: Arc<dyn CandidateRetriever>,
    chat: Arc<dyn ChatModel>,
    tool: LookupTool,
    config: RecommenderConfig,
}

impl RecommendationOrchestrator {
    pub fn new(
        retriever: Arc<dyn CandidateRetriever>,
        chat: Arc<dyn ChatModel>,
        tool: LookupTool,
        config: RecommenderConfig,
    ) -> Self {
        Self {
            retriever,
            chat,
            tool,
            config,
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn retriever(&self) -> &Arc<dyn CandidateRetriever> {
        &self.retriever
    }

    pub fn tool(&self) -> &LookupTool {
        &self.tool
    }

    /// Main entry point: run `query` through every stage until a terminal one.
    ///
    /// Any chat or retrieval failure aborts the whole call; nothing is retried.
    pub async fn recommend(&self, query: &str) -> Result<RecommendationResult> {
        let start_time = Instant::now();
        debug!("Recommending for query: {:?}", query);

        let mut stage = Stage::Retrieving;
        while !stage.is_terminal() {
            let from = stage.name();
            stage = self.step(query, stage).await?;
            info!("Stage transition: {} -> {}", from, stage.name());
        }

        let result = stage
            .into_result()
            .context("Pipeline stopped on a non-terminal stage")?;

        info!(
            "Recommendation finished in {:.2?} (candidates: {}, title: {:?})",
            start_time.elapsed(),
            result.candidates.len(),
            result.recommended_title
        );
        Ok(result)
    }

    /// Advance one stage.
    ///
    /// Terminal stages have no successor and are rejected.
    pub async fn step(&self, query: &str, stage: Stage) -> Result<Stage> {
        match stage {
            Stage::Retrieving => self.retrieve(query).await,

            Stage::Round1 { candidates } => self.round1(query, candidates).await,

            Stage::ToolInvoked {
                candidates,
                dialogue,
                content,
                calls,
            } => Ok(self.execute_tools(candidates, dialogue, content, calls)),

            Stage::ToolExecuted {
                candidates,
                dialogue,
                recommended_title,
                full_summary,
            } => Ok(Stage::Round2 {
                candidates,
                dialogue,
                recommended_title,
                full_summary,
            }),

            Stage::Round2 {
                candidates,
                dialogue,
                recommended_title,
                full_summary,
            } => {
                self.round2(candidates, dialogue, recommended_title, full_summary)
                    .await
            }

            Stage::NoTool { candidates, answer } => {
                let recommended_title = resolve_title(&answer, &candidates);
                Ok(Stage::Resolved(RecommendationResult {
                    answer,
                    candidates,
                    full_summary: None,
                    recommended_title,
                }))
            }

            terminal @ (Stage::NoResults | Stage::Resolved(_)) => {
                bail!("Stage {} is terminal", terminal.name())
            }
        }
    }

    async fn retrieve(&self, query: &str) -> Result<Stage> {
        let candidates = self
            .retriever
            .search(query, self.config.top_k)
            .await
            .context("Failed to retrieve candidates")?;

        info!("Retrieved {} candidates", candidates.len());
        if candidates.is_empty() {
            return Ok(Stage::NoResults);
        }
        Ok(Stage::Round1 { candidates })
    }

    async fn round1(&self, query: &str, candidates: Vec<Candidate>) -> Result<Stage> {
        let dialogue = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(prompt::user_turn(query, &candidates)),
        ];

        let request = ChatRequest::new(dialogue.clone(), self.config.round1_temperature)
            .with_tools(vec![LookupTool::definition()], ToolChoice::Auto);

        let response = self
            .chat
            .complete(request)
            .await
            .context("Round 1 chat completion failed")?;

        if response.has_tool_calls() {
            info!("Model requested {} tool call(s)", response.tool_calls.len());
            return Ok(Stage::ToolInvoked {
                candidates,
                dialogue,
                content: response.content.unwrap_or_default(),
                calls: response.tool_calls,
            });
        }

        let answer = match response.trimmed_content() {
            "" => EMPTY_ANSWER_PLACEHOLDER.to_string(),
            text => text.to_string(),
        };
        Ok(Stage::NoTool { candidates, answer })
    }

    /// Run lookup calls and extend the dialogue.
    ///
    /// The first call with a non-empty title decides the recommended title and
    /// summary. If none has one, the summary is the first call's result.
    fn execute_tools(
        &self,
        candidates: Vec<Candidate>,
        mut dialogue: Vec<ChatMessage>,
        content: String,
        calls: Vec<ToolCall>,
    ) -> Stage {
        let lookups: Vec<ToolCall> = calls
            .into_iter()
            .filter(|call| {
                if call.function.name == TOOL_NAME {
                    true
                } else {
                    warn!("Skipping call to unknown tool {:?}", call.function.name);
                    false
                }
            })
            .collect();

        let mut results = Vec::with_capacity(lookups.len());
        let mut recommended: Option<(String, String)> = None;
        let mut first_result: Option<String> = None;

        for call in &lookups {
            let title = LookupTool::parse_title(&call.function.arguments);
            let summary = self.tool.lookup(&title);
            info!("Lookup tool called with title {:?}", title);

            if first_result.is_none() {
                first_result = Some(summary.clone());
            }
            if recommended.is_none() && !title.is_empty() {
                recommended = Some((title, summary.clone()));
            }
            results.push(ChatMessage::tool_result(call, summary));
        }

        let (recommended_title, full_summary) = match recommended {
            Some((title, summary)) => (Some(title), Some(summary)),
            None => (None, first_result),
        };

        // The model turn is echoed only alongside lookup calls
        if !lookups.is_empty() {
            dialogue.push(ChatMessage::assistant(content, lookups));
            dialogue.extend(results);
        }

        Stage::ToolExecuted {
            candidates,
            dialogue,
            recommended_title,
            full_summary,
        }
    }

    async fn round2(
        &self,
        candidates: Vec<Candidate>,
        dialogue: Vec<ChatMessage>,
        recommended_title: Option<String>,
        full_summary: Option<String>,
    ) -> Result<Stage> {
        let request = ChatRequest::new(dialogue, self.config.round2_temperature);
        let response = self
            .chat
            .complete(request)
            .await
            .context("Round 2 chat completion failed")?;

        let Some(content) = response.content.as_deref() else {
            bail!("Round 2 chat completion returned no content");
        };
        let answer = content.trim().to_string();

        let recommended_title =
            recommended_title.or_else(|| resolve_title(&answer, &candidates));

        Ok(Stage::Resolved(RecommendationResult {
            answer,
            candidates,
            full_summary,
            recommended_title,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::NO_RESULTS_ANSWER;
    use crate::tool::SUMMARY_NOT_FOUND;
    use async_trait::async_trait;
    use catalog::{Catalog, CatalogEntry};
    use llm_client::{ChatResponse, LlmClientError};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ============================================================================
    // Test Fixtures
    // ============================================================================

    /// Returns canned responses in order and records every request
    struct ScriptedChat {
        responses: Mutex<VecDeque<ChatResponse>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedChat {
        fn new(responses: Vec<ChatResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmClientError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmClientError::ConnectionError("script exhausted".into()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    struct StubRetriever {
        candidates: Vec<Candidate>,
        calls: AtomicUsize,
    }

    impl StubRetriever {
        fn new(candidates: Vec<Candidate>) -> Arc<Self> {
            Arc::new(Self {
                candidates,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CandidateRetriever for StubRetriever {
        async fn search(&self, _query: &str, top_k: usize) -> Result<Vec<Candidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.candidates.iter().take(top_k).cloned().collect())
        }
    }

    fn test_catalog() -> Arc<Catalog> {
        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new("book_0", "1984", "Supraveghere și control.")
                .with_full_summary("Winston Smith lucrează la Ministerul Adevărului."),
            CatalogEntry::new("book_1", "The Hobbit", "Prietenie și curaj.")
                .with_full_summary("Bilbo Baggins pleacă spre Muntele Singuratic."),
            CatalogEntry::new("book_2", "Emma", "Austen.")
                .with_full_summary("Emma Woodhouse face pe pețitoarea."),
        ])
        .unwrap();
        Arc::new(catalog)
    }

    fn candidates() -> Vec<Candidate> {
        test_catalog()
            .entries()
            .iter()
            .enumerate()
            .map(|(i, e)| Candidate::from_entry(e, 0.1 * (i + 1) as f32))
            .collect()
    }

    fn orchestrator(
        retriever: Arc<StubRetriever>,
        chat: Arc<ScriptedChat>,
    ) -> RecommendationOrchestrator {
        RecommendationOrchestrator::new(
            retriever,
            chat,
            LookupTool::new(test_catalog()),
            RecommenderConfig::default(),
        )
    }

    fn lookup_call(id: &str, arguments: &str) -> ToolCall {
        ToolCall::function(id, TOOL_NAME, arguments)
    }

    // ============================================================================
    // Tests
    // ============================================================================

    #[tokio::test]
    async fn test_empty_retrieval_makes_no_chat_calls() {
        let chat = ScriptedChat::new(vec![]);
        let orch = orchestrator(StubRetriever::new(vec![]), chat.clone());

        let result = orch.recommend("ceva").await.unwrap();

        assert_eq!(result.answer, NO_RESULTS_ANSWER);
        assert!(result.candidates.is_empty());
        assert_eq!(result.full_summary, None);
        assert_eq!(result.recommended_title, None);
        assert!(chat.requests().is_empty());
    }

    #[tokio::test]
    async fn test_tool_call_fetches_full_summary() {
        let chat = ScriptedChat::new(vec![
            ChatResponse::with_tool_calls(None, vec![lookup_call("call_1", r#"{"title":"1984"}"#)]),
            ChatResponse::text("  Îți recomand 1984.  "),
        ]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat.clone());

        let result = orch.recommend("o distopie").await.unwrap();

        assert_eq!(result.answer, "Îți recomand 1984.");
        assert_eq!(result.recommended_title.as_deref(), Some("1984"));
        assert_eq!(
            result.full_summary.as_deref(),
            Some("Winston Smith lucrează la Ministerul Adevărului.")
        );
        assert_eq!(result.candidates.len(), 3);

        let requests = chat.requests();
        assert_eq!(requests.len(), 2);

        let round1 = &requests[0];
        assert_eq!(round1.temperature, 0.5);
        assert_eq!(round1.tool_choice, Some(ToolChoice::Auto));
        assert_eq!(round1.tools, vec![LookupTool::definition()]);
        assert_eq!(round1.messages.len(), 2);

        let round2 = &requests[1];
        assert_eq!(round2.temperature, 0.4);
        assert!(round2.tools.is_empty());
        assert_eq!(round2.tool_choice, None);
        assert_eq!(round2.messages.len(), 4);
        assert_eq!(
            round2.messages[2],
            ChatMessage::assistant("", vec![lookup_call("call_1", r#"{"title":"1984"}"#)])
        );
        match &round2.messages[3] {
            ChatMessage::Tool {
                tool_call_id,
                content,
                ..
            } => {
                assert_eq!(tool_call_id, "call_1");
                assert_eq!(content, "Winston Smith lucrează la Ministerul Adevărului.");
            }
            other => panic!("expected tool result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_title_yields_sentinel() {
        let chat = ScriptedChat::new(vec![
            ChatResponse::with_tool_calls(None, vec![lookup_call("c", r#"{"title":"Dune"}"#)]),
            ChatResponse::text("Dune nu e în colecție, dar Emma e o alegere bună."),
        ]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat);

        let result = orch.recommend("sf").await.unwrap();

        assert_eq!(result.full_summary.as_deref(), Some(SUMMARY_NOT_FOUND));
        assert_eq!(result.recommended_title.as_deref(), Some("Dune"));
    }

    #[tokio::test]
    async fn test_malformed_arguments_resolve_title_from_answer() {
        let chat = ScriptedChat::new(vec![
            ChatResponse::with_tool_calls(None, vec![lookup_call("c", "{title:")]),
            ChatResponse::text("Recomand The Hobbit pentru curaj."),
        ]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat);

        let result = orch.recommend("curaj").await.unwrap();

        assert_eq!(result.full_summary.as_deref(), Some(SUMMARY_NOT_FOUND));
        assert_eq!(result.recommended_title.as_deref(), Some("The Hobbit"));
    }

    #[tokio::test]
    async fn test_first_usable_title_wins() {
        let chat = ScriptedChat::new(vec![
            ChatResponse::with_tool_calls(
                Some("Caut rezumatele.".into()),
                vec![
                    lookup_call("a", "{}"),
                    lookup_call("b", r#"{"title":"Emma"}"#),
                    lookup_call("c", r#"{"title":"1984"}"#),
                ],
            ),
            ChatResponse::text("Emma."),
        ]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat.clone());

        let result = orch.recommend("romantic").await.unwrap();

        assert_eq!(result.recommended_title.as_deref(), Some("Emma"));
        assert_eq!(
            result.full_summary.as_deref(),
            Some("Emma Woodhouse face pe pețitoarea.")
        );
        // assistant turn plus one result per call
        assert_eq!(chat.requests()[1].messages.len(), 2 + 1 + 3);
    }

    #[tokio::test]
    async fn test_unknown_tools_are_skipped() {
        let chat = ScriptedChat::new(vec![
            ChatResponse::with_tool_calls(
                None,
                vec![ToolCall::function("x", "get_weather", r#"{"city":"Cluj"}"#)],
            ),
            ChatResponse::text("Recomand Emma."),
        ]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat.clone());

        let result = orch.recommend("ceva").await.unwrap();

        assert_eq!(result.full_summary, None);
        assert_eq!(result.recommended_title.as_deref(), Some("Emma"));
        let round2 = &chat.requests()[1];
        assert_eq!(round2.messages.len(), 2);
        assert!(
            round2
                .messages
                .iter()
                .all(|m| !matches!(m, ChatMessage::Assistant { .. }))
        );
    }

    #[tokio::test]
    async fn test_no_tool_branch() {
        let chat = ScriptedChat::new(vec![ChatResponse::text(
            "\nÎți recomand the hobbit, o poveste despre curaj.\n",
        )]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat.clone());

        let result = orch.recommend("curaj").await.unwrap();

        assert_eq!(result.answer, "Îți recomand the hobbit, o poveste despre curaj.");
        assert_eq!(result.full_summary, None);
        assert_eq!(result.recommended_title.as_deref(), Some("The Hobbit"));
        assert_eq!(chat.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_round1_uses_placeholder() {
        let chat = ScriptedChat::new(vec![ChatResponse::default()]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat);

        let result = orch.recommend("orice").await.unwrap();

        assert_eq!(result.answer, EMPTY_ANSWER_PLACEHOLDER);
        assert_eq!(result.recommended_title.as_deref(), Some("1984"));
    }

    #[tokio::test]
    async fn test_top_k_is_passed_to_retrieval() {
        let chat = ScriptedChat::new(vec![ChatResponse::text("1984")]);
        let retriever = StubRetriever::new(candidates());
        let orch = RecommendationOrchestrator::new(
            retriever.clone(),
            chat,
            LookupTool::new(test_catalog()),
            RecommenderConfig::default().with_top_k(1),
        );

        let result = orch.recommend("x").await.unwrap();
        assert_eq!(result.candidates.len(), 1);
        assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_chat_failure_aborts() {
        let chat = ScriptedChat::new(vec![]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat);

        let err = orch.recommend("x").await.unwrap_err();
        assert!(err.to_string().contains("Round 1"));
    }

    #[tokio::test]
    async fn test_round2_without_content_is_an_error() {
        let chat = ScriptedChat::new(vec![
            ChatResponse::with_tool_calls(None, vec![lookup_call("c", r#"{"title":"1984"}"#)]),
            ChatResponse::default(),
        ]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat);

        assert!(orch.recommend("x").await.is_err());
    }

    #[tokio::test]
    async fn test_deterministic_for_same_query() {
        let script = || {
            vec![
                ChatResponse::with_tool_calls(None, vec![lookup_call("c", r#"{"title":"Emma"}"#)]),
                ChatResponse::text("Emma."),
            ]
        };
        let first = orchestrator(StubRetriever::new(candidates()), ScriptedChat::new(script()))
            .recommend("q")
            .await
            .unwrap();
        let second = orchestrator(StubRetriever::new(candidates()), ScriptedChat::new(script()))
            .recommend("q")
            .await
            .unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_step_walks_tool_branch() {
        let chat = ScriptedChat::new(vec![
            ChatResponse::with_tool_calls(None, vec![lookup_call("c", r#"{"title":"1984"}"#)]),
            ChatResponse::text("1984."),
        ]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat);

        let mut stage = Stage::Retrieving;
        let mut names = vec![stage.name()];
        while !stage.is_terminal() {
            stage = orch.step("q", stage).await.unwrap();
            names.push(stage.name());
        }

        assert_eq!(
            names,
            vec![
                "RETRIEVING",
                "ROUND1",
                "TOOL_INVOKED",
                "TOOL_EXECUTED",
                "ROUND2",
                "RESOLVED"
            ]
        );
        assert!(orch.step("q", stage).await.is_err());
    }

    #[tokio::test]
    async fn test_step_walks_no_tool_branch() {
        let chat = ScriptedChat::new(vec![ChatResponse::text("Emma.")]);
        let orch = orchestrator(StubRetriever::new(candidates()), chat);

        let stage = orch.step("q", Stage::Retrieving).await.unwrap();
        let stage = orch.step("q", stage).await.unwrap();
        assert_eq!(stage.name(), "NO_TOOL");
        let stage = orch.step("q", stage).await.unwrap();
        assert_eq!(stage.name(), "RESOLVED");
    }
}
