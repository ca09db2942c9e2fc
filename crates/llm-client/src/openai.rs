//! OpenAI-compatible HTTP client.
//!
//! One `reqwest::Client` is shared by the chat, embedding and moderation
//! endpoints. The client is cheap to clone and safe to share between
//! concurrent requests.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, ModerationResult, ToolCall, ToolChoice, ToolDefinition,
};
use crate::{ChatModel, EmbeddingProvider, LlmClientError, ModerationClassifier};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_MODERATION_MODEL: &str = "omni-moderation-latest";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub moderation_model: String,
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            moderation_model: DEFAULT_MODERATION_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Client for the chat, embedding and moderation endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Build a client from its configuration.
    ///
    /// No request is made here; an unreachable endpoint only shows up on the
    /// first call.
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmClientError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmClientError::MissingApiKey(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmClientError::ConnectionError(e.to_string()))?;

        info!(
            "Configured model client for {} (chat={}, embeddings={}, moderation={})",
            config.base_url, config.chat_model, config.embedding_model, config.moderation_model
        );
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// POST a JSON body and decode the JSON reply
    async fn post<Req, Resp>(&self, service: &str, path: &str, body: &Req) -> Result<Resp, LlmClientError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            error!("{} returned {}", service, status);
            return Err(LlmClientError::ServiceError {
                service: service.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        decode(service, &text)
    }
}

fn decode<T: DeserializeOwned>(service: &str, body: &str) -> Result<T, LlmClientError> {
    serde_json::from_str(body).map_err(|e| LlmClientError::InvalidResponse {
        service: service.to_string(),
        reason: e.to_string(),
    })
}

// =============================================================================
// Chat completions
// =============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "is_empty_slice")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

fn is_empty_slice<T>(items: &&[T]) -> bool {
    items.is_empty()
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

fn into_chat_response(response: ChatCompletionResponse) -> Result<ChatResponse, LlmClientError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmClientError::InvalidResponse {
            service: "chat".to_string(),
            reason: "no choices in completion".to_string(),
        })?;

    Ok(ChatResponse {
        content: choice.message.content,
        tool_calls: choice.message.tool_calls.unwrap_or_default(),
    })
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmClientError> {
        debug!(
            "Chat completion: {} messages, {} tools, temperature {}",
            request.messages.len(),
            request.tools.len(),
            request.temperature
        );
        let body = ChatCompletionRequest {
            model: &self.config.chat_model,
            messages: &request.messages,
            tools: &request.tools,
            tool_choice: request.tool_choice,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response: ChatCompletionResponse = self.post("chat", "chat/completions", &body).await?;
        into_chat_response(response)
    }

    fn model_name(&self) -> &str {
        &self.config.chat_model
    }
}

// =============================================================================
// Embeddings
// =============================================================================

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

fn into_embeddings(
    response: EmbeddingResponse,
    expected_len: usize,
) -> Result<Vec<Vec<f32>>, LlmClientError> {
    if response.data.len() != expected_len {
        error!(
            "Mismatch in number of embeddings returned: expected {}, got {}",
            expected_len,
            response.data.len()
        );
        return Err(LlmClientError::InvalidResponse {
            service: "embeddings".to_string(),
            reason: format!(
                "expected {} embeddings, got {}",
                expected_len,
                response.data.len()
            ),
        });
    }

    let mut data = response.data;
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmClientError> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| LlmClientError::InvalidResponse {
                service: "embeddings".to_string(),
                reason: "empty response".to_string(),
            })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmClientError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: texts,
        };
        let response: EmbeddingResponse = self.post("embeddings", "embeddings", &body).await?;
        into_embeddings(response, texts.len())
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}

// =============================================================================
// Moderation
// =============================================================================

#[derive(Debug, Serialize)]
struct ModerationRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<RawModerationResult>,
}

/// Categories arrive as loosely typed values (some providers send `null`)
#[derive(Debug, Deserialize)]
struct RawModerationResult {
    #[serde(default)]
    flagged: bool,
    #[serde(default)]
    categories: BTreeMap<String, Value>,
    #[serde(default)]
    category_scores: BTreeMap<String, Value>,
}

fn into_moderation_result(response: ModerationResponse) -> Result<ModerationResult, LlmClientError> {
    let raw = response
        .results
        .into_iter()
        .next()
        .ok_or_else(|| LlmClientError::InvalidResponse {
            service: "moderation".to_string(),
            reason: "no results".to_string(),
        })?;

    Ok(ModerationResult {
        flagged: raw.flagged,
        categories: raw
            .categories
            .into_iter()
            .map(|(name, value)| (name, value.as_bool().unwrap_or(false)))
            .collect(),
        category_scores: raw
            .category_scores
            .into_iter()
            .filter_map(|(name, value)| value.as_f64().map(|score| (name, score)))
            .collect(),
    })
}

#[async_trait]
impl ModerationClassifier for OpenAiClient {
    async fn classify(&self, text: &str) -> Result<ModerationResult, LlmClientError> {
        let body = ModerationRequest {
            model: &self.config.moderation_model,
            input: text,
        };
        let response: ModerationResponse = self.post("moderation", "moderations", &body).await?;
        into_moderation_result(response)
    }

    fn model_name(&self) -> &str {
        &self.config.moderation_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_requires_api_key() {
        let result = OpenAiClient::new(OpenAiConfig::default());
        assert!(matches!(result, Err(LlmClientError::MissingApiKey(_))));
    }

    #[test]
    fn test_client_construction() {
        let config = OpenAiConfig {
            api_key: "sk-test".to_string(),
            ..OpenAiConfig::default()
        };
        let client = OpenAiClient::new(config).expect("client should build");
        assert_eq!(ChatModel::model_name(&client), DEFAULT_CHAT_MODEL);
        assert_eq!(EmbeddingProvider::model_name(&client), DEFAULT_EMBEDDING_MODEL);
        assert_eq!(ModerationClassifier::model_name(&client), DEFAULT_MODERATION_MODEL);
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("q")];
        let tools = vec![ToolDefinition::function(
            "get_summary_by_title",
            "desc",
            json!({"type": "object"}),
        )];
        let body = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            tools: &tools,
            tool_choice: Some(ToolChoice::Auto),
            temperature: 0.5,
            max_tokens: None,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["tool_choice"], "auto");
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["messages"][1]["role"], "user");
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn test_chat_request_without_tools_omits_them() {
        let messages = vec![ChatMessage::user("q")];
        let body = ChatCompletionRequest {
            model: "m",
            messages: &messages,
            tools: &[],
            tool_choice: None,
            temperature: 0.4,
            max_tokens: Some(3),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("tool_choice").is_none());
        assert_eq!(value["max_tokens"], 3);
    }

    #[test]
    fn test_parse_tool_call_completion() {
        let body = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "get_summary_by_title",
                            "arguments": "{\"title\": \"The Hobbit\"}"
                        }
                    }]
                }
            }]
        })
        .to_string();

        let parsed: ChatCompletionResponse = decode("chat", &body).unwrap();
        let response = into_chat_response(parsed).unwrap();

        assert!(response.content.is_none());
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].id, "call_abc");
        assert_eq!(response.tool_calls[0].function.name, "get_summary_by_title");
    }

    #[test]
    fn test_parse_text_completion() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Îți recomand 1984.","tool_calls":null}}]}"#;
        let parsed: ChatCompletionResponse = decode("chat", body).unwrap();
        let response = into_chat_response(parsed).unwrap();

        assert_eq!(response.content.as_deref(), Some("Îți recomand 1984."));
        assert!(!response.has_tool_calls());
    }

    #[test]
    fn test_completion_without_choices_is_invalid() {
        let parsed: ChatCompletionResponse = decode("chat", r#"{"choices":[]}"#).unwrap();
        let err = into_chat_response(parsed).unwrap_err();
        assert!(matches!(err, LlmClientError::InvalidResponse { .. }));
    }

    #[test]
    fn test_malformed_body_is_invalid_response() {
        let err = decode::<ChatCompletionResponse>("chat", "<html>bad gateway</html>").unwrap_err();
        match err {
            LlmClientError::InvalidResponse { service, .. } => assert_eq!(service, "chat"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_embeddings_are_reordered_by_index() {
        let response = EmbeddingResponse {
            data: vec![
                EmbeddingData { index: 1, embedding: vec![0.0, 1.0] },
                EmbeddingData { index: 0, embedding: vec![1.0, 0.0] },
            ],
        };
        let vectors = into_embeddings(response, 2).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_embedding_count_mismatch() {
        let response = EmbeddingResponse {
            data: vec![EmbeddingData { index: 0, embedding: vec![1.0] }],
        };
        assert!(into_embeddings(response, 2).is_err());
    }

    #[test]
    fn test_parse_moderation_with_hierarchical_categories() {
        let body = json!({
            "id": "modr-1",
            "model": "omni-moderation-latest",
            "results": [{
                "flagged": true,
                "categories": {
                    "violence": true,
                    "violence/graphic": true,
                    "harassment": false,
                    "illicit/violent": null
                },
                "category_scores": {
                    "violence": 0.91,
                    "violence/graphic": 0.72,
                    "harassment": 0.01
                }
            }]
        })
        .to_string();

        let parsed: ModerationResponse = decode("moderation", &body).unwrap();
        let result = into_moderation_result(parsed).unwrap();

        assert!(result.flagged);
        assert_eq!(result.categories.get("violence/graphic"), Some(&true));
        assert_eq!(result.categories.get("illicit/violent"), Some(&false));
        assert_eq!(result.category_scores.get("violence"), Some(&0.91));
    }
}
