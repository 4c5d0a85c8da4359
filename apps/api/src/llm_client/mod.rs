//! LLM Client — the single point of entry for all model calls in SmartMatch.
//!
//! ARCHITECTURAL RULE: No other module may call the provider API directly.
//! Everything goes through the `ChatModel` trait so the pipeline can be driven
//! by a scripted model in tests.
//!
//! One outbound request per call. No retries here; retry policy belongs to callers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;

pub mod prompts;

use prompts::{JSON_ONLY_SYSTEM, TEXT_SYSTEM};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// The underlying reason a model call did not produce usable output.
#[derive(Debug, Error)]
pub enum CallFailure {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("malformed JSON in model reply: {source}")]
    MalformedJson {
        raw: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model call failed: {0}")]
    ModelCallFailed(#[from] CallFailure),

    #[error("could not recover JSON from model reply: {0}")]
    ResponseParseFailed(String),
}

/// What the caller expects back. Selects the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    Text,
    Json,
}

impl ResponseShape {
    fn system_prompt(self) -> &'static str {
        match self {
            ResponseShape::Text => TEXT_SYSTEM,
            ResponseShape::Json => JSON_ONLY_SYSTEM,
        }
    }
}

/// A chat-completion backend. `LlmClient` is the production implementation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Issues one completion request and returns the raw text of the reply.
    async fn complete(&self, prompt: &str, shape: ResponseShape) -> Result<String, LlmError>;

    /// Calls the model asking for JSON and strict-parses the reply.
    /// A reply that is not valid JSON is `ModelCallFailed(MalformedJson)` and
    /// keeps the raw text so callers can attempt their own repair.
    async fn complete_json(&self, prompt: &str) -> Result<Value, LlmError> {
        let raw = self.complete(prompt, ResponseShape::Json).await?;
        let text = strip_json_fences(&raw);
        match serde_json::from_str(text) {
            Ok(value) => Ok(value),
            Err(source) => Err(CallFailure::MalformedJson { raw, source }.into()),
        }
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first non-empty text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .find(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// HTTP client for the Anthropic Messages API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(config: &AnalysisConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(config.call_timeout)
            .build()
            .map_err(CallFailure::Http)?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model_name.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: config.call_timeout,
        })
    }

    /// Makes a raw call to the provider, returning the full response object.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("LLM API returned {}: {}", status, message);
            return Err(CallFailure::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let llm_response: LlmResponse = response.json().await.map_err(|e| self.classify(e))?;

        if let Some(usage) = &llm_response.usage {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        Ok(llm_response)
    }

    fn classify(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            CallFailure::Timeout(self.timeout).into()
        } else {
            CallFailure::Http(err).into()
        }
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, shape: ResponseShape) -> Result<String, LlmError> {
        let response = self.call(prompt, shape.system_prompt()).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or_else(|| CallFailure::EmptyContent.into())
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Scripted model for tests. Routes on prompt content: keyword prompts are
/// answered per document, everything else gets the match reply.
#[cfg(test)]
pub mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::analysis::prompts::{JOB_CONTEXT, RESUME_CONTEXT};

    #[derive(Debug, Clone)]
    pub enum Reply {
        Text(String),
        Status(u16),
    }

    impl Reply {
        pub fn text(s: &str) -> Self {
            Reply::Text(s.to_string())
        }

        fn resolve(&self) -> Result<String, LlmError> {
            match self {
                Reply::Text(t) => Ok(t.clone()),
                Reply::Status(status) => Err(CallFailure::Api {
                    status: *status,
                    message: "scripted failure".to_string(),
                }
                .into()),
            }
        }
    }

    pub struct ScriptedModel {
        pub resume_keywords: Reply,
        pub job_keywords: Reply,
        pub match_reply: Reply,
        pub calls: AtomicUsize,
    }

    impl ScriptedModel {
        pub fn new(resume_keywords: Reply, job_keywords: Reply, match_reply: Reply) -> Self {
            Self {
                resume_keywords,
                job_keywords,
                match_reply,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted-model"
        }

        async fn complete(&self, prompt: &str, shape: ResponseShape) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match shape {
                ResponseShape::Json => self.match_reply.resolve(),
                ResponseShape::Text if prompt.contains(&format!("{RESUME_CONTEXT}:")) => {
                    self.resume_keywords.resolve()
                }
                ResponseShape::Text if prompt.contains(&format!("{JOB_CONTEXT}:")) => {
                    self.job_keywords.resolve()
                }
                ResponseShape::Text => self.match_reply.resolve(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::json;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_response_text_skips_empty_blocks() {
        let response: LlmResponse = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "  "},
                {"type": "text", "text": "python, sql"}
            ]
        }))
        .unwrap();
        assert_eq!(response.text(), Some("python, sql"));
    }

    async fn spawn_provider(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1/messages")
    }

    fn client_for(api_url: String) -> LlmClient {
        LlmClient::new(&AnalysisConfig {
            api_key: "test-key".to_string(),
            api_url,
            call_timeout: Duration::from_secs(5),
            ..AnalysisConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_complete_returns_first_text_block() {
        let router = Router::new().route(
            "/v1/messages",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "claude-sonnet-4-5");
                assert_eq!(body["messages"][0]["role"], "user");
                Json(json!({
                    "content": [{"type": "text", "text": "Python, Django"}],
                    "usage": {"input_tokens": 10, "output_tokens": 3}
                }))
            }),
        );
        let client = client_for(spawn_provider(router).await);

        let text = client.complete("prompt", ResponseShape::Text).await.unwrap();
        assert_eq!(text, "Python, Django");
    }

    #[tokio::test]
    async fn test_server_error_is_model_call_failed_with_provider_message() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": {"message": "overloaded"}})),
                )
            }),
        );
        let client = client_for(spawn_provider(router).await);

        let err = client.complete("prompt", ResponseShape::Text).await.unwrap_err();
        match err {
            LlmError::ModelCallFailed(CallFailure::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_json_keeps_raw_text_on_malformed_reply() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async {
                Json(json!({
                    "content": [{"type": "text", "text": "Sure! {\"match_percentage\": 70}"}]
                }))
            }),
        );
        let client = client_for(spawn_provider(router).await);

        let err = client.complete_json("prompt").await.unwrap_err();
        match err {
            LlmError::ModelCallFailed(CallFailure::MalformedJson { raw, .. }) => {
                assert!(raw.starts_with("Sure!"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_json_parses_fenced_reply() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async {
                Json(json!({
                    "content": [{"type": "text", "text": "```json\n{\"match_percentage\": 70}\n```"}]
                }))
            }),
        );
        let client = client_for(spawn_provider(router).await);

        let value = client.complete_json("prompt").await.unwrap();
        assert_eq!(value["match_percentage"], 70);
    }

    #[tokio::test]
    async fn test_missing_text_block_is_empty_content() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async { Json(json!({"content": []})) }),
        );
        let client = client_for(spawn_provider(router).await);

        let err = client.complete("prompt", ResponseShape::Text).await.unwrap_err();
        assert!(matches!(
            err,
            LlmError::ModelCallFailed(CallFailure::EmptyContent)
        ));
    }

    #[tokio::test]
    async fn test_slow_provider_is_timeout() {
        let router = Router::new().route(
            "/v1/messages",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!({"content": [{"type": "text", "text": "too late"}]}))
            }),
        );
        let client = LlmClient::new(&AnalysisConfig {
            api_key: "test-key".to_string(),
            api_url: spawn_provider(router).await,
            call_timeout: Duration::from_secs(1),
            ..AnalysisConfig::default()
        })
        .unwrap();

        let err = client.complete("prompt", ResponseShape::Text).await.unwrap_err();
        match err {
            LlmError::ModelCallFailed(CallFailure::Timeout(after)) => {
                assert_eq!(after, Duration::from_secs(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_model_call_failed() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{addr}/v1/messages"));

        let err = client.complete("prompt", ResponseShape::Text).await.unwrap_err();
        assert!(matches!(err, LlmError::ModelCallFailed(_)));
    }
}
