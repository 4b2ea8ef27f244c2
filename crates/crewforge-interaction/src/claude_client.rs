//! ClaudeCompletionClient - Direct REST API implementation for Claude.
//!
//! Calls the Claude messages API directly without CLI dependency and maps
//! responses into the engine's [`Completion`] contract.

use async_trait::async_trait;
use crewforge_core::completion::{Completion, CompletionClient, CompletionOptions, TokenUsage};
use crewforge_core::error::{CrewforgeError, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const BASE_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "anthropic";
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Completion client that talks to the Claude HTTP API.
#[derive(Clone)]
pub struct ClaudeCompletionClient {
    client: Client,
    api_key: String,
    model: String,
    system: Option<String>,
}

impl ClaudeCompletionClient {
    /// Creates a new client with the provided API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            system: None,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Reads `ANTHROPIC_API_KEY` (required) and `CLAUDE_MODEL_NAME`
    /// (defaults to `claude-sonnet-4-20250514`).
    pub fn try_from_env() -> Result<Self> {
        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| {
            CrewforgeError::generation("ANTHROPIC_API_KEY not found in environment variables")
        })?;

        let model = env::var("CLAUDE_MODEL_NAME").unwrap_or_else(|_| DEFAULT_CLAUDE_MODEL.into());
        Ok(Self::new(api_key, model))
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Adds a system prompt sent alongside every request.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    async fn send_request(&self, body: &CreateMessageRequest) -> Result<Completion> {
        let response = self
            .client
            .post(BASE_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| {
                CrewforgeError::generation(format!("Claude API request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Claude error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        let parsed: CreateMessageResponse = response.json().await.map_err(|err| {
            CrewforgeError::generation(format!("Failed to parse Claude response: {err}"))
        })?;

        extract_completion(parsed, &self.model)
    }
}

#[async_trait]
impl CompletionClient for ClaudeCompletionClient {
    async fn generate(&self, prompt: &str, options: CompletionOptions) -> Result<Completion> {
        if prompt.trim().is_empty() {
            return Err(CrewforgeError::generation(
                "Claude prompt must not be empty",
            ));
        }

        let request = CreateMessageRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: options.temperature,
            system: self.system.clone(),
        };

        tracing::debug!(
            target: "interaction",
            model = %self.model,
            agent_id = options.agent_id.as_deref().unwrap_or("-"),
            "Sending completion request"
        );

        self.send_request(&request).await
    }
}

#[derive(Serialize)]
struct CreateMessageRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlockResponse>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlockResponse {
    #[serde(rename = "text")]
    Text { text: String },
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    r#type: String,
    message: String,
}

fn extract_completion(response: CreateMessageResponse, model: &str) -> Result<Completion> {
    let content = response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlockResponse::Text { text } => Some(text),
        })
        .ok_or_else(|| {
            CrewforgeError::generation("Claude API returned no text in the response content")
        })?;

    Ok(Completion {
        content,
        tokens_used: TokenUsage {
            input: response.usage.input_tokens,
            output: response.usage.output_tokens,
            total: response.usage.input_tokens + response.usage.output_tokens,
        },
        provider: PROVIDER.to_string(),
        model: model.to_string(),
        finish_reason: response.stop_reason.unwrap_or_else(|| "unknown".to_string()),
    })
}

fn map_http_error(status: StatusCode, body: String) -> CrewforgeError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.clone());

    CrewforgeError::generation(format!("Claude API error {}: {}", status.as_u16(), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_completion_maps_usage() {
        let response = CreateMessageResponse {
            content: vec![ContentBlockResponse::Text {
                text: "Hello".to_string(),
            }],
            stop_reason: Some("end_turn".to_string()),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
            },
        };

        let completion = extract_completion(response, "claude-test").unwrap();
        assert_eq!(completion.content, "Hello");
        assert_eq!(completion.tokens_used.total, 15);
        assert_eq!(completion.provider, "anthropic");
        assert_eq!(completion.finish_reason, "end_turn");
    }

    #[test]
    fn test_extract_completion_empty_content_is_error() {
        let response = CreateMessageResponse {
            content: vec![],
            stop_reason: None,
            usage: Usage::default(),
        };
        let err = extract_completion(response, "claude-test").unwrap_err();
        assert!(err.is_generation());
    }

    #[test]
    fn test_map_http_error_extracts_api_message() {
        let body = r#"{"error": {"type": "overloaded_error", "message": "Overloaded"}}"#;
        let err = map_http_error(StatusCode::SERVICE_UNAVAILABLE, body.to_string());
        assert!(err.to_string().contains("Overloaded"));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_before_network() {
        let client = ClaudeCompletionClient::new("test-key", "claude-test");
        let err = client
            .generate("  ", CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_generation());
    }
}
