//! OpenAI-compatible reasoning engine.
//!
//! Works with any endpoint exposing `/chat/completions`: OpenRouter, OpenAI,
//! Ollama, vLLM, Together AI. One `HttpEngine` value holds one model session:
//! the wire-format message history lives behind a mutex and grows with every
//! `send`, so the backend sees the full conversation each call. Callers
//! serialize `send` per session, matching the session contract.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use verdant_core::engine::{EngineMessage, EngineReply, ReasoningEngine};
use verdant_core::error::EngineError;
use verdant_core::tool::{ToolCall, ToolDefinition};

/// Configuration for the HTTP engine.
#[derive(Clone)]
pub struct HttpEngineConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: std::time::Duration,
}

/// An OpenAI-compatible reasoning engine holding one chat session.
pub struct HttpEngine {
    config: HttpEngineConfig,
    client: reqwest::Client,
    tools: Vec<ToolDefinition>,
    history: Mutex<Vec<serde_json::Value>>,
}

impl HttpEngine {
    /// Create a new engine session. `system_prompt` becomes the first
    /// message of the session; `tools` are advertised on every request.
    pub fn new(
        config: HttpEngineConfig,
        system_prompt: &str,
        tools: Vec<ToolDefinition>,
    ) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| EngineError::Network(e.to_string()))?;

        let history = vec![serde_json::json!({
            "role": "system",
            "content": system_prompt,
        })];

        Ok(Self {
            config,
            client,
            tools,
            history: Mutex::new(history),
        })
    }

    fn api_tools(&self) -> Vec<serde_json::Value> {
        self.tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }
                })
            })
            .collect()
    }

    /// Translate an incoming message to its wire-format entry.
    fn to_wire(message: &EngineMessage) -> serde_json::Value {
        match message {
            EngineMessage::Prompt(text) => serde_json::json!({
                "role": "user",
                "content": text,
            }),
            EngineMessage::ToolResponse {
                call_id,
                name,
                content,
            } => serde_json::json!({
                "role": "tool",
                "tool_call_id": call_id,
                "name": name,
                "content": content,
            }),
        }
    }
}

#[async_trait]
impl ReasoningEngine for HttpEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, message: EngineMessage) -> Result<EngineReply, EngineError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_url.trim_end_matches('/')
        );

        // Append the incoming message, then snapshot the history for the
        // request body. The lock is held across the network call so that
        // the assistant reply lands adjacent to its prompt even if a caller
        // violates the per-session serialization contract.
        let mut history = self.history.lock().await;
        history.push(Self::to_wire(&message));

        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": *history,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "stream": false,
        });

        let api_tools = self.api_tools();
        if !api_tools.is_empty() {
            body["tools"] = serde_json::json!(api_tools);
        }

        debug!(model = %self.config.model, messages = history.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout(e.to_string())
                } else if e.is_connect() {
                    EngineError::Unavailable(e.to_string())
                } else {
                    EngineError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(EngineError::RateLimited {
                retry_after_secs: 5,
            });
        }
        if status == 401 || status == 403 {
            return Err(EngineError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }
        if status >= 500 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Engine backend unavailable");
            return Err(EngineError::Unavailable(format!(
                "status {status}: {error_body}"
            )));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Engine returned error");
            return Err(EngineError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response.json().await.map_err(|e| {
            EngineError::MalformedReply(format!("failed to parse response: {e}"))
        })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::MalformedReply("no choices in response".into()))?;

        // Record the assistant reply verbatim so the backend sees its own
        // tool calls on the next request.
        let mut assistant_entry = serde_json::json!({
            "role": "assistant",
            "content": choice.message.content.clone().unwrap_or_default(),
        });

        let mut calls = choice.message.tool_calls.unwrap_or_default();
        if calls.is_empty() {
            history.push(assistant_entry);
            return Ok(EngineReply::Text(
                choice.message.content.unwrap_or_default(),
            ));
        }

        if calls.len() > 1 {
            warn!(
                requested = calls.len(),
                "Engine requested multiple tool calls; truncating to the first"
            );
            calls.truncate(1);
        }
        let api_call = calls.remove(0);

        assistant_entry["tool_calls"] = serde_json::json!([{
            "id": api_call.id,
            "type": "function",
            "function": {
                "name": api_call.function.name,
                "arguments": api_call.function.arguments,
            }
        }]);
        history.push(assistant_entry);

        let arguments: serde_json::Value = serde_json::from_str(&api_call.function.arguments)
            .unwrap_or_else(|_| serde_json::json!({}));

        Ok(EngineReply::ToolCall(ToolCall {
            id: api_call.id,
            name: api_call.function.name,
            arguments,
        }))
    }

    async fn health_check(&self) -> Result<bool, EngineError> {
        let url = format!("{}/models", self.config.api_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .send()
            .await
            .map_err(|e| EngineError::Network(e.to_string()))?;
        Ok(response.status().is_success())
    }
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Deserialize)]
struct ApiToolCall {
    id: String,
    function: ApiFunction,
}

#[derive(Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}
