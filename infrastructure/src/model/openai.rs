//! OpenAI chat-completions adapter
//!
//! Speaks the `/chat/completions` tool-calling dialect. Tool names are
//! domain-qualified (`files.read`) but the wire format only allows
//! `[a-zA-Z0-9_-]`, so names are mangled to `files_read` on the way out and
//! mapped back through the schemas supplied with each request.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use toolgate_application::{ModelClient, ProviderError, ToolSchema};
use toolgate_domain::{AssistantTurn, Message, Role, ToolCall};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings for one OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: Option<f32>,
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
            temperature: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// `ModelClient` backed by an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiClient {
    config: OpenAiConfig,
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        Self { config, http }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn converse(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<AssistantTurn, ProviderError> {
        let unmangle: HashMap<String, String> = tools
            .iter()
            .map(|t| (mangle(&t.name), t.name.clone()))
            .collect();

        let mut body = json!({
            "model": self.config.model,
            "messages": to_wire_messages(messages),
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(to_wire_tools(tools));
        }
        if let Some(temperature) = self.config.temperature {
            body["temperature"] = json!(temperature);
        }

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        debug!(
            model = %self.config.model,
            tools = tools.len(),
            messages = messages.len(),
            "sending chat completion request"
        );

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.config.timeout_secs)
                } else if e.is_connect() {
                    ProviderError::Connection(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !status.is_success() {
            let snippet: String = text.chars().take(500).collect();
            return Err(ProviderError::RequestFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                snippet
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(format!("Malformed response body: {e}")))?;
        turn_from_response(parsed, &unmangle)
    }
}

fn mangle(name: &str) -> String {
    name.replace('.', "_")
}

fn to_wire_tools(tools: &[ToolSchema]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": mangle(&t.name),
                    "description": t.description,
                    "parameters": t.parameters,
                }
            })
        })
        .collect()
}

fn to_wire_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .enumerate()
        .map(|(index, m)| match m.role {
            Role::System => json!({"role": "system", "content": m.content}),
            Role::User => json!({"role": "user", "content": m.content}),
            Role::Assistant if m.tool_calls.is_empty() => {
                json!({"role": "assistant", "content": m.content})
            }
            Role::Assistant => {
                let calls: Vec<Value> = m
                    .tool_calls
                    .iter()
                    .enumerate()
                    .map(|(call_index, call)| {
                        let id = call
                            .native_id
                            .clone()
                            .unwrap_or_else(|| format!("call_{index}_{call_index}"));
                        json!({
                            "id": id,
                            "type": "function",
                            "function": {
                                "name": mangle(&call.name),
                                "arguments": serde_json::to_string(&call.arguments)
                                    .unwrap_or_else(|_| "{}".to_string()),
                            }
                        })
                    })
                    .collect();
                json!({
                    "role": "assistant",
                    "content": if m.content.is_empty() { Value::Null } else { json!(m.content) },
                    "tool_calls": calls,
                })
            }
            Role::Tool => json!({
                "role": "tool",
                "tool_call_id": m.tool_call_id.clone().unwrap_or_default(),
                "content": m.content,
            }),
        })
        .collect()
}

fn turn_from_response(
    response: ChatResponse,
    unmangle: &HashMap<String, String>,
) -> Result<AssistantTurn, ProviderError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("Response contained no choices".into()))?;

    let mut calls = Vec::new();
    for (index, wire) in choice.message.tool_calls.into_iter().enumerate() {
        let arguments: HashMap<String, Value> = match serde_json::from_str(&wire.function.arguments)
        {
            Ok(map) => map,
            Err(e) => {
                warn!(
                    tool = %wire.function.name,
                    "tool call arguments were not valid JSON: {e}"
                );
                HashMap::new()
            }
        };
        // Unknown names pass through untouched; the executor rejects them
        let name = unmangle
            .get(&wire.function.name)
            .cloned()
            .unwrap_or(wire.function.name);
        let id = wire.id.unwrap_or_else(|| format!("call_{index}"));
        calls.push(ToolCall::from_native(id, name, arguments));
    }

    let text = choice.message.content.filter(|c| !c.is_empty());
    Ok(AssistantTurn::new(text, calls))
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}
