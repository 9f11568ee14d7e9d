//! Ollama-native chat provider.
//!
//! Talks to `POST <base>/api/chat` with `stream: false`. Tools are
//! advertised by name and description only. Replies are accepted in two
//! shapes:
//!
//! - flat: `{"content": "..."}` or `{"tool_call": {"name": ..., "arguments": {...}}}`
//! - native: `{"message": {"content": "...", "tool_calls": [{"function": {...}}]}}`

use async_trait::async_trait;
use codeloop_core::error::ProviderError;
use codeloop_core::message::{Message, MessageToolCall};
use codeloop_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// A provider for a local (or remote) Ollama server.
pub struct OllamaProvider {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            base_url: normalize_base_url(base_url.into()),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn to_chat_request(request: &ProviderRequest) -> ChatRequest<'_> {
        ChatRequest {
            model: &request.model,
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                    name: m.name.as_deref(),
                    tool_calls: m
                        .tool_calls
                        .iter()
                        .map(|tc| ChatToolCall {
                            function: ChatFunction {
                                name: &tc.name,
                                arguments: &tc.arguments,
                            },
                        })
                        .collect(),
                })
                .collect(),
            tools: request
                .tools
                .iter()
                .map(|t| ToolAdvert {
                    name: &t.name,
                    description: &t.description,
                })
                .collect(),
            stream: false,
            options: ChatOptions {
                temperature: request.temperature,
            },
        }
    }

    fn to_message(reply: ChatReply) -> Message {
        let (content, tool_call) = match reply.message {
            Some(native) => {
                let call = native
                    .tool_calls
                    .into_iter()
                    .next()
                    .map(|tc| tc.function)
                    .or(reply.tool_call);
                (native.content.or(reply.content), call)
            }
            None => (reply.content, reply.tool_call),
        };

        let content = content.unwrap_or_default();
        match tool_call {
            Some(call) => Message::assistant_tool_call(
                content,
                MessageToolCall::new(call.name, decode_arguments(call.arguments)),
            ),
            None => Message::assistant(content),
        }
    }
}

/// Strip a trailing slash and an `/api/chat` suffix so both
/// `http://host:11434` and `http://host:11434/api/chat` work.
fn normalize_base_url(url: String) -> String {
    let trimmed = url.trim_end_matches('/');
    trimmed
        .strip_suffix("/api/chat")
        .unwrap_or(trimmed)
        .to_string()
}

/// Some models send arguments as a JSON-encoded string instead of an object.
fn decode_arguments(arguments: serde_json::Value) -> serde_json::Value {
    match arguments {
        serde_json::Value::String(raw) => {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        }
        other => other,
    }
}

#[async_trait]
impl codeloop_core::Provider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let body = Self::to_chat_request(&request);

        debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.offers_tools(),
            "Sending chat request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ProviderError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Model service rejected the credentials".into(),
            ));
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Model service returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let reply: ChatReply = response.json().await.map_err(|e| ProviderError::ApiError {
            status_code: status,
            message: format!("Failed to parse response: {e}"),
        })?;

        let usage = match (reply.prompt_eval_count, reply.eval_count) {
            (Some(prompt), Some(completion)) => Some(Usage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                total_tokens: prompt + completion,
            }),
            _ => None,
        };
        let model = reply.model.clone().unwrap_or_else(|| request.model.clone());

        Ok(ProviderResponse {
            message: Self::to_message(reply),
            usage,
            model,
        })
    }
}

// --- Wire types (internal) ---

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolAdvert<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ChatToolCall<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatToolCall<'a> {
    function: ChatFunction<'a>,
}

#[derive(Debug, Serialize)]
struct ChatFunction<'a> {
    name: &'a str,
    arguments: &'a serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolAdvert<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_call: Option<FunctionCall>,
    #[serde(default)]
    message: Option<NativeMessage>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct NativeMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<NativeToolCall>,
}

#[derive(Debug, Deserialize)]
struct NativeToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}
