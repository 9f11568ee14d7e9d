//! Shared test helpers: a provider that replays scripted replies.

use codeloop_core::error::{ProviderError, ToolError};
use codeloop_core::message::{Message, MessageToolCall};
use codeloop_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use codeloop_core::tool::{Tool, ToolArgs};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays replies in order and records every request it receives.
///
/// Panics if called more times than it has replies.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<ProviderResponse>) -> Self {
        Self::with_results(replies.into_iter().map(Ok).collect())
    }

    pub fn with_results(replies: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no more replies"))
    }
}

fn usage() -> Option<Usage> {
    Some(Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    })
}

pub fn text_reply(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: usage(),
        model: "scripted-model".into(),
    }
}

pub fn tool_reply(name: &str, arguments: serde_json::Value) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_tool_call("", MessageToolCall::new(name, arguments)),
        usage: usage(),
        model: "scripted-model".into(),
    }
}

/// Returns its arguments unchanged.
pub struct EchoTool;

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the arguments back"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, arguments: ToolArgs) -> Result<serde_json::Value, ToolError> {
        Ok(serde_json::Value::Object(arguments))
    }
}

/// Returns a string of `len` characters.
pub struct BigOutputTool {
    pub len: usize,
}

#[async_trait::async_trait]
impl Tool for BigOutputTool {
    fn name(&self) -> &str {
        "big_output"
    }

    fn description(&self) -> &str {
        "Produce a large result"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, _arguments: ToolArgs) -> Result<serde_json::Value, ToolError> {
        Ok(serde_json::Value::String("é".repeat(self.len)))
    }
}
