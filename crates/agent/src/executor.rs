//! Per-step executor: the bounded model/tool conversation for one plan step.
//!
//! Each step gets a fresh conversation seeded with the executor persona
//! and the step text. Every attempt is one model call. A tool call is
//! dispatched and its (truncated) result appended; plain text ends the
//! step. If the budget runs out while the model is still calling tools,
//! the step ends as [`StepOutcome::Exhausted`].

use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use codeloop_core::error::{ProviderError, ToolError};
use codeloop_core::event::{DomainEvent, EventBus};
use codeloop_core::message::{Conversation, Message};
use codeloop_core::provider::{Provider, ProviderRequest};
use codeloop_core::tool::{ToolCall, ToolRegistry};
use tracing::{debug, info, warn};

/// Prefix for tool failures written into the conversation.
pub const TOOL_ERROR_PREFIX: &str = "ERROR: ";

/// How a step ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The model answered in text.
    Done { answer: String },
    /// Every attempt produced a tool call.
    Exhausted { attempts: u32 },
}

impl StepOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, StepOutcome::Done { .. })
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            StepOutcome::Done { answer } => Some(answer),
            StepOutcome::Exhausted { .. } => None,
        }
    }
}

/// Everything that happened in one step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: String,
    pub outcome: StepOutcome,
    /// Model calls made.
    pub attempts: u32,
    /// Tool names dispatched, in order.
    pub dispatches: Vec<String>,
    pub conversation: Conversation,
}

/// Cut `text` to at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Render a tool outcome as the content of a `tool` message.
pub fn render_tool_result(result: &Result<serde_json::Value, ToolError>, limit: usize) -> String {
    match result {
        Ok(value) => truncate_chars(&value.to_string(), limit),
        Err(e) => format!("{TOOL_ERROR_PREFIX}{e}"),
    }
}

pub struct StepExecutor {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    system_prompt: String,
    max_attempts: u32,
    result_limit: usize,
    event_bus: Arc<EventBus>,
}

impl StepExecutor {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.2,
            system_prompt: system_prompt.into(),
            max_attempts: 6,
            result_limit: 1000,
            event_bus,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the number of model calls allowed per step.
    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the character limit for tool results.
    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Drive one step to `Done` or `Exhausted`.
    ///
    /// Tool failures stay inside the conversation; only model-service
    /// errors are returned.
    pub async fn run_step(&self, index: usize, step: &str) -> Result<StepReport, ProviderError> {
        let mut conversation = Conversation::seeded(&self.system_prompt, step);
        let tool_definitions = self.tools.definitions();
        let mut dispatches = Vec::new();
        let mut attempts = 0;

        info!(index, step = %step, "Executing step");
        self.event_bus.publish(DomainEvent::StepStarted {
            index,
            step: step.to_string(),
            timestamp: Utc::now(),
        });

        while attempts < self.max_attempts {
            attempts += 1;
            debug!(conversation_id = %conversation.id, attempt = attempts, "Step attempt");

            let request = ProviderRequest::new(self.model.clone(), conversation.messages().to_vec())
                .with_temperature(self.temperature)
                .with_tools(tool_definitions.clone());

            let response = self.provider.complete(request).await?;

            if let Some(usage) = &response.usage {
                self.event_bus.publish(DomainEvent::ResponseGenerated {
                    conversation_id: conversation.id.to_string(),
                    model: response.model.clone(),
                    tokens_used: usage.total_tokens,
                    timestamp: Utc::now(),
                });
            }

            let mut message = response.message;
            let Some(first_call) = message.tool_calls.first().cloned() else {
                let answer = message.content.clone();
                conversation.push(message);
                return Ok(self.finish(index, step, StepOutcome::Done { answer }, attempts, dispatches, conversation));
            };

            if message.tool_calls.len() > 1 {
                warn!(
                    count = message.tool_calls.len(),
                    "Model requested several tool calls; only the first is dispatched"
                );
                message.tool_calls.truncate(1);
            }
            conversation.push(message);

            let call = ToolCall::from(&first_call);
            debug!(tool = %call.name, "Dispatching tool");
            let started = Instant::now();
            let result = self.tools.execute(&call).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            if let Err(e) = &result {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
            }
            self.event_bus.publish(DomainEvent::ToolExecuted {
                tool_name: call.name.clone(),
                success: result.is_ok(),
                duration_ms,
                timestamp: Utc::now(),
            });

            let content = render_tool_result(&result, self.result_limit);
            conversation.push(Message::tool_result(&call.id, &call.name, content));
            dispatches.push(call.name);
        }

        warn!(index, attempts, "Attempt budget exhausted before the step completed");
        Ok(self.finish(index, step, StepOutcome::Exhausted { attempts }, attempts, dispatches, conversation))
    }

    fn finish(
        &self,
        index: usize,
        step: &str,
        outcome: StepOutcome,
        attempts: u32,
        dispatches: Vec<String>,
        conversation: Conversation,
    ) -> StepReport {
        self.event_bus.publish(DomainEvent::StepFinished {
            index,
            answer: outcome.answer().map(str::to_string),
            attempts,
            timestamp: Utc::now(),
        });

        StepReport {
            step: step.to_string(),
            outcome,
            attempts,
            dispatches,
            conversation,
        }
    }
}
