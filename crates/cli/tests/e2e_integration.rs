//! End-to-end tests for the codeloop pipeline.
//!
//! These drive the real agent loop with the real tool registry rooted in
//! a temporary project; only the model is scripted.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use codeloop_agent::{AgentLoop, StepOutcome};
use codeloop_config::{AppConfig, ToolsConfig};
use codeloop_core::error::ProviderError;
use codeloop_core::event::{DomainEvent, EventBus};
use codeloop_core::message::{Message, MessageToolCall, Role};
use codeloop_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use codeloop_tools::registry_for_root;

// ── Mock Provider ────────────────────────────────────────────────────────

/// Replays scripted replies in sequence and keeps the requests it saw.
struct ScriptedProvider {
    replies: Mutex<VecDeque<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<ProviderResponse>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or_else(|| panic!("ScriptedProvider exhausted")))
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

fn tool_response(name: &str, arguments: serde_json::Value) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_tool_call("", MessageToolCall::new(name, arguments)),
        usage: None,
        model: "mock-model".into(),
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("src")).unwrap();
    std::fs::write(
        dir.path().join("src/handlers.rs"),
        "pub fn handle(input: &str) -> String {\n    input.to_string()\n}\n",
    )
    .unwrap();
    dir
}

fn agent_with(
    dir: &std::path::Path,
    tools_config: ToolsConfig,
    provider: Arc<ScriptedProvider>,
    bus: Arc<EventBus>,
) -> AgentLoop {
    let config = AppConfig {
        tools: tools_config.clone(),
        ..AppConfig::default()
    };
    let tools = Arc::new(registry_for_root(dir, &tools_config));
    AgentLoop::from_config(&config, provider, tools, bus)
}

// ── Scenario A: plan parsing drives step order ───────────────────────────

#[tokio::test]
async fn e2e_plan_steps_run_in_order() {
    let dir = project();
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("1. Search for input handlers\n2. Add validation"),
        text_response("Handlers are in src/handlers.rs."),
        text_response("Validation added."),
    ]));
    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let agent = agent_with(dir.path(), ToolsConfig::default(), provider.clone(), bus);

    let report = agent.run("Add input validation").await.unwrap();

    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.steps[0].step, "1. Search for input handlers");
    assert_eq!(report.steps[1].step, "2. Add validation");
    assert_eq!(report.steps[1].outcome.answer(), Some("Validation added."));
    assert_eq!(provider.calls(), 3);

    let mut started = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let DomainEvent::StepStarted { step, .. } = event.as_ref() {
            started.push(step.clone());
        }
    }
    assert_eq!(started, vec!["1. Search for input handlers", "2. Add validation"]);
}

// ── Scenario B: two real tool dispatches, then text ──────────────────────

#[cfg(unix)]
#[tokio::test]
async fn e2e_tool_calls_then_answer() {
    let dir = project();
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("1. Inspect the handler"),
        tool_response("read_file", serde_json::json!({"path": "src/handlers.rs", "end": 1})),
        tool_response("run_cmd", serde_json::json!({"cmd": "ls src"})),
        text_response("The handler takes a &str."),
    ]));
    let agent = agent_with(
        dir.path(),
        ToolsConfig::default(),
        provider.clone(),
        Arc::new(EventBus::default()),
    );

    let report = agent.run("Look at the handler").await.unwrap();
    let step = &report.steps[0];

    assert_eq!(step.outcome, StepOutcome::Done { answer: "The handler takes a &str.".into() });
    assert_eq!(step.attempts, 3);
    assert_eq!(step.dispatches, vec!["read_file", "run_cmd"]);

    let tool_messages: Vec<&Message> = step
        .conversation
        .messages()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .collect();
    assert_eq!(tool_messages.len(), 2);
    assert_eq!(
        tool_messages[0].content,
        r#""pub fn handle(input: &str) -> String {""#
    );
    let listing: serde_json::Value = serde_json::from_str(&tool_messages[1].content).unwrap();
    assert_eq!(listing["code"], 0);
    assert!(listing["stdout"].as_str().unwrap().contains("handlers.rs"));
}

// ── Scenario C: garbage search output is zero matches ────────────────────

#[cfg(unix)]
#[tokio::test]
async fn e2e_unparsable_search_output_is_empty_result() {
    let dir = project();
    // `echo` prints its arguments instead of ripgrep JSON.
    let tools_config = ToolsConfig {
        ripgrep_program: "echo".into(),
        ..ToolsConfig::default()
    };
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("1. Search for validate"),
        tool_response("search_repo", serde_json::json!({"regex": "validate"})),
        text_response("No matches."),
    ]));
    let agent = agent_with(dir.path(), tools_config, provider, Arc::new(EventBus::default()));

    let report = agent.run("Find validation").await.unwrap();
    let tool_message = &report.steps[0].conversation.messages()[3];
    assert_eq!(tool_message.role, Role::Tool);
    assert_eq!(tool_message.content, "[]");
}

// ── Failure handling ─────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_sandbox_violation_is_reported_to_model() {
    let dir = project();
    let provider = Arc::new(ScriptedProvider::new(vec![
        text_response("1. Read secrets"),
        tool_response("read_file", serde_json::json!({"path": "../../etc/passwd"})),
        text_response("Not allowed."),
    ]));
    let agent = agent_with(
        dir.path(),
        ToolsConfig::default(),
        provider,
        Arc::new(EventBus::default()),
    );

    let report = agent.run("Read secrets").await.unwrap();
    let tool_message = &report.steps[0].conversation.messages()[3];
    assert!(tool_message.content.starts_with("ERROR: Sandbox violation"));
    assert!(report.all_done());
}

#[tokio::test]
async fn e2e_exhausted_step_then_next_step() {
    let dir = project();
    let mut replies = vec![text_response("1. Keep reading\n2. Wrap up")];
    for _ in 0..6 {
        replies.push(tool_response(
            "read_file",
            serde_json::json!({"path": "src/handlers.rs"}),
        ));
    }
    replies.push(text_response("Wrapped up."));
    let provider = Arc::new(ScriptedProvider::new(replies));
    let agent = agent_with(
        dir.path(),
        ToolsConfig::default(),
        provider.clone(),
        Arc::new(EventBus::default()),
    );

    let report = agent.run("Loop").await.unwrap();
    assert_eq!(report.steps[0].outcome, StepOutcome::Exhausted { attempts: 6 });
    assert!(report.steps[0].conversation.len() <= 2 + 2 * 6);
    assert_eq!(report.steps[1].outcome.answer(), Some("Wrapped up."));
    assert_eq!(provider.calls(), 8);
}
