//! Planning: one model call that turns a task into numbered steps.

use std::sync::Arc;
use codeloop_core::error::ProviderError;
use codeloop_core::message::Message;
use codeloop_core::provider::{Provider, ProviderRequest};
use tracing::{debug, info};

/// The planner's raw reply and the steps parsed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub raw: String,
    pub steps: Vec<String>,
}

/// Extract step lines from a planner reply.
///
/// A step is a line starting with one or more ASCII digits and a period
/// (`1.`, `12.`). Anything else, including indented numbers, is commentary.
pub fn parse_plan(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| is_step_line(line))
        .map(str::to_string)
        .collect()
}

fn is_step_line(line: &str) -> bool {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    digits > 0 && line.as_bytes().get(digits) == Some(&b'.')
}

pub struct Planner {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    system_prompt: String,
}

impl Planner {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            system_prompt: system_prompt.into(),
        }
    }

    /// Ask the model for a plan. No tools are offered.
    pub async fn plan(&self, task: &str) -> Result<Plan, ProviderError> {
        let request = ProviderRequest::new(
            self.model.clone(),
            vec![Message::system(&self.system_prompt), Message::user(task)],
        )
        .with_temperature(self.temperature);

        debug!(model = %self.model, "Requesting plan");
        let response = self.provider.complete(request).await?;

        let raw = response.message.content;
        let steps = parse_plan(&raw);
        info!(steps = steps.len(), "Plan created");
        Ok(Plan { raw, steps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, text_reply};

    #[test]
    fn numbered_lines_become_steps() {
        let steps = parse_plan("1. Search for input handlers\n2. Add validation");
        assert_eq!(steps, vec!["1. Search for input handlers", "2. Add validation"]);
    }

    #[test]
    fn commentary_and_blank_runs_are_skipped() {
        let text = "Here is the plan:\n\n\n1. Read main.rs\nThen:\n2. Patch it\n\nDone.";
        assert_eq!(parse_plan(text), vec!["1. Read main.rs", "2. Patch it"]);
    }

    #[test]
    fn multi_digit_numbers_match() {
        assert_eq!(parse_plan("10. Tenth\n12.Twelfth"), vec!["10. Tenth", "12.Twelfth"]);
    }

    #[test]
    fn indented_or_malformed_lines_do_not_match() {
        let text = "  1. indented\n1) paren\n- 2. bullet\n3 no period\n.4 leading period";
        assert!(parse_plan(text).is_empty());
    }

    #[test]
    fn carriage_returns_are_dropped() {
        assert_eq!(parse_plan("1. One\r\n2. Two\r\n"), vec!["1. One", "2. Two"]);
    }

    #[test]
    fn empty_reply_has_no_steps() {
        assert!(parse_plan("").is_empty());
        assert!(parse_plan("I cannot help with that.").is_empty());
    }

    #[tokio::test]
    async fn plan_request_has_no_tools() {
        let provider = Arc::new(ScriptedProvider::new(vec![text_reply(
            "1. Search for input handlers\n2. Add validation",
        )]));
        let planner = Planner::new(provider.clone(), "mistral:7b", 0.2, "You are a senior software planner.");

        let plan = planner.plan("Add input validation").await.unwrap();
        assert_eq!(plan.steps.len(), 2);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].offers_tools());
        assert_eq!(requests[0].messages[1].content, "Add input validation");
    }
}
