//! git_commit: stage everything and commit.

use async_trait::async_trait;
use codeloop_core::error::ToolError;
use codeloop_core::tool::{Tool, ToolArgs, parse_arguments};
use serde::Deserialize;
use tracing::{info, warn};
use crate::process::{ProcessOutput, ProcessRunner};

const TOOL_NAME: &str = "git_commit";

#[derive(Debug, Deserialize)]
struct CommitArgs {
    message: String,
}

pub struct GitCommitTool {
    runner: ProcessRunner,
    program: String,
}

impl GitCommitTool {
    pub fn new(runner: ProcessRunner, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    fn check(step: &str, output: ProcessOutput) -> Result<(), ToolError> {
        if output.success() {
            return Ok(());
        }
        warn!(step, code = output.code, "git command failed");
        Err(ToolError::CommandFailed {
            tool_name: TOOL_NAME.into(),
            exit_code: output.code,
            output: format!("git {step}: {}", output.combined_output()),
        })
    }
}

/// Commit messages have embedded double quotes removed.
pub fn sanitize_commit_message(message: &str) -> String {
    message.replace('"', "")
}

#[async_trait]
impl Tool for GitCommitTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Stage all changes in the project and commit them with the given message."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "Commit message"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, arguments: ToolArgs) -> Result<serde_json::Value, ToolError> {
        let args: CommitArgs = parse_arguments(TOOL_NAME, arguments)?;
        let message = sanitize_commit_message(&args.message);

        let add = self.runner.run(&self.program, ["add", "-A"], None).await;
        Self::check("add", add)?;

        let commit = self
            .runner
            .run(&self.program, ["commit", "-m", message.as_str()], None)
            .await;
        Self::check("commit", commit)?;

        info!(message = %message, "Committed changes");
        Ok(serde_json::json!("committed"))
    }
}
