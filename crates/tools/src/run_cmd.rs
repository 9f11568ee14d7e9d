//! run_cmd: run a shell command in the project root.

use async_trait::async_trait;
use codeloop_core::error::ToolError;
use codeloop_core::tool::{Tool, ToolArgs, parse_arguments};
use serde::Deserialize;
use std::time::Duration;
use crate::process::ProcessRunner;

const TOOL_NAME: &str = "run_cmd";

#[derive(Debug, Deserialize)]
struct RunArgs {
    #[serde(alias = "command")]
    cmd: String,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

pub struct RunCmdTool {
    runner: ProcessRunner,
}

impl RunCmdTool {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl Tool for RunCmdTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Run a shell command in the project root. Returns exit code, stdout, stderr and whether it timed out."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "cmd": {
                    "type": "string",
                    "description": "Shell command to run"
                },
                "timeout_ms": {
                    "type": "integer",
                    "description": "Timeout in milliseconds",
                    "default": self.runner.default_timeout().as_millis() as u64
                }
            },
            "required": ["cmd"]
        })
    }

    async fn execute(&self, arguments: ToolArgs) -> Result<serde_json::Value, ToolError> {
        let args: RunArgs = parse_arguments(TOOL_NAME, arguments)?;
        let timeout = args.timeout_ms.map(Duration::from_millis);
        let output = self.runner.run_shell(&args.cmd, timeout).await;
        serde_json::to_value(output).map_err(|e| ToolError::ExecutionFailed {
            tool_name: TOOL_NAME.into(),
            reason: e.to_string(),
        })
    }
}
