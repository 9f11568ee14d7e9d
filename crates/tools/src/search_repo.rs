//! search_repo: regex search over the project via ripgrep's JSON output.

use async_trait::async_trait;
use codeloop_core::error::ToolError;
use codeloop_core::tool::{Tool, ToolArgs, parse_arguments};
use serde::Deserialize;
use std::ffi::OsStr;
use tracing::{debug, trace};
use crate::process::ProcessRunner;

const TOOL_NAME: &str = "search_repo";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    #[serde(alias = "regex")]
    pattern: String,
    #[serde(default, alias = "maxFiles", alias = "max_files")]
    max_count: Option<usize>,
}

pub struct SearchRepoTool {
    runner: ProcessRunner,
    program: String,
    default_max_count: usize,
}

impl SearchRepoTool {
    pub fn new(runner: ProcessRunner, program: impl Into<String>, default_max_count: usize) -> Self {
        Self {
            runner,
            program: program.into(),
            default_max_count,
        }
    }
}

/// Keep the `match` records from ripgrep's line-delimited JSON, in order.
/// Lines that are not JSON, or are other record types, are dropped.
pub fn parse_matches(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<serde_json::Value>(line) {
            Ok(record) => Some(record),
            Err(e) => {
                trace!(error = %e, "Dropping unparsable search output line");
                None
            }
        })
        .filter(|record| record.get("type").and_then(|t| t.as_str()) == Some("match"))
        .collect()
}

#[async_trait]
impl Tool for SearchRepoTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search the repository for a regular expression. Returns ripgrep match records (path, line number, line text)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": {
                    "type": "string",
                    "description": "Regular expression to search for"
                },
                "max_count": {
                    "type": "integer",
                    "description": "Maximum matches per file",
                    "default": self.default_max_count
                }
            },
            "required": ["pattern"]
        })
    }

    async fn execute(&self, arguments: ToolArgs) -> Result<serde_json::Value, ToolError> {
        let args: SearchArgs = parse_arguments(TOOL_NAME, arguments)?;
        let max_count = args.max_count.unwrap_or(self.default_max_count).to_string();
        let root = self.runner.cwd().as_os_str();

        debug!(pattern = %args.pattern, max_count = %max_count, "Searching repository");

        let output = self
            .runner
            .run(
                &self.program,
                [
                    OsStr::new("--json"),
                    OsStr::new("-m"),
                    OsStr::new(&max_count),
                    OsStr::new("-e"),
                    OsStr::new(&args.pattern),
                    root,
                ],
                None,
            )
            .await;

        let matches = parse_matches(&output.stdout);

        // rg exits 1 for "no matches"; 2 and above (or a spawn failure) is a real error.
        if matches.is_empty() && (output.code >= 2 || output.code < 0) {
            return Err(ToolError::CommandFailed {
                tool_name: TOOL_NAME.into(),
                exit_code: output.code,
                output: output.combined_output(),
            });
        }

        Ok(serde_json::Value::Array(matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::DEFAULT_TIMEOUT;

    fn args(value: serde_json::Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn keeps_only_match_records_in_order() {
        let stdout = concat!(
            r#"{"type":"begin","data":{"path":{"text":"src/a.rs"}}}"#, "\n",
            r#"{"type":"match","data":{"line_number":3,"lines":{"text":"fn validate()"}}}"#, "\n",
            r#"{"type":"match","data":{"line_number":9,"lines":{"text":"validate(x)"}}}"#, "\n",
            r#"{"type":"end","data":{}}"#, "\n",
            r#"{"type":"summary","data":{}}"#, "\n",
        );
        let matches = parse_matches(stdout);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0]["data"]["line_number"], 3);
        assert_eq!(matches[1]["data"]["line_number"], 9);
    }

    #[test]
    fn malformed_lines_are_dropped() {
        assert!(parse_matches("not valid json").is_empty());

        let stdout = "garbage\n{\"type\":\"match\",\"data\":{}}\n{truncated";
        assert_eq!(parse_matches(stdout).len(), 1);
    }

    #[test]
    fn pattern_aliases_accepted() {
        let parsed: SearchArgs =
            parse_arguments(TOOL_NAME, args(serde_json::json!({"regex": "foo", "maxFiles": 3})))
                .unwrap();
        assert_eq!(parsed.pattern, "foo");
        assert_eq!(parsed.max_count, Some(3));
    }

    #[test]
    fn missing_pattern_is_invalid() {
        let err = parse_arguments::<SearchArgs>(TOOL_NAME, ToolArgs::new()).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_json_output_yields_empty_result() {
        // `echo` stands in for ripgrep and prints its arguments, which is not JSON.
        let dir = tempfile::tempdir().unwrap();
        let tool = SearchRepoTool::new(ProcessRunner::new(dir.path(), DEFAULT_TIMEOUT), "echo", 50);
        let result = tool
            .execute(args(serde_json::json!({"pattern": "validate"})))
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_search_program_is_command_failure() {
        let dir = tempfile::tempdir().unwrap();
        let tool = SearchRepoTool::new(
            ProcessRunner::new(dir.path(), DEFAULT_TIMEOUT),
            "definitely-not-ripgrep-xyz",
            50,
        );
        let err = tool
            .execute(args(serde_json::json!({"pattern": "validate"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::CommandFailed { exit_code: -1, .. }));
    }
}
