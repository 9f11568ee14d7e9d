//! read_file: return a line range of a file inside the project root.

use async_trait::async_trait;
use codeloop_core::error::ToolError;
use codeloop_core::tool::{Tool, ToolArgs, parse_arguments};
use serde::Deserialize;
use tracing::debug;
use crate::sandbox::ProjectRoot;

const TOOL_NAME: &str = "read_file";

#[derive(Debug, Deserialize)]
struct ReadArgs {
    #[serde(alias = "relPath", alias = "rel_path")]
    path: String,
    #[serde(default)]
    start: usize,
    #[serde(default)]
    end: Option<usize>,
}

pub struct ReadFileTool {
    root: ProjectRoot,
    default_end: usize,
}

impl ReadFileTool {
    pub fn new(root: ProjectRoot, default_end: usize) -> Self {
        Self { root, default_end }
    }
}

/// Lines `[start, end)` of `content`, split on `\n`. Out-of-range bounds clamp.
fn line_range(content: &str, start: usize, end: usize) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let end = end.min(lines.len());
    let start = start.min(end);
    lines[start..end].join("\n")
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Read lines [start, end) of a file, path relative to the project root."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File path relative to the project root"
                },
                "start": {
                    "type": "integer",
                    "description": "First line to return (0-based)",
                    "default": 0
                },
                "end": {
                    "type": "integer",
                    "description": "Line to stop before (exclusive)",
                    "default": self.default_end
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: ToolArgs) -> Result<serde_json::Value, ToolError> {
        let args: ReadArgs = parse_arguments(TOOL_NAME, arguments)?;
        let full_path = self.root.resolve(&args.path)?;
        let end = args.end.unwrap_or(self.default_end);

        debug!(path = %full_path.display(), start = args.start, end, "Reading file");

        let content = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ToolError::FileNotFound(args.path.clone()),
                _ => ToolError::ExecutionFailed {
                    tool_name: TOOL_NAME.into(),
                    reason: format!("{}: {e}", args.path),
                },
            })?;

        Ok(serde_json::Value::String(line_range(&content, args.start, end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(value: serde_json::Value) -> ToolArgs {
        value.as_object().cloned().unwrap()
    }

    fn fixture() -> (tempfile::TempDir, ReadFileTool) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "zero\none\ntwo\nthree\nfour").unwrap();
        let tool = ReadFileTool::new(ProjectRoot::new(dir.path()), 400);
        (dir, tool)
    }

    #[test]
    fn range_is_half_open_and_clamped() {
        let content = "a\nb\nc\nd";
        assert_eq!(line_range(content, 1, 3), "b\nc");
        assert_eq!(line_range(content, 0, 100), content);
        assert_eq!(line_range(content, 10, 20), "");
        assert_eq!(line_range(content, 3, 1), "");
    }

    #[tokio::test]
    async fn reads_requested_lines() {
        let (_dir, tool) = fixture();
        let result = tool
            .execute(args(serde_json::json!({"path": "src/lib.rs", "start": 1, "end": 3})))
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!("one\ntwo"));
    }

    #[tokio::test]
    async fn defaults_read_from_top() {
        let (_dir, tool) = fixture();
        let result = tool
            .execute(args(serde_json::json!({"relPath": "src/lib.rs"})))
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!("zero\none\ntwo\nthree\nfour"));
    }

    #[tokio::test]
    async fn missing_file_is_file_not_found() {
        let (_dir, tool) = fixture();
        let err = tool
            .execute(args(serde_json::json!({"path": "src/missing.rs"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::FileNotFound(p) if p == "src/missing.rs"));
    }

    #[tokio::test]
    async fn escape_attempt_is_sandbox_violation() {
        let (_dir, tool) = fixture();
        let err = tool
            .execute(args(serde_json::json!({"path": "../outside.txt"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation(_)));
    }

    #[tokio::test]
    async fn wrong_argument_type_is_invalid() {
        let (_dir, tool) = fixture();
        let err = tool
            .execute(args(serde_json::json!({"path": "src/lib.rs", "start": "one"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
