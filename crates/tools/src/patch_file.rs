//! patch_file: apply a unified diff to one file with `patch`.

use async_trait::async_trait;
use codeloop_core::error::ToolError;
use codeloop_core::tool::{Tool, ToolArgs, parse_arguments};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use crate::process::ProcessRunner;
use crate::sandbox::ProjectRoot;

const TOOL_NAME: &str = "patch_file";

#[derive(Debug, Deserialize)]
struct PatchArgs {
    #[serde(alias = "relPath", alias = "rel_path")]
    path: String,
    diff: String,
}

pub struct PatchFileTool {
    root: ProjectRoot,
    runner: ProcessRunner,
    program: String,
}

impl PatchFileTool {
    pub fn new(root: ProjectRoot, runner: ProcessRunner, program: impl Into<String>) -> Self {
        Self {
            root,
            runner,
            program: program.into(),
        }
    }
}

/// `<target>.patch`, next to the target.
fn patch_path_for(target: &Path) -> PathBuf {
    let mut path = target.as_os_str().to_os_string();
    path.push(".patch");
    PathBuf::from(path)
}

#[async_trait]
impl Tool for PatchFileTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Apply a unified diff to a file, path relative to the project root."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "File to patch, relative to the project root"
                },
                "diff": {
                    "type": "string",
                    "description": "Unified diff to apply"
                }
            },
            "required": ["path", "diff"]
        })
    }

    async fn execute(&self, arguments: ToolArgs) -> Result<serde_json::Value, ToolError> {
        let args: PatchArgs = parse_arguments(TOOL_NAME, arguments)?;
        let target = self.root.resolve(&args.path)?;
        let patch_path = patch_path_for(&target);

        tokio::fs::write(&patch_path, &args.diff)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: TOOL_NAME.into(),
                reason: format!("writing {}: {e}", patch_path.display()),
            })?;

        debug!(target = %target.display(), "Applying patch");
        let output = self
            .runner
            .run(&self.program, [target.as_os_str(), patch_path.as_os_str()], None)
            .await;

        if let Err(e) = tokio::fs::remove_file(&patch_path).await {
            debug!(error = %e, "Could not remove temporary patch file");
        }

        if !output.success() {
            warn!(target = %target.display(), code = output.code, "Patch failed");
            return Err(ToolError::CommandFailed {
                tool_name: TOOL_NAME.into(),
                exit_code: output.code,
                output: output.combined_output(),
            });
        }

        Ok(serde_json::json!("patched"))
    }
}
