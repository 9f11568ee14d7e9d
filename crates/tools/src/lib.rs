//! Built-in tool implementations for codeloop.
//!
//! Tools give the executor its hands on the project: search it, read
//! line ranges, apply diffs, commit, and run arbitrary commands. All of
//! them are rooted in one project directory; subprocesses go through
//! [`process::ProcessRunner`], which enforces the command timeout.

pub mod git_commit;
pub mod patch_file;
pub mod process;
pub mod read_file;
pub mod run_cmd;
pub mod sandbox;
pub mod search_repo;

use codeloop_config::ToolsConfig;
use codeloop_core::tool::ToolRegistry;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use process::{ProcessOutput, ProcessRunner};
pub use sandbox::ProjectRoot;

/// Create the registry with all five built-in tools, rooted at the
/// configured project root.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    registry_for_root(&config.resolved_project_root(), config)
}

/// Same as [`default_registry`], with an explicit project root.
///
/// A relative root is made absolute against the current directory, so
/// subprocesses (which run inside the root) and in-process file access
/// see the same paths.
pub fn registry_for_root(root: &Path, config: &ToolsConfig) -> ToolRegistry {
    let root = absolute_root(root);
    let runner = ProcessRunner::new(&root, Duration::from_millis(config.command_timeout_ms));
    let project = ProjectRoot::new(&root);

    ToolRegistry::new()
        .with(Box::new(search_repo::SearchRepoTool::new(
            runner.clone(),
            &config.ripgrep_program,
            config.search_max_count,
        )))
        .with(Box::new(read_file::ReadFileTool::new(
            project.clone(),
            config.read_max_lines,
        )))
        .with(Box::new(patch_file::PatchFileTool::new(
            project,
            runner.clone(),
            &config.patch_program,
        )))
        .with(Box::new(git_commit::GitCommitTool::new(
            runner.clone(),
            &config.git_program,
        )))
        .with(Box::new(run_cmd::RunCmdTool::new(runner)))
}

/// `root` as an absolute path. Falls back to the input if the current
/// directory is unavailable.
pub fn absolute_root(root: &Path) -> PathBuf {
    std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf())
}
