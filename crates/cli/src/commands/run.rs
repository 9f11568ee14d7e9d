//! Run one task: load config, wire provider/tools/agent, print the transcript.

use std::path::PathBuf;
use std::sync::Arc;
use codeloop_agent::AgentLoop;
use codeloop_config::AppConfig;
use codeloop_core::Error;
use codeloop_core::event::EventBus;
use tracing::info;
use super::printer;

pub struct RunOptions {
    pub task: String,
    pub config_path: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub max_attempts: Option<u32>,
}

fn load_config(options: &RunOptions) -> codeloop_core::Result<AppConfig> {
    let mut config = match &options.config_path {
        Some(path) => AppConfig::load_with_overrides(path),
        None => AppConfig::load(),
    }
    .map_err(|e| Error::config(format!("Failed to load config: {e}")))?;

    if let Some(root) = &options.root {
        config.tools.project_root = Some(root.clone());
    }
    if let Some(model) = &options.model {
        config.model = model.clone();
    }
    if let Some(provider) = &options.provider {
        config.provider = provider.clone();
    }
    if let Some(max) = options.max_attempts {
        config.agent.max_attempts = max;
    }
    config.validate().map_err(|e| Error::config(e.to_string()))?;
    Ok(config)
}

/// The configured project root, absolute and checked to be a directory.
fn project_root(config: &AppConfig) -> codeloop_core::Result<PathBuf> {
    let root = codeloop_tools::absolute_root(&config.tools.resolved_project_root());
    if !root.is_dir() {
        return Err(Error::config(format!(
            "project root {} is not a directory",
            root.display()
        )));
    }
    Ok(root)
}

pub async fn run(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let task = options.task.trim();
    if task.is_empty() {
        return Err("task must not be empty".into());
    }

    let config = load_config(&options)?;
    let root = project_root(&config)?;

    info!(
        provider = %config.provider,
        model = %config.model,
        root = %root.display(),
        "Starting codeloop"
    );

    let provider = codeloop_providers::build_from_config(&config)?;
    let tools = Arc::new(codeloop_tools::registry_for_root(&root, &config.tools));
    let agent = AgentLoop::from_config(&config, provider, tools, Arc::new(EventBus::default()));

    let report = agent.run(task).await?;
    let exhausted = report.exhausted_steps().count();
    if exhausted > 0 {
        info!(exhausted, total = report.steps.len(), "Some steps ran out of attempts");
    }

    printer::print(&printer::transcript(&report));
    Ok(())
}
