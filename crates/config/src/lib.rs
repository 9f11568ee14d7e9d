//! Configuration loading, validation, and management for codeloop.
//!
//! Loads configuration from `~/.codeloop/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.codeloop/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which reasoning service to talk to ("ollama", "openai", "openrouter", ...)
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL override for the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// API key (not needed for a local Ollama)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request HTTP timeout for the model service
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Planner/executor loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Tool and process settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_model() -> String {
    "mistral:7b".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_request_timeout_secs() -> u64 {
    120
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Model calls allowed per step before it is abandoned
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Tool results are cut to this many characters before entering the conversation
    #[serde(default = "default_tool_result_limit")]
    pub tool_result_limit: usize,

    #[serde(default = "default_planner_prompt")]
    pub planner_prompt: String,

    #[serde(default = "default_executor_prompt")]
    pub executor_prompt: String,
}

fn default_max_attempts() -> u32 {
    6
}
fn default_tool_result_limit() -> usize {
    1000
}
fn default_planner_prompt() -> String {
    "You are a senior software planner. Break the task into numbered executable steps.".into()
}
fn default_executor_prompt() -> String {
    "You are an execution agent. Use tool calls to complete the step. End with a short confirmation when done.".into()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            tool_result_limit: default_tool_result_limit(),
            planner_prompt: default_planner_prompt(),
            executor_prompt: default_executor_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Directory every tool is confined to. Defaults to the current directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,

    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    #[serde(default = "default_search_max_count")]
    pub search_max_count: usize,

    #[serde(default = "default_read_max_lines")]
    pub read_max_lines: usize,

    #[serde(default = "default_ripgrep_program")]
    pub ripgrep_program: String,

    #[serde(default = "default_patch_program")]
    pub patch_program: String,

    #[serde(default = "default_git_program")]
    pub git_program: String,
}

fn default_command_timeout_ms() -> u64 {
    60_000
}
fn default_search_max_count() -> usize {
    50
}
fn default_read_max_lines() -> usize {
    400
}
fn default_ripgrep_program() -> String {
    "rg".into()
}
fn default_patch_program() -> String {
    "patch".into()
}
fn default_git_program() -> String {
    "git".into()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            command_timeout_ms: default_command_timeout_ms(),
            search_max_count: default_search_max_count(),
            read_max_lines: default_read_max_lines(),
            ripgrep_program: default_ripgrep_program(),
            patch_program: default_patch_program(),
            git_program: default_git_program(),
        }
    }
}

impl ToolsConfig {
    /// The project root, falling back to the process working directory.
    pub fn resolved_project_root(&self) -> PathBuf {
        self.project_root
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.codeloop/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply environment overrides and validate.
    ///
    /// Environment variables:
    /// - `CODELOOP_PROVIDER`, `CODELOOP_MODEL`, `CODELOOP_API_URL`
    /// - `CODELOOP_API_KEY`, falling back to `OPENAI_API_KEY` / `OPENROUTER_API_KEY`
    /// - `CODELOOP_PROJECT_ROOT`
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = var("CODELOOP_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = var("CODELOOP_MODEL") {
            self.model = model;
        }
        if let Some(url) = var("CODELOOP_API_URL") {
            self.api_url = Some(url);
        }
        if self.api_key.is_none() {
            self.api_key = var("CODELOOP_API_KEY")
                .or_else(|| var("OPENAI_API_KEY"))
                .or_else(|| var("OPENROUTER_API_KEY"));
        }
        if let Some(root) = var("CODELOOP_PROJECT_ROOT") {
            self.tools.project_root = Some(PathBuf::from(root));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".codeloop")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }
        if self.agent.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_attempts must be at least 1".into(),
            ));
        }
        if self.agent.tool_result_limit == 0 {
            return Err(ConfigError::ValidationError(
                "agent.tool_result_limit must be at least 1".into(),
            ));
        }
        if self.tools.command_timeout_ms == 0 || self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_url: None,
            api_key: None,
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            agent: AgentSettings::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
