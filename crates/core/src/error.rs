//! Error types for the codeloop domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Model-service failures are fatal for the call that produced them;
//! tool failures are recoverable and end up in the step's conversation.

use thiserror::Error;

/// The top-level error type for all codeloop operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors raised by tools. The agent loop renders these as `ERROR: <display>`
/// tool messages, so the display text is written for the model to read.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool {0}")]
    NotFound(String),

    #[error("Invalid tool arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Tool execution failed in {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Command failed in {tool_name} (exit code {exit_code}): {output}")]
    CommandFailed {
        tool_name: String,
        exit_code: i32,
        output: String,
    },

    #[error("Sandbox violation: {0}")]
    SandboxViolation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 503,
            message: "model is loading".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("model is loading"));
    }

    #[test]
    fn config_error_carries_message() {
        let err = Error::config("project root ./missing is not a directory");
        assert_eq!(
            err.to_string(),
            "Configuration error: project root ./missing is not a directory"
        );
    }

    #[test]
    fn unknown_tool_display_is_model_readable() {
        let err = ToolError::NotFound("delete_repo".into());
        assert_eq!(err.to_string(), "unknown tool delete_repo");
    }

    #[test]
    fn command_failure_carries_exit_code() {
        let err = Error::Tool(ToolError::CommandFailed {
            tool_name: "patch_file".into(),
            exit_code: 1,
            output: "Hunk #1 FAILED".into(),
        });
        assert!(err.to_string().contains("exit code 1"));
        assert!(err.to_string().contains("Hunk #1 FAILED"));
    }
}
