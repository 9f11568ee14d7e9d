//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are how the executor acts on the project: search it, read
//! ranges of files, apply patches, commit, or run commands.
//!
//! Arguments arrive loosely typed (a JSON object) and every tool narrows
//! them into its own struct on entry via [`parse_arguments`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::error::ToolError;
use crate::message::MessageToolCall;
use crate::provider::ToolDefinition;

/// The loosely typed argument map handed to a tool.
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool call id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

impl From<&MessageToolCall> for ToolCall {
    fn from(call: &MessageToolCall) -> Self {
        Self {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        }
    }
}

/// The core Tool trait.
///
/// Each adapter (search_repo, read_file, patch_file, git_commit, run_cmd)
/// implements this trait and is registered once, at startup.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "run_cmd", "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool. The returned value is serialized into the
    /// conversation by the agent loop.
    async fn execute(&self, arguments: ToolArgs) -> Result<serde_json::Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Narrow a loose argument map into a tool's typed argument struct.
pub fn parse_arguments<T: DeserializeOwned>(tool_name: &str, arguments: ToolArgs) -> Result<T, ToolError> {
    serde_json::from_value(serde_json::Value::Object(arguments)).map_err(|e| {
        ToolError::InvalidArguments {
            tool_name: tool_name.to_string(),
            reason: e.to_string(),
        }
    })
}

/// A read-only registry of available tools.
///
/// Built once at startup, then shared behind an `Arc`; the agent loop
/// only ever reads from it. Tools are kept ordered by name so the
/// advertisement sent to the model is stable.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Builder-style registration.
    pub fn with(mut self, tool: Box<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Get all tool definitions (for sending to the model).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool call.
    ///
    /// `null` arguments count as an empty map; any other non-object value
    /// is rejected before the tool runs.
    pub async fn execute(&self, call: &ToolCall) -> Result<serde_json::Value, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        let arguments = match &call.arguments {
            serde_json::Value::Object(map) => map.clone(),
            serde_json::Value::Null => ToolArgs::new(),
            other => {
                return Err(ToolError::InvalidArguments {
                    tool_name: call.name.clone(),
                    reason: format!("expected an object, got {other}"),
                });
            }
        };

        tool.execute(arguments).await
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
