//! # codeloop core
//!
//! Domain types, traits, and error definitions for the codeloop
//! planner/executor agent. This crate has **no I/O of its own**: it
//! defines the model that the provider, tool and agent crates implement
//! against.
//!
//! ## Design Philosophy
//!
//! The two side-effecting seams (the reasoning service and the tools)
//! are traits here. Implementations live in their own crates, so the
//! agent loop can be driven by scripted providers and fake tools in tests.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolArgs, ToolCall, ToolRegistry, parse_arguments};
