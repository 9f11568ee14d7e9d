//! Model service clients for codeloop.
//!
//! All providers implement the `codeloop_core::Provider` trait.
//! `build_from_config` selects one based on configuration.

pub mod ollama;
pub mod openai_compat;
pub mod router;

pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
