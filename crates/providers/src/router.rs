//! Provider selection from configuration.

use std::sync::Arc;
use std::time::Duration;
use codeloop_config::AppConfig;
use codeloop_core::error::ProviderError;
use codeloop_core::provider::Provider;
use crate::ollama::{self, OllamaProvider};
use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// `ollama` uses the native chat endpoint; every other name is treated
/// as an OpenAI-compatible service.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let name = config.provider.as_str();

    if name == "ollama" {
        let base_url = config
            .api_url
            .clone()
            .unwrap_or_else(|| ollama::DEFAULT_BASE_URL.into());
        return Ok(Arc::new(OllamaProvider::new(base_url, timeout)?));
    }

    let base_url = match &config.api_url {
        Some(url) => url.clone(),
        None => default_base_url(name).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "unknown provider '{name}': set api_url to use it as an OpenAI-compatible endpoint"
            ))
        })?,
    };

    let api_key = config.api_key.clone().unwrap_or_default();
    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key, timeout)?))
}

/// Get the default base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1",
        "openai" => "https://api.openai.com/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.into())
}
