//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory, called once at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod huggingface;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and the API token.
///
/// `api_key` is sourced from `HUGGINGFACEHUB_API_TOKEN` (never TOML).
/// Providers that need it fail here rather than on the first request.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "huggingface" => {
            let hf = &config.huggingface;
            let api_key = api_key
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| ProviderError::MissingCredential(config.provider.clone()))?;
            let p = huggingface::HuggingFaceProvider::new(
                hf.api_base_url.clone(),
                hf.repo_id.clone(),
                hf.temperature,
                hf.max_new_tokens,
                hf.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::HuggingFace(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}
