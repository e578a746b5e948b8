//! AI completion provider implementations.
//!
//! Only OpenAI-compatible chat completion endpoints are supported (OpenAI,
//! Azure, Ollama, vLLM, LM Studio). Use `create_provider()` to instantiate
//! from config.

pub mod openai_compat;

use crate::brain::CompletionProvider;
use crate::config::LlmConfig;
use crate::error::LlmError;
use std::sync::Arc;

pub use openai_compat::OpenAiCompatibleProvider;

/// Create a completion provider based on the configuration.
///
/// Every provider name routes to `OpenAiCompatibleProvider`; the name is
/// informational. Returns `Ok(None)` when AI term generation is disabled,
/// and an error when the provider cannot be initialized (typically a
/// missing API key). Callers treat both as "AI unavailable".
pub fn create_provider(config: &LlmConfig) -> Result<Option<Arc<dyn CompletionProvider>>, LlmError> {
    if !config.enabled {
        return Ok(None);
    }
    Ok(Some(Arc::new(OpenAiCompatibleProvider::new(config)?)))
}
