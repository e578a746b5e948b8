//! AI completion interface.
//!
//! The term generator only needs one-shot text completion, so the seam is a
//! single `complete` call over a system prompt and a user prompt.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A one-shot completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

/// Token accounting reported by the provider, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

/// The provider's reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    pub model: String,
    #[serde(default)]
    pub usage: TokenUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Trait for AI completion providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Perform a full completion and return the response.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Return the model name.
    fn model_name(&self) -> &str;
}

/// A scripted provider for tests.
///
/// Replies are consumed in order; once the queue is empty every call fails
/// with [`LlmError::Connection`].
pub struct MockCompletionProvider {
    model: String,
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicUsize,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a provider that answers the first call with `text`.
    pub fn with_response(text: &str) -> Self {
        let provider = Self::new();
        provider.queue_response(text);
        provider
    }

    /// Create a provider whose first call fails.
    pub fn failing(error: LlmError) -> Self {
        let provider = Self::new();
        provider.queue_error(error);
        provider
    }

    pub fn queue_response(&self, text: &str) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Ok(text.to_string()));
        }
    }

    pub fn queue_error(&self, error: LlmError) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(Err(error));
        }
    }

    /// Number of `complete` calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCompletionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());
        match next {
            Some(Ok(text)) => Ok(CompletionResponse {
                text,
                model: self.model.clone(),
                usage: TokenUsage {
                    input_tokens: 60,
                    output_tokens: 20,
                },
                finish_reason: Some("stop".to_string()),
            }),
            Some(Err(e)) => Err(e),
            None => Err(LlmError::Connection {
                message: "mock provider has no queued replies".to_string(),
            }),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
