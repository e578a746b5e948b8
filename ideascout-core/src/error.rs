//! Error types for the IdeaScout core library.
//!
//! Uses `thiserror` for public API error types with structured error variants
//! covering AI completion, paper sources, configuration, and request validation.
//! Only [`ResearchError`] ever escapes the research engine; every other
//! variant is recovered locally by the component that produced it.

/// Top-level error type for the IdeaScout core library.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Research error: {0}")]
    Research(#[from] ResearchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the AI completion capability.
///
/// Any of these sends the search term generator down its heuristic path.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },

    #[error("Provider returned an empty completion")]
    EmptyResponse,
}

/// Errors from a single academic source fetch.
///
/// A source client converts these into an empty contribution; they are
/// logged but never propagated past the aggregator.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{source_name} unreachable: {message}")]
    Transport {
        source_name: String,
        message: String,
    },

    #[error("{source_name} timed out after {timeout_secs}s")]
    Timeout {
        source_name: String,
        timeout_secs: u64,
    },

    #[error("{source_name} returned status {code}")]
    Status { source_name: String, code: u16 },

    #[error("{source_name} returned a malformed response: {message}")]
    MalformedEnvelope {
        source_name: String,
        message: String,
    },
}

/// Errors normalizing one item of an otherwise valid source response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ItemError {
    #[error("item has no title")]
    MissingTitle,

    #[error("malformed item: {0}")]
    Malformed(String),
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// Errors surfaced to callers of the research engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResearchError {
    #[error("Invalid research query: {reason}")]
    InvalidQuery { reason: String },
}

/// A type alias for results using the top-level `ScoutError`.
pub type Result<T> = std::result::Result<T, ScoutError>;
