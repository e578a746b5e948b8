//! # IdeaScout Core
//!
//! Core library for IdeaScout, which finds academic papers relevant to a
//! startup idea. Provides the data model, configuration, the AI completion
//! interface, and the research pipeline (term generation, source fan-out,
//! deduplication and ranking).

pub mod brain;
pub mod config;
pub mod error;
pub mod normalize;
pub mod providers;
pub mod research;
pub mod types;

// Re-export commonly used types at the crate root.
pub use brain::{CompletionProvider, CompletionRequest, CompletionResponse, MockCompletionProvider};
pub use config::{LlmConfig, ResearchConfig, ScoutConfig, SourceEndpoints};
pub use error::{
    ConfigError, ItemError, LlmError, ResearchError, Result, ScoutError, SourceError,
};
pub use research::{ResearchEngine, SearchTermGenerator, SourceClient, SourceFetch};
pub use types::{
    AggregationResult, NormalizedPaper, PaperSource, RankedPaper, ResearchQuery, SourceOutcome,
    SourceStatus,
};
