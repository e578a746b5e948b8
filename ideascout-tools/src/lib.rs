//! # IdeaScout Tools
//!
//! HTTP clients for the academic databases IdeaScout searches. Each client
//! implements [`ideascout_core::SourceClient`] and normalizes its responses
//! into [`ideascout_core::NormalizedPaper`].

pub mod sources;

pub use sources::arxiv::ArxivClient;
pub use sources::crossref::CrossRefClient;
pub use sources::default_sources;
pub use sources::semantic_scholar::SemanticScholarClient;
