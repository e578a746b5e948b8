//! Paper research pipeline.
//!
//! 1. **Terms** turn the idea into 1–5 search terms (AI, else heuristic)
//! 2. **Aggregate** query every source concurrently under one budget
//! 3. **Curate** deduplicate by canonical title and rank by relevance

pub mod aggregator;
pub mod curate;
pub mod engine;
pub mod source;
pub mod terms;

pub use aggregator::{Aggregation, Aggregator};
pub use curate::{Curator, canonical_title};
pub use engine::ResearchEngine;
pub use source::{SourceClient, SourceFetch};
pub use terms::SearchTermGenerator;
