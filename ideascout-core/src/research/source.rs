//! The source client seam.
//!
//! Implementations live in `ideascout-tools`; the aggregator only sees
//! `Arc<dyn SourceClient>`.

use crate::error::SourceError;
use crate::types::{NormalizedPaper, PaperSource};
use async_trait::async_trait;
use tracing::{debug, warn};

/// What a single source search produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceFetch {
    /// Papers that survived per-item normalization.
    pub papers: Vec<NormalizedPaper>,
    /// Items present in the response before normalization.
    pub raw_items: usize,
}

impl SourceFetch {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A client for one academic database.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Which database this client queries.
    fn source(&self) -> PaperSource;

    /// Query the database. Implementations return `Ok(SourceFetch::empty())`
    /// for empty `terms` without sending a request.
    async fn search(&self, terms: &[String], max_results: usize)
    -> Result<SourceFetch, SourceError>;

    /// Query the database, settling any failure into an empty contribution.
    async fn fetch(&self, terms: &[String], max_results: usize) -> Vec<NormalizedPaper> {
        if terms.is_empty() {
            return Vec::new();
        }
        match self.search(terms, max_results).await {
            Ok(fetch) => {
                debug!(
                    source = %self.source(),
                    raw = fetch.raw_items,
                    kept = fetch.papers.len(),
                    "Source search finished"
                );
                fetch.papers
            }
            Err(e) => {
                warn!(source = %self.source(), error = %e, "Source search failed");
                Vec::new()
            }
        }
    }
}
