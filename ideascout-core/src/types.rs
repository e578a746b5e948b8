//! Core data model shared by the term generator, the source clients and the
//! curator.
//!
//! Every entity here lives for a single research request. Source-specific
//! response shapes are normalized into [`NormalizedPaper`] at the source
//! client boundary, so nothing downstream branches on the source except the
//! duplicate tie-break and the trust weight.

use crate::error::ResearchError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The academic database a paper came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperSource {
    SemanticScholar,
    Arxiv,
    #[serde(rename = "crossref")]
    CrossRef,
}

impl PaperSource {
    /// All sources, in the order the aggregator registers them.
    pub const ALL: [PaperSource; 3] = [
        PaperSource::SemanticScholar,
        PaperSource::Arxiv,
        PaperSource::CrossRef,
    ];

    /// Human-readable source name used in logs and CLI output.
    pub fn display_name(&self) -> &'static str {
        match self {
            PaperSource::SemanticScholar => "Semantic Scholar",
            PaperSource::Arxiv => "arXiv",
            PaperSource::CrossRef => "CrossRef",
        }
    }

    /// Duplicate tie-break priority (higher wins).
    ///
    /// Semantic Scholar carries the richest structured metadata, CrossRef
    /// the most authoritative bibliographic data, arXiv the least curated.
    pub fn priority(&self) -> u8 {
        match self {
            PaperSource::SemanticScholar => 3,
            PaperSource::CrossRef => 2,
            PaperSource::Arxiv => 1,
        }
    }

    /// Trust weight in `[0, 1]` used as the ranker's tertiary signal.
    pub fn trust_weight(&self) -> f64 {
        match self {
            PaperSource::SemanticScholar => 1.0,
            PaperSource::CrossRef => 0.8,
            PaperSource::Arxiv => 0.6,
        }
    }
}

impl fmt::Display for PaperSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A paper normalized from any source into one fixed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPaper {
    /// Paper title; never empty.
    pub title: String,
    /// Author display names, in source order.
    pub authors: Vec<String>,
    /// Abstract, at most 500 characters, or the "no abstract" marker.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Publication date in the source's native format.
    pub published_date: String,
    pub source: PaperSource,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
}

impl NormalizedPaper {
    /// Whether the abstract is real text rather than the absent marker.
    pub fn has_abstract(&self) -> bool {
        self.abstract_text != crate::normalize::NO_ABSTRACT
    }
}

/// A curated paper with its relevance score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPaper {
    #[serde(flatten)]
    pub paper: NormalizedPaper,
    pub relevance_score: f64,
}

/// A validated research request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchQuery {
    pub idea_text: String,
    pub max_results: usize,
}

impl ResearchQuery {
    /// Validate a request, clamping `max_results` to `ceiling`.
    ///
    /// Empty idea text and a zero result count are caller errors.
    pub fn new(
        idea_text: &str,
        max_results: usize,
        ceiling: usize,
    ) -> Result<Self, ResearchError> {
        let idea_text = idea_text.trim();
        if idea_text.is_empty() {
            return Err(ResearchError::InvalidQuery {
                reason: "idea text is empty".to_string(),
            });
        }
        if max_results == 0 {
            return Err(ResearchError::InvalidQuery {
                reason: "max_results must be greater than zero".to_string(),
            });
        }
        let capped = max_results.min(ceiling.max(1));
        if capped < max_results {
            tracing::debug!(
                requested = max_results,
                ceiling = capped,
                "Clamping max_results to configured ceiling"
            );
        }
        Ok(Self {
            idea_text: idea_text.to_string(),
            max_results: capped,
        })
    }
}

/// How a source's task settled during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// The fetch finished (possibly with zero papers).
    Completed,
    /// The aggregation budget expired first; the task was cancelled.
    TimedOut,
    /// The task panicked.
    Failed,
}

/// Per-source contribution to one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub source: PaperSource,
    pub status: SourceStatus,
    pub papers: usize,
}

/// The result of one research request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// Ranked papers, scores non-increasing, at most `max_results`.
    pub papers: Vec<RankedPaper>,
    pub search_terms_used: Vec<String>,
    #[serde(default)]
    pub sources: Vec<SourceOutcome>,
}
