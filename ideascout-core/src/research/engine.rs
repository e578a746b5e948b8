//! Research engine: idea in, ranked papers out.

use super::aggregator::Aggregator;
use super::curate::Curator;
use super::source::SourceClient;
use super::terms::SearchTermGenerator;
use crate::brain::CompletionProvider;
use crate::config::ScoutConfig;
use crate::error::ResearchError;
use crate::types::{AggregationResult, ResearchQuery};
use chrono::{Datelike, Utc};
use std::sync::Arc;
use tracing::info;

/// Wires term generation, fan-out and curation into one call.
pub struct ResearchEngine {
    generator: SearchTermGenerator,
    aggregator: Aggregator,
    max_results_ceiling: usize,
}

impl ResearchEngine {
    /// Create an engine. With no provider, terms come from the heuristic.
    pub fn new(
        config: &ScoutConfig,
        provider: Option<Arc<dyn CompletionProvider>>,
        sources: Vec<Arc<dyn SourceClient>>,
    ) -> Self {
        let generator = SearchTermGenerator::new(provider)
            .with_sampling(config.llm.temperature, config.llm.max_tokens);
        Self {
            generator,
            aggregator: Aggregator::new(sources, config.research.aggregation_budget()),
            max_results_ceiling: config.research.max_results_ceiling,
        }
    }

    pub fn ai_enabled(&self) -> bool {
        self.generator.has_provider()
    }

    /// Generate search terms only.
    pub async fn generate_terms(&self, idea_text: &str) -> Vec<String> {
        self.generator.generate(idea_text).await
    }

    /// Find and rank papers relevant to an idea.
    ///
    /// Fails only on invalid input. Source failures and timeouts shrink the
    /// result; an empty result is still `Ok`.
    pub async fn research_papers(
        &self,
        idea_text: &str,
        max_results: usize,
    ) -> Result<AggregationResult, ResearchError> {
        let query = ResearchQuery::new(idea_text, max_results, self.max_results_ceiling)?;
        Ok(self.run(&query, Utc::now().year()).await)
    }

    /// Run a validated query, ranking recency against `reference_year`.
    pub async fn run(&self, query: &ResearchQuery, reference_year: i32) -> AggregationResult {
        let terms = self.generator.generate(&query.idea_text).await;
        let aggregation = self.aggregator.aggregate(&terms, query.max_results).await;
        let raw_count = aggregation.papers.len();

        let curator = Curator::new(&terms, reference_year);
        let papers = curator.curate(aggregation.papers, query.max_results);

        info!(
            terms = terms.len(),
            raw_papers = raw_count,
            returned = papers.len(),
            "Research request completed"
        );

        AggregationResult {
            papers,
            search_terms_used: terms,
            sources: aggregation.outcomes,
        }
    }
}
