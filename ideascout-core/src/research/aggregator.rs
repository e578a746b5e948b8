//! Concurrent fan-out over all source clients.
//!
//! One task per source, all racing a single wall-clock deadline. Each task
//! owns its inputs and returns its own result; the merge happens afterwards
//! on the calling task, in registration order.

use super::source::SourceClient;
use crate::types::{NormalizedPaper, SourceOutcome, SourceStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Raw, not yet deduplicated output of one fan-out.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub papers: Vec<NormalizedPaper>,
    pub outcomes: Vec<SourceOutcome>,
}

/// Runs every registered source concurrently under one budget.
pub struct Aggregator {
    sources: Vec<Arc<dyn SourceClient>>,
    budget: Duration,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn SourceClient>>, budget: Duration) -> Self {
        Self { sources, budget }
    }

    /// Query all sources and concatenate their papers.
    ///
    /// Sources still running when the budget expires are aborted and
    /// contribute nothing, as does a source whose task panics. Dropping the
    /// returned future aborts every source task still in flight.
    pub async fn aggregate(&self, terms: &[String], per_source_max: usize) -> Aggregation {
        let deadline = Instant::now() + self.budget;

        let mut tasks = JoinSet::new();
        let mut task_slots = HashMap::with_capacity(self.sources.len());
        for (slot, client) in self.sources.iter().enumerate() {
            let client = Arc::clone(client);
            let terms = terms.to_vec();
            let handle = tasks.spawn(async move {
                let papers = client.fetch(&terms, per_source_max).await;
                (slot, papers)
            });
            task_slots.insert(handle.id(), slot);
        }

        let mut finished: Vec<Option<(SourceStatus, Vec<NormalizedPaper>)>> =
            vec![None; self.sources.len()];

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(None) => break,
                Ok(Some(Ok((slot, papers)))) => {
                    finished[slot] = Some((SourceStatus::Completed, papers));
                }
                Ok(Some(Err(e))) => {
                    if let Some(&slot) = task_slots.get(&e.id()) {
                        let source = self.sources[slot].source();
                        warn!(source = %source, error = %e, "Source task failed");
                        finished[slot] = Some((SourceStatus::Failed, Vec::new()));
                    }
                }
                Err(_) => {
                    tasks.abort_all();
                    break;
                }
            }
        }

        let mut aggregation = Aggregation {
            papers: Vec::new(),
            outcomes: Vec::with_capacity(self.sources.len()),
        };

        for (client, outcome) in self.sources.iter().zip(finished) {
            let source = client.source();
            let (status, papers) = outcome.unwrap_or_else(|| {
                warn!(
                    source = %source,
                    budget_secs = self.budget.as_secs_f64(),
                    "Source exceeded the aggregation budget; cancelled"
                );
                (SourceStatus::TimedOut, Vec::new())
            });
            aggregation.outcomes.push(SourceOutcome {
                source,
                status,
                papers: papers.len(),
            });
            aggregation.papers.extend(papers);
        }

        debug!(
            sources = aggregation.outcomes.len(),
            papers = aggregation.papers.len(),
            "Aggregation finished"
        );
        aggregation
    }
}
