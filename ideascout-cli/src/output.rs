//! Plain-text rendering of research results.

use ideascout_core::{AggregationResult, RankedPaper, SourceStatus};
use std::fmt::Write;

const MAX_LISTED_AUTHORS: usize = 3;

fn authors_line(paper: &RankedPaper) -> String {
    let authors = &paper.paper.authors;
    if authors.is_empty() {
        return "Unknown authors".to_string();
    }
    let mut line = authors
        .iter()
        .take(MAX_LISTED_AUTHORS)
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > MAX_LISTED_AUTHORS {
        let _ = write!(line, " (+{} more)", authors.len() - MAX_LISTED_AUTHORS);
    }
    line
}

/// Render a result as a numbered list followed by a per-source summary.
pub fn render_result(result: &AggregationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Search terms: {}", result.search_terms_used.join(", "));
    let _ = writeln!(out);

    if result.papers.is_empty() {
        let _ = writeln!(out, "No papers found.");
    }

    for (i, ranked) in result.papers.iter().enumerate() {
        let paper = &ranked.paper;
        let _ = writeln!(
            out,
            "{:>2}. [{:.2}] {}",
            i + 1,
            ranked.relevance_score,
            paper.title
        );
        let _ = writeln!(
            out,
            "    {} | {} | {}",
            authors_line(ranked),
            paper.published_date,
            paper.source
        );
        let _ = writeln!(out, "    {}", paper.url);
        if let Some(doi) = &paper.doi {
            let _ = writeln!(out, "    doi:{}", doi);
        }
    }

    if !result.sources.is_empty() {
        let _ = writeln!(out);
        let summary = result
            .sources
            .iter()
            .map(|s| match s.status {
                SourceStatus::Completed => format!("{} {}", s.source, s.papers),
                SourceStatus::TimedOut => format!("{} timed out", s.source),
                SourceStatus::Failed => format!("{} failed", s.source),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Sources: {}", summary);
    }
    out
}
