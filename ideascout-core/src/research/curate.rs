//! Deduplication and relevance ranking.
//!
//! Papers are grouped by canonical title; each group keeps one
//! representative. Representatives are scored against the search terms
//! and sorted, best first.
//!
//! Score = 0.70 × term overlap + 0.20 × recency + 0.10 × source trust.

use crate::types::{NormalizedPaper, RankedPaper};
use std::collections::{HashMap, HashSet};

pub const OVERLAP_WEIGHT: f64 = 0.70;
pub const RECENCY_WEIGHT: f64 = 0.20;
pub const TRUST_WEIGHT: f64 = 0.10;

/// Abstract matches count for less than title matches.
pub const ABSTRACT_MATCH_FACTOR: f64 = 0.6;

/// Papers this many years older than the reference year get zero recency.
pub const RECENCY_HORIZON_YEARS: f64 = 20.0;

/// Deduplication key: lowercase, punctuation turned into spaces, whitespace
/// collapsed. "Image-Based" and "Image Based" share a key.
///
/// Titles made only of punctuation fall back to their trimmed lowercase
/// form so they do not all collapse into one group.
pub fn canonical_title(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let canonical = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if canonical.is_empty() {
        title.trim().to_lowercase()
    } else {
        canonical
    }
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// First run of exactly four digits in a date string.
pub fn extract_year(date: &str) -> Option<i32> {
    date.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() == 4)
        .and_then(|run| run.parse().ok())
}

fn abstract_len(paper: &NormalizedPaper) -> usize {
    if paper.has_abstract() {
        paper.abstract_text.chars().count()
    } else {
        0
    }
}

/// Whether `candidate` should replace `current` as a group's representative.
/// Ties keep the paper seen first.
fn is_better_representative(candidate: &NormalizedPaper, current: &NormalizedPaper) -> bool {
    let key = |p: &NormalizedPaper| (p.doi.is_some(), abstract_len(p), p.source.priority());
    key(candidate) > key(current)
}

/// Collapse papers with equal canonical titles, preserving first-seen order.
pub fn deduplicate(papers: Vec<NormalizedPaper>) -> Vec<NormalizedPaper> {
    let mut groups: Vec<NormalizedPaper> = Vec::with_capacity(papers.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for paper in papers {
        let key = canonical_title(&paper.title);
        match index.get(&key) {
            Some(&slot) => {
                if is_better_representative(&paper, &groups[slot]) {
                    groups[slot] = paper;
                }
            }
            None => {
                index.insert(key, groups.len());
                groups.push(paper);
            }
        }
    }
    groups
}

/// Ranks papers against a fixed set of search terms.
pub struct Curator {
    term_words: Vec<Vec<String>>,
    reference_year: i32,
}

impl Curator {
    /// `reference_year` anchors the recency signal; pass the current year.
    pub fn new(terms: &[String], reference_year: i32) -> Self {
        let term_words = terms
            .iter()
            .map(|t| {
                let mut words: Vec<String> = Vec::new();
                for w in t.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
                    if !w.is_empty() && !words.iter().any(|x| x == w) {
                        words.push(w.to_string());
                    }
                }
                words
            })
            .filter(|words| !words.is_empty())
            .collect();
        Self {
            term_words,
            reference_year,
        }
    }

    /// Mean per-term match fraction in `[0, 1]`.
    pub fn overlap(&self, paper: &NormalizedPaper) -> f64 {
        if self.term_words.is_empty() {
            return 0.0;
        }
        let title = word_set(&paper.title);
        let abstract_words = if paper.has_abstract() {
            word_set(&paper.abstract_text)
        } else {
            HashSet::new()
        };

        let total: f64 = self
            .term_words
            .iter()
            .map(|words| {
                let n = words.len() as f64;
                let in_title = words.iter().filter(|w| title.contains(*w)).count() as f64 / n;
                let in_abstract =
                    words.iter().filter(|w| abstract_words.contains(*w)).count() as f64 / n;
                in_title.max(ABSTRACT_MATCH_FACTOR * in_abstract)
            })
            .sum();
        total / self.term_words.len() as f64
    }

    pub fn recency(&self, paper: &NormalizedPaper) -> f64 {
        match extract_year(&paper.published_date) {
            Some(year) => {
                let age = f64::from(self.reference_year - year);
                (1.0 - age / RECENCY_HORIZON_YEARS).clamp(0.0, 1.0)
            }
            None => 0.0,
        }
    }

    pub fn score(&self, paper: &NormalizedPaper) -> f64 {
        OVERLAP_WEIGHT * self.overlap(paper)
            + RECENCY_WEIGHT * self.recency(paper)
            + TRUST_WEIGHT * paper.source.trust_weight()
    }

    /// Deduplicate, score, sort best first and keep at most `max_results`.
    pub fn curate(&self, papers: Vec<NormalizedPaper>, max_results: usize) -> Vec<RankedPaper> {
        let mut ranked: Vec<RankedPaper> = deduplicate(papers)
            .into_iter()
            .map(|paper| RankedPaper {
                relevance_score: self.score(&paper),
                paper,
            })
            .collect();
        // Stable: equal scores keep first-seen order.
        ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        ranked.truncate(max_results);
        ranked
    }
}
