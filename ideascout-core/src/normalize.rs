//! Shared normalization helpers used by every source client.

use crate::error::ItemError;
use crate::types::{NormalizedPaper, PaperSource};

/// Marker substituted when a source has no abstract for a paper.
pub const NO_ABSTRACT: &str = "No abstract available";

/// Marker substituted when a source has no publication date.
pub const UNKNOWN_DATE: &str = "Unknown";

/// Maximum abstract length in characters, ellipsis included.
pub const MAX_ABSTRACT_CHARS: usize = 500;

const ELLIPSIS: &str = "...";

/// Collapse runs of whitespace into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize an optional abstract: collapse whitespace, truncate to
/// [`MAX_ABSTRACT_CHARS`] with a trailing ellipsis, or return the marker.
pub fn normalize_abstract(raw: Option<&str>) -> String {
    let text = raw.map(normalize_whitespace).unwrap_or_default();
    if text.is_empty() {
        return NO_ABSTRACT.to_string();
    }
    if text.chars().count() <= MAX_ABSTRACT_CHARS {
        return text;
    }
    let keep = MAX_ABSTRACT_CHARS - ELLIPSIS.len();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Remove XML/HTML tags (CrossRef abstracts arrive as JATS markup).
pub fn strip_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Validate a title, returning the whitespace-normalized form.
pub fn require_title(raw: Option<&str>) -> Result<String, ItemError> {
    let title = raw.map(normalize_whitespace).unwrap_or_default();
    if title.is_empty() {
        Err(ItemError::MissingTitle)
    } else {
        Ok(title)
    }
}

/// Keep successfully normalized items, dropping and counting the rest.
pub fn collect_items<I>(source: PaperSource, items: I) -> Vec<NormalizedPaper>
where
    I: IntoIterator<Item = Result<NormalizedPaper, ItemError>>,
{
    let mut papers = Vec::new();
    let mut missing_title = 0usize;
    let mut malformed = 0usize;
    for item in items {
        match item {
            Ok(paper) => papers.push(paper),
            Err(ItemError::MissingTitle) => missing_title += 1,
            Err(ItemError::Malformed(reason)) => {
                tracing::trace!(source = %source, reason = %reason, "Skipping malformed item");
                malformed += 1;
            }
        }
    }
    if missing_title + malformed > 0 {
        tracing::debug!(
            source = %source,
            kept = papers.len(),
            missing_title,
            malformed,
            "Dropped unusable items"
        );
    }
    papers
}
