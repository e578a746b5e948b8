//! Semantic Scholar Graph API client.

use super::{fetch_text, http_client, malformed};
use async_trait::async_trait;
use ideascout_core::config::ResearchConfig;
use ideascout_core::normalize::{UNKNOWN_DATE, collect_items, normalize_abstract, require_title};
use ideascout_core::{ItemError, NormalizedPaper, PaperSource, SourceClient, SourceError, SourceFetch};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

const SEARCH_FIELDS: &str = "title,authors,abstract,year,url,externalIds";
const PAPER_PAGE_BASE: &str = "https://www.semanticscholar.org/paper";

/// The API caps a search page well above this; larger pages just slow it down.
pub const MAX_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    paper_id: Option<String>,
    title: Option<String>,
    authors: Option<Vec<S2Author>>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    year: Option<i64>,
    url: Option<String>,
    external_ids: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    name: Option<String>,
}

/// Build the paper search URL. The query is the first two terms.
pub fn build_search_url(base: &str, terms: &[String], max_results: usize) -> String {
    let query = terms.iter().take(2).map(String::as_str).collect::<Vec<_>>().join(" ");
    format!(
        "{}/paper/search?query={}&limit={}&fields={}&sort=relevance",
        base.trim_end_matches('/'),
        urlencoding::encode(&query),
        max_results.clamp(1, MAX_LIMIT),
        SEARCH_FIELDS,
    )
}

fn normalize_item(item: Value) -> Result<NormalizedPaper, ItemError> {
    let paper: S2Paper =
        serde_json::from_value(item).map_err(|e| ItemError::Malformed(e.to_string()))?;
    let title = require_title(paper.title.as_deref())?;

    let url = match (paper.url.filter(|u| !u.trim().is_empty()), paper.paper_id) {
        (Some(url), _) => url,
        (None, Some(id)) if !id.trim().is_empty() => format!("{}/{}", PAPER_PAGE_BASE, id),
        _ => return Err(ItemError::Malformed("no url or paperId".to_string())),
    };

    let doi = paper
        .external_ids
        .as_ref()
        .and_then(|ids| ids.get("DOI"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(NormalizedPaper {
        title,
        authors: paper
            .authors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.name)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect(),
        abstract_text: normalize_abstract(paper.abstract_text.as_deref()),
        published_date: paper
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| UNKNOWN_DATE.to_string()),
        source: PaperSource::SemanticScholar,
        url,
        doi,
    })
}

/// Parse a search response body. A missing `data` field means no results.
pub fn parse_search_response(body: &str) -> Result<SourceFetch, SourceError> {
    let mut envelope: Value = serde_json::from_str(body)
        .map_err(|e| malformed(PaperSource::SemanticScholar, format!("invalid JSON: {}", e)))?;
    let items = match envelope.get_mut("data").map(Value::take) {
        None | Some(Value::Null) => return Ok(SourceFetch::empty()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(malformed(
                PaperSource::SemanticScholar,
                "`data` is not an array",
            ));
        }
    };
    let raw_items = items.len();
    let papers = collect_items(
        PaperSource::SemanticScholar,
        items.into_iter().map(normalize_item),
    );
    Ok(SourceFetch { papers, raw_items })
}

/// Semantic Scholar paper search.
pub struct SemanticScholarClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl SemanticScholarClient {
    pub fn new(config: &ResearchConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(
                PaperSource::SemanticScholar,
                config.per_source_timeout(),
                &config.user_agent,
            )?,
            base_url: config.endpoints.semantic_scholar.clone(),
            api_key: config
                .semantic_scholar_api_key
                .clone()
                .filter(|k| !k.trim().is_empty()),
            timeout_secs: config.per_source_timeout_secs,
        })
    }
}

#[async_trait]
impl SourceClient for SemanticScholarClient {
    fn source(&self) -> PaperSource {
        PaperSource::SemanticScholar
    }

    async fn search(
        &self,
        terms: &[String],
        max_results: usize,
    ) -> Result<SourceFetch, SourceError> {
        if terms.is_empty() {
            return Ok(SourceFetch::empty());
        }
        let url = build_search_url(&self.base_url, terms, max_results);
        debug!(url = %url, "Semantic Scholar search");

        let mut request = self.client.get(&url);
        if let Some(ref key) = self.api_key {
            request = request.header("x-api-key", key);
        }
        let body = fetch_text(PaperSource::SemanticScholar, self.timeout_secs, request).await?;
        parse_search_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ideascout_core::normalize::NO_ABSTRACT;
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = r#"{
        "total": 3,
        "offset": 0,
        "data": [
            {
                "paperId": "abc123",
                "title": "Deep  Learning for\nPlant Disease Detection",
                "authors": [{"authorId": "1", "name": "S. P. Mohanty"}, {"authorId": null, "name": null}],
                "abstract": "We train a CNN on leaf images.",
                "year": 2016,
                "url": "https://www.semanticscholar.org/paper/abc123",
                "externalIds": {"DOI": "10.3389/fpls.2016.01419", "CorpusId": 12345}
            },
            {
                "paperId": "def456",
                "title": "Crop Yield Prediction",
                "authors": null,
                "abstract": null,
                "year": null,
                "url": null,
                "externalIds": null
            },
            { "paperId": "ghi789", "title": "   ", "year": 2020 }
        ]
    }"#;

    #[test]
    fn test_build_search_url() {
        let terms = vec![
            "computer vision".to_string(),
            "crop disease".to_string(),
            "ignored".to_string(),
        ];
        let url = build_search_url("https://api.semanticscholar.org/graph/v1/", &terms, 25);
        assert_eq!(
            url,
            "https://api.semanticscholar.org/graph/v1/paper/search?query=computer%20vision%20crop%20disease&limit=10&fields=title,authors,abstract,year,url,externalIds&sort=relevance"
        );
    }

    #[test]
    fn test_parse_search_response() {
        let fetch = parse_search_response(FIXTURE).unwrap();
        assert_eq!(fetch.raw_items, 3);
        assert_eq!(fetch.papers.len(), 2);

        let first = &fetch.papers[0];
        assert_eq!(first.title, "Deep Learning for Plant Disease Detection");
        assert_eq!(first.authors, vec!["S. P. Mohanty"]);
        assert_eq!(first.published_date, "2016");
        assert_eq!(first.doi.as_deref(), Some("10.3389/fpls.2016.01419"));

        let second = &fetch.papers[1];
        assert_eq!(second.url, "https://www.semanticscholar.org/paper/def456");
        assert_eq!(second.abstract_text, NO_ABSTRACT);
        assert_eq!(second.published_date, UNKNOWN_DATE);
        assert!(second.authors.is_empty());
        assert!(second.doi.is_none());
    }

    #[test]
    fn test_missing_data_is_empty() {
        let fetch = parse_search_response(r#"{"total": 0, "offset": 0}"#).unwrap();
        assert_eq!(fetch, SourceFetch::empty());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(
            parse_search_response("<html>rate limited</html>"),
            Err(SourceError::MalformedEnvelope { .. })
        ));
    }

    #[test]
    fn test_item_with_wrong_types_is_skipped() {
        let fetch =
            parse_search_response(r#"{"data": [{"title": 42}, {"paperId": "x", "title": "Ok"}]}"#)
                .unwrap();
        assert_eq!(fetch.raw_items, 2);
        assert_eq!(fetch.papers.len(), 1);
        assert_eq!(fetch.papers[0].title, "Ok");
    }
}
