//! CrossRef REST API client.
//!
//! CrossRef is free and unauthenticated. Passing a contact address as
//! `mailto` routes requests to the "polite" pool, which is rate limited
//! less aggressively.

use super::{fetch_text, http_client, malformed};
use async_trait::async_trait;
use ideascout_core::config::ResearchConfig;
use ideascout_core::normalize::{
    UNKNOWN_DATE, collect_items, normalize_abstract, normalize_whitespace, require_title,
    strip_markup,
};
use ideascout_core::{ItemError, NormalizedPaper, PaperSource, SourceClient, SourceError, SourceFetch};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const SELECT_FIELDS: &str =
    "DOI,title,author,abstract,published-print,published-online,created,URL";
const DOI_RESOLVER: &str = "https://doi.org";

pub const MAX_ROWS: usize = 20;

/// CrossRef sends `title` as a list of fragments, occasionally as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TitleField {
    One(String),
    Many(Vec<String>),
}

impl TitleField {
    fn joined(&self) -> String {
        match self {
            TitleField::One(s) => s.clone(),
            TitleField::Many(parts) => parts.join(" "),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CrossRefWork {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    title: Option<TitleField>,
    author: Option<Vec<CrossRefAuthor>>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(rename = "published-print")]
    published_print: Option<CrossRefDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CrossRefDate>,
    created: Option<CrossRefDate>,
    #[serde(rename = "URL")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossRefAuthor {
    given: Option<String>,
    family: Option<String>,
    name: Option<String>,
}

impl CrossRefAuthor {
    fn display_name(&self) -> Option<String> {
        let composite = [self.given.as_deref(), self.family.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !composite.is_empty() {
            return Some(composite);
        }
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
struct CrossRefDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl CrossRefDate {
    /// `[[2021, 3, 5]]` → "2021-3-5". `None` when there are no parts.
    fn render(&self) -> Option<String> {
        let parts: Vec<String> = self
            .date_parts
            .first()?
            .iter()
            .map_while(|p| p.map(|n| n.to_string()))
            .collect();
        (!parts.is_empty()).then(|| parts.join("-"))
    }
}

pub fn build_search_url(
    base: &str,
    terms: &[String],
    max_results: usize,
    mailto: Option<&str>,
) -> String {
    let query = terms.iter().take(2).map(String::as_str).collect::<Vec<_>>().join(" ");
    let mut url = format!(
        "{}/works?query={}&rows={}&sort=relevance&select={}",
        base.trim_end_matches('/'),
        urlencoding::encode(&query),
        max_results.clamp(1, MAX_ROWS),
        SELECT_FIELDS,
    );
    if let Some(mailto) = mailto.map(str::trim).filter(|m| !m.is_empty()) {
        url.push_str("&mailto=");
        url.push_str(&urlencoding::encode(mailto));
    }
    url
}

fn normalize_item(item: Value) -> Result<NormalizedPaper, ItemError> {
    let work: CrossRefWork =
        serde_json::from_value(item).map_err(|e| ItemError::Malformed(e.to_string()))?;
    let title = require_title(work.title.as_ref().map(TitleField::joined).as_deref())?;

    let doi = work
        .doi
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let url = match (work.url.filter(|u| !u.trim().is_empty()), &doi) {
        (Some(url), _) => url,
        (None, Some(doi)) => format!("{}/{}", DOI_RESOLVER, doi),
        (None, None) => return Err(ItemError::Malformed("no URL or DOI".to_string())),
    };

    let published_date = [&work.published_print, &work.published_online, &work.created]
        .into_iter()
        .flatten()
        .find_map(CrossRefDate::render)
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    let abstract_text = work
        .abstract_text
        .as_deref()
        .map(|a| normalize_whitespace(&strip_markup(a)));

    Ok(NormalizedPaper {
        title,
        authors: work
            .author
            .unwrap_or_default()
            .iter()
            .filter_map(CrossRefAuthor::display_name)
            .collect(),
        abstract_text: normalize_abstract(abstract_text.as_deref()),
        published_date,
        source: PaperSource::CrossRef,
        url,
        doi,
    })
}

/// Parse a `/works` response body.
pub fn parse_search_response(body: &str) -> Result<SourceFetch, SourceError> {
    let mut envelope: Value = serde_json::from_str(body)
        .map_err(|e| malformed(PaperSource::CrossRef, format!("invalid JSON: {}", e)))?;
    let items = match envelope
        .get_mut("message")
        .and_then(|m| m.get_mut("items"))
        .map(Value::take)
    {
        None | Some(Value::Null) => return Ok(SourceFetch::empty()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(malformed(
                PaperSource::CrossRef,
                "`message.items` is not an array",
            ));
        }
    };
    let raw_items = items.len();
    let papers = collect_items(PaperSource::CrossRef, items.into_iter().map(normalize_item));
    Ok(SourceFetch { papers, raw_items })
}

/// CrossRef works search.
pub struct CrossRefClient {
    client: reqwest::Client,
    base_url: String,
    mailto: Option<String>,
    timeout_secs: u64,
}

impl CrossRefClient {
    pub fn new(config: &ResearchConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(
                PaperSource::CrossRef,
                config.crossref_timeout(),
                &config.user_agent,
            )?,
            base_url: config.endpoints.crossref.clone(),
            mailto: config.crossref_mailto.clone(),
            timeout_secs: config.crossref_timeout_secs,
        })
    }
}

#[async_trait]
impl SourceClient for CrossRefClient {
    fn source(&self) -> PaperSource {
        PaperSource::CrossRef
    }

    async fn search(
        &self,
        terms: &[String],
        max_results: usize,
    ) -> Result<SourceFetch, SourceError> {
        if terms.is_empty() {
            return Ok(SourceFetch::empty());
        }
        let url = build_search_url(&self.base_url, terms, max_results, self.mailto.as_deref());
        debug!(url = %url, "CrossRef search");
        let body = fetch_text(PaperSource::CrossRef, self.timeout_secs, self.client.get(&url)).await?;
        parse_search_response(&body)
    }
}
