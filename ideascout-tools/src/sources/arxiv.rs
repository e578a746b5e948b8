//! arXiv API client: query construction and Atom feed parsing.

use super::{fetch_text, http_client, malformed};
use async_trait::async_trait;
use ideascout_core::config::ResearchConfig;
use ideascout_core::normalize::{
    UNKNOWN_DATE, collect_items, normalize_abstract, normalize_whitespace, require_title,
};
use ideascout_core::{ItemError, NormalizedPaper, PaperSource, SourceClient, SourceError, SourceFetch};
use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use tracing::debug;

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";
const ARXIV_NS: &[u8] = b"http://arxiv.org/schemas/atom";

/// Sent once when the first query yields an empty feed.
pub const FALLBACK_QUERY: &str =
    r#"all:"machine learning" OR all:"neural network" OR all:optimization"#;

const MAX_QUERY_TERMS: usize = 3;
const WORDS_PER_TERM: usize = 2;
const MAX_QUERY_TOKENS: usize = 5;

/// One `<entry>` as it appears in the feed, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AtomEntry {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub published: String,
    pub doi: Option<String>,
}

fn query_words(term: &str) -> impl Iterator<Item = String> + '_ {
    term.split_whitespace()
        .take(WORDS_PER_TERM)
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
}

/// Build the `search_query` value from the leading search terms.
///
/// Takes the first two words of up to three terms, keeps words longer than
/// two characters, and ORs at most five of them as `all:` clauses. When every
/// word is too short, the first term's words are used as they are.
pub fn build_search_query(terms: &[String]) -> String {
    let mut tokens: Vec<String> = Vec::new();
    for term in terms.iter().take(MAX_QUERY_TERMS) {
        for word in query_words(term).filter(|w| w.chars().count() > 2) {
            if !tokens.contains(&word) {
                tokens.push(word);
            }
        }
    }
    if tokens.is_empty()
        && let Some(first) = terms.first()
    {
        for word in query_words(first) {
            if !tokens.contains(&word) {
                tokens.push(word);
            }
        }
    }
    tokens.truncate(MAX_QUERY_TOKENS);
    tokens
        .iter()
        .map(|t| format!("all:{}", t))
        .collect::<Vec<_>>()
        .join(" OR ")
}

pub fn build_search_url(base: &str, search_query: &str, max_results: usize) -> String {
    format!(
        "{}?search_query={}&start=0&max_results={}&sortBy=relevance&sortOrder=descending",
        base,
        urlencoding::encode(search_query),
        max_results,
    )
}

#[derive(Clone, Copy, PartialEq)]
enum Ns {
    Atom,
    Arxiv,
    Other,
}

fn ns_of(resolved: &ResolveResult<'_>) -> Ns {
    match resolved {
        ResolveResult::Bound(Namespace(ns)) if *ns == ATOM_NS => Ns::Atom,
        ResolveResult::Bound(Namespace(ns)) if *ns == ARXIV_NS => Ns::Arxiv,
        _ => Ns::Other,
    }
}

#[derive(Clone, Copy)]
enum Field {
    Id,
    Title,
    Summary,
    Published,
    AuthorName,
    Doi,
}

/// Parse an Atom feed into raw entries.
///
/// Fails when the root element is not an Atom `feed` or the document ends
/// with elements still open.
pub fn parse_feed(xml: &str) -> Result<Vec<AtomEntry>, String> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut saw_feed = false;
    let mut current: Option<AtomEntry> = None;
    let mut in_author = false;
    let mut field: Option<Field> = None;
    let mut text = String::new();

    loop {
        match reader.read_resolved_event() {
            Ok((resolved, Event::Start(e))) => {
                let ns = ns_of(&resolved);
                depth += 1;
                if depth == 1 {
                    if ns == Ns::Atom && e.local_name().as_ref() == b"feed" {
                        saw_feed = true;
                        continue;
                    }
                    return Err("root element is not an Atom feed".to_string());
                }
                match (ns, e.local_name().as_ref()) {
                    (Ns::Atom, b"entry") => {
                        current = Some(AtomEntry::default());
                        in_author = false;
                    }
                    (Ns::Atom, b"author") if current.is_some() => in_author = true,
                    (Ns::Atom, b"name") if in_author => field = Some(Field::AuthorName),
                    (Ns::Atom, b"id") if current.is_some() && !in_author => field = Some(Field::Id),
                    (Ns::Atom, b"title") if current.is_some() => field = Some(Field::Title),
                    (Ns::Atom, b"summary") if current.is_some() => field = Some(Field::Summary),
                    (Ns::Atom, b"published") if current.is_some() => {
                        field = Some(Field::Published)
                    }
                    (Ns::Arxiv, b"doi") if current.is_some() => field = Some(Field::Doi),
                    _ => {}
                }
                if field.is_some() {
                    text.clear();
                }
            }
            Ok((resolved, Event::Empty(e))) => {
                if depth == 0 {
                    if ns_of(&resolved) == Ns::Atom && e.local_name().as_ref() == b"feed" {
                        saw_feed = true;
                    } else {
                        return Err("root element is not an Atom feed".to_string());
                    }
                }
            }
            Ok((_, Event::Text(t))) => {
                if field.is_some() {
                    let unescaped = t.unescape().map_err(|e| e.to_string())?;
                    text.push_str(&unescaped);
                }
            }
            Ok((_, Event::CData(c))) => {
                if field.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok((resolved, Event::End(e))) => {
                depth = depth.saturating_sub(1);
                let ns = ns_of(&resolved);
                if let Some(f) = field.take() {
                    let value = normalize_whitespace(&text);
                    if let Some(entry) = current.as_mut() {
                        match f {
                            Field::Id => entry.id = value,
                            Field::Title => entry.title = value,
                            Field::Summary => entry.summary = value,
                            Field::Published => entry.published = value,
                            Field::AuthorName => {
                                if !value.is_empty() {
                                    entry.authors.push(value);
                                }
                            }
                            Field::Doi => entry.doi = Some(value).filter(|d| !d.is_empty()),
                        }
                    }
                    text.clear();
                }
                match (ns, e.local_name().as_ref()) {
                    (Ns::Atom, b"entry") => {
                        if let Some(entry) = current.take() {
                            entries.push(entry);
                        }
                    }
                    (Ns::Atom, b"author") => in_author = false,
                    _ => {}
                }
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("XML error: {}", e)),
        }
    }

    if !saw_feed {
        return Err("missing Atom feed element".to_string());
    }
    if depth != 0 {
        return Err("document ended with unclosed elements".to_string());
    }
    Ok(entries)
}

fn normalize_entry(entry: AtomEntry) -> Result<NormalizedPaper, ItemError> {
    let title = require_title(Some(&entry.title))?;
    if entry.id.is_empty() {
        return Err(ItemError::Malformed("entry has no id".to_string()));
    }
    Ok(NormalizedPaper {
        title,
        authors: entry.authors,
        abstract_text: normalize_abstract(Some(&entry.summary)),
        published_date: if entry.published.is_empty() {
            UNKNOWN_DATE.to_string()
        } else {
            entry.published
        },
        source: PaperSource::Arxiv,
        url: entry.id,
        doi: entry.doi,
    })
}

/// Parse a feed body into normalized papers, counting raw entries.
pub fn parse_search_response(body: &str) -> Result<SourceFetch, SourceError> {
    let entries = parse_feed(body).map_err(|m| malformed(PaperSource::Arxiv, m))?;
    let raw_items = entries.len();
    let papers = collect_items(PaperSource::Arxiv, entries.into_iter().map(normalize_entry));
    Ok(SourceFetch { papers, raw_items })
}

/// arXiv export API search.
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
    retry_on_empty: bool,
}

impl ArxivClient {
    pub fn new(config: &ResearchConfig) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(
                PaperSource::Arxiv,
                config.per_source_timeout(),
                &config.user_agent,
            )?,
            base_url: config.endpoints.arxiv.clone(),
            timeout_secs: config.per_source_timeout_secs,
            retry_on_empty: config.arxiv_retry_on_empty,
        })
    }

    async fn query(&self, search_query: &str, max_results: usize) -> Result<SourceFetch, SourceError> {
        let url = build_search_url(&self.base_url, search_query, max_results);
        debug!(url = %url, "arXiv search");
        let body = fetch_text(PaperSource::Arxiv, self.timeout_secs, self.client.get(&url)).await?;
        parse_search_response(&body)
    }
}

#[async_trait]
impl SourceClient for ArxivClient {
    fn source(&self) -> PaperSource {
        PaperSource::Arxiv
    }

    async fn search(
        &self,
        terms: &[String],
        max_results: usize,
    ) -> Result<SourceFetch, SourceError> {
        let search_query = build_search_query(terms);
        if search_query.is_empty() {
            return Ok(SourceFetch::empty());
        }
        let max_results = max_results.max(1);

        let fetch = self.query(&search_query, max_results).await?;
        if fetch.raw_items == 0 && self.retry_on_empty {
            debug!(query = %search_query, "arXiv feed was empty; retrying with a generic query");
            return self.query(FALLBACK_QUERY, max_results).await;
        }
        Ok(fetch)
    }
}
