//! Source clients against in-process HTTP fixtures.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use ideascout_core::config::ScoutConfig;
use ideascout_core::research::canonical_title;
use ideascout_core::{PaperSource, ResearchEngine, SourceClient, SourceStatus};
use ideascout_tools::sources::arxiv::FALLBACK_QUERY;
use ideascout_tools::{ArxivClient, CrossRefClient, SemanticScholarClient, default_sources};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
  <id>http://arxiv.org/api/empty</id>
</feed>"#;

const BLANK_TITLE_FEED: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry><id>http://arxiv.org/abs/0001</id><title>   </title></entry>
</feed>"#;

const ARXIV_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>ArXiv Query</title>
  <entry>
    <id>http://arxiv.org/abs/2101.00001v2</id>
    <published>2021-01-04T00:00:00Z</published>
    <title>Deep Learning for Image-Based Plant Disease Detection</title>
    <summary>Convolutional networks recognise crop diseases from leaf photos.</summary>
    <author><name>Sharada Mohanty</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2203.00002v1</id>
    <published>2022-03-01T00:00:00Z</published>
    <title>Computer vision for precision agriculture</title>
    <summary>A survey of image recognition in farming.</summary>
    <author><name>Li Wei</name></author>
  </entry>
</feed>"#;

const S2_BODY: &str = r#"{
  "total": 3,
  "data": [
    {
      "paperId": "p1",
      "title": "Deep learning for image-based plant disease detection",
      "authors": [{"name": "Sharada P. Mohanty"}],
      "abstract": "Smartphone-assisted disease diagnosis with deep learning on leaf images.",
      "year": 2016,
      "url": "https://www.semanticscholar.org/paper/p1",
      "externalIds": {"DOI": "10.3389/fpls.2016.01419"}
    },
    {
      "paperId": "p2",
      "title": "Image recognition of crop pests",
      "authors": [{"name": "K. Thenmozhi"}],
      "abstract": null,
      "year": 2019,
      "url": null
    },
    {
      "paperId": "p3",
      "title": "A review of precision farming technologies",
      "authors": [],
      "year": 2020
    }
  ]
}"#;

const CROSSREF_BODY: &str = r#"{
  "status": "ok",
  "message": {
    "items": [
      {
        "DOI": "10.1016/j.compag.2018.01.009",
        "title": ["Deep learning in agriculture: A survey"],
        "author": [{"given": "Andreas", "family": "Kamilaris"}],
        "published-print": {"date-parts": [[2018, 4]]},
        "URL": "http://dx.doi.org/10.1016/j.compag.2018.01.009"
      }
    ]
  }
}"#;

struct Fixture {
    s2_body: &'static str,
    arxiv_bodies: Vec<&'static str>,
    arxiv_status: StatusCode,
    crossref_status: StatusCode,
    crossref_body: &'static str,
    s2_calls: AtomicUsize,
    arxiv_calls: AtomicUsize,
    crossref_calls: AtomicUsize,
    arxiv_queries: Mutex<Vec<String>>,
    s2_api_keys: Mutex<Vec<Option<String>>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            s2_body: S2_BODY,
            arxiv_bodies: vec![ARXIV_FEED],
            arxiv_status: StatusCode::OK,
            crossref_status: StatusCode::OK,
            crossref_body: CROSSREF_BODY,
            s2_calls: AtomicUsize::new(0),
            arxiv_calls: AtomicUsize::new(0),
            crossref_calls: AtomicUsize::new(0),
            arxiv_queries: Mutex::new(Vec::new()),
            s2_api_keys: Mutex::new(Vec::new()),
        }
    }
}

async fn s2_handler(State(fx): State<Arc<Fixture>>, headers: HeaderMap) -> Response {
    fx.s2_calls.fetch_add(1, Ordering::SeqCst);
    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    fx.s2_api_keys.lock().unwrap().push(key);
    ([(header::CONTENT_TYPE, "application/json")], fx.s2_body).into_response()
}

async fn arxiv_handler(
    State(fx): State<Arc<Fixture>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let call = fx.arxiv_calls.fetch_add(1, Ordering::SeqCst);
    fx.arxiv_queries
        .lock()
        .unwrap()
        .push(params.get("search_query").cloned().unwrap_or_default());
    if fx.arxiv_status != StatusCode::OK {
        return (fx.arxiv_status, "unavailable").into_response();
    }
    let body = fx.arxiv_bodies[call.min(fx.arxiv_bodies.len() - 1)];
    ([(header::CONTENT_TYPE, "application/atom+xml")], body).into_response()
}

async fn crossref_handler(State(fx): State<Arc<Fixture>>) -> Response {
    fx.crossref_calls.fetch_add(1, Ordering::SeqCst);
    if fx.crossref_status != StatusCode::OK {
        return (fx.crossref_status, "Internal Server Error").into_response();
    }
    ([(header::CONTENT_TYPE, "application/json")], fx.crossref_body).into_response()
}

/// Start the fixture server and return a config pointing every source at it.
async fn serve(fixture: Arc<Fixture>) -> ScoutConfig {
    let router = Router::new()
        .route("/s2/paper/search", get(s2_handler))
        .route("/arxiv/api/query", get(arxiv_handler))
        .route("/crossref/works", get(crossref_handler))
        .with_state(fixture);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let mut config = ScoutConfig::default();
    config.llm.enabled = false;
    config.research.endpoints.semantic_scholar = format!("http://{}/s2", addr);
    config.research.endpoints.arxiv = format!("http://{}/arxiv/api/query", addr);
    config.research.endpoints.crossref = format!("http://{}/crossref", addr);
    config.research.per_source_timeout_secs = 5;
    config.research.crossref_timeout_secs = 5;
    config.research.aggregation_budget_secs = 10;
    config
}

fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

// --- arXiv retry policy ---

#[tokio::test]
async fn test_arxiv_retries_once_when_feed_has_no_entries() {
    let fixture = Arc::new(Fixture {
        arxiv_bodies: vec![EMPTY_FEED, ARXIV_FEED],
        ..Fixture::new()
    });
    let config = serve(fixture.clone()).await;
    let client = ArxivClient::new(&config.research).unwrap();

    let papers = client.fetch(&terms(&["quantum basket weaving"]), 5).await;
    assert_eq!(papers.len(), 2);
    assert_eq!(fixture.arxiv_calls.load(Ordering::SeqCst), 2);
    let queries = fixture.arxiv_queries.lock().unwrap().clone();
    assert_eq!(queries[0], "all:quantum OR all:basket");
    assert_eq!(queries[1], FALLBACK_QUERY);
}

#[tokio::test]
async fn test_arxiv_does_not_retry_when_entries_fail_normalization() {
    let fixture = Arc::new(Fixture {
        arxiv_bodies: vec![BLANK_TITLE_FEED, ARXIV_FEED],
        ..Fixture::new()
    });
    let config = serve(fixture.clone()).await;
    let client = ArxivClient::new(&config.research).unwrap();

    let papers = client.fetch(&terms(&["computer vision"]), 5).await;
    assert!(papers.is_empty());
    assert_eq!(fixture.arxiv_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_arxiv_does_not_retry_on_http_error() {
    let fixture = Arc::new(Fixture {
        arxiv_status: StatusCode::SERVICE_UNAVAILABLE,
        ..Fixture::new()
    });
    let config = serve(fixture.clone()).await;
    let client = ArxivClient::new(&config.research).unwrap();

    let err = client
        .search(&terms(&["computer vision"]), 5)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("503"));
    assert_eq!(fixture.arxiv_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_arxiv_retry_can_be_disabled() {
    let fixture = Arc::new(Fixture {
        arxiv_bodies: vec![EMPTY_FEED, ARXIV_FEED],
        ..Fixture::new()
    });
    let mut config = serve(fixture.clone()).await;
    config.research.arxiv_retry_on_empty = false;
    let client = ArxivClient::new(&config.research).unwrap();

    assert!(client.fetch(&terms(&["computer vision"]), 5).await.is_empty());
    assert_eq!(fixture.arxiv_calls.load(Ordering::SeqCst), 1);
}

// --- Semantic Scholar / CrossRef ---

#[tokio::test]
async fn test_semantic_scholar_sends_api_key_when_configured() {
    let fixture = Arc::new(Fixture::new());
    let mut config = serve(fixture.clone()).await;
    config.research.semantic_scholar_api_key = Some("s2-secret".into());

    let with_key = SemanticScholarClient::new(&config.research).unwrap();
    let papers = with_key.fetch(&terms(&["crop disease"]), 5).await;
    assert_eq!(papers.len(), 3);
    assert_eq!(papers[1].url, "https://www.semanticscholar.org/paper/p2");

    config.research.semantic_scholar_api_key = None;
    let without_key = SemanticScholarClient::new(&config.research).unwrap();
    without_key.fetch(&terms(&["crop disease"]), 5).await;

    let keys = fixture.s2_api_keys.lock().unwrap().clone();
    assert_eq!(keys, vec![Some("s2-secret".to_string()), None]);
}

#[tokio::test]
async fn test_crossref_server_error_is_an_empty_contribution() {
    let fixture = Arc::new(Fixture {
        crossref_status: StatusCode::INTERNAL_SERVER_ERROR,
        ..Fixture::new()
    });
    let config = serve(fixture.clone()).await;
    let client = CrossRefClient::new(&config.research).unwrap();

    let err = client.search(&terms(&["crop yield"]), 5).await.unwrap_err();
    assert!(err.to_string().contains("CrossRef returned status 500"));
    assert!(client.fetch(&terms(&["crop yield"]), 5).await.is_empty());
}

#[tokio::test]
async fn test_unreachable_source_is_an_empty_contribution() {
    let mut config = ScoutConfig::default();
    // Port 9 (discard) is closed on test machines.
    config.research.endpoints.crossref = "http://127.0.0.1:9".into();
    config.research.crossref_timeout_secs = 2;
    let client = CrossRefClient::new(&config.research).unwrap();
    assert!(client.fetch(&terms(&["crop yield"]), 5).await.is_empty());
}

// --- Full pipeline ---

#[tokio::test]
async fn test_crossref_failure_still_ranks_other_sources() {
    let fixture = Arc::new(Fixture {
        crossref_status: StatusCode::INTERNAL_SERVER_ERROR,
        ..Fixture::new()
    });
    let config = serve(fixture.clone()).await;
    let engine = ResearchEngine::new(&config, None, default_sources(&config.research).unwrap());

    let result = engine
        .research_papers("AI-powered crop monitoring", 10)
        .await
        .unwrap();

    assert!(!result.papers.is_empty());
    assert!(result.papers.iter().all(|p| p.paper.source != PaperSource::CrossRef));
    assert!(result
        .papers
        .iter()
        .any(|p| p.paper.source == PaperSource::SemanticScholar));
    assert!(result.papers.iter().any(|p| p.paper.source == PaperSource::Arxiv));
    let crossref = &result.sources[2];
    assert_eq!(crossref.source, PaperSource::CrossRef);
    assert_eq!(crossref.status, SourceStatus::Completed);
    assert_eq!(crossref.papers, 0);
}

#[tokio::test]
async fn test_vision_crop_idea_end_to_end_without_ai() {
    let fixture = Arc::new(Fixture::new());
    let config = serve(fixture.clone()).await;
    let engine = ResearchEngine::new(&config, None, default_sources(&config.research).unwrap());

    let result = engine
        .research_papers(
            "A mobile app using computer vision to detect crop diseases from phone photos",
            5,
        )
        .await
        .unwrap();

    let used = &result.search_terms_used;
    assert!(
        used.iter()
            .any(|t| ["computer vision", "image recognition", "machine learning"].contains(&t.as_str())),
        "{used:?}"
    );
    assert!(
        used.iter()
            .any(|t| ["agriculture", "precision farming", "crop yield"].contains(&t.as_str())),
        "{used:?}"
    );

    assert_eq!(fixture.s2_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fixture.crossref_calls.load(Ordering::SeqCst), 1);
    assert!(fixture.arxiv_calls.load(Ordering::SeqCst) <= 2);

    assert!(!result.papers.is_empty());
    assert!(result.papers.len() <= 5);
    let titles: HashSet<String> = result
        .papers
        .iter()
        .map(|p| canonical_title(&p.paper.title))
        .collect();
    assert_eq!(titles.len(), result.papers.len());
    for pair in result.papers.windows(2) {
        assert!(pair[0].relevance_score >= pair[1].relevance_score);
    }

    // The S2 and arXiv copies of the plant disease paper merge; the DOI wins.
    let merged = result
        .papers
        .iter()
        .find(|p| canonical_title(&p.paper.title).contains("plant disease detection"))
        .unwrap();
    assert_eq!(merged.paper.source, PaperSource::SemanticScholar);
    assert!(merged.paper.doi.is_some());
}
