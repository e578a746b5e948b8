//! Source clients and the shared HTTP plumbing they use.

pub mod arxiv;
pub mod crossref;
pub mod semantic_scholar;

use ideascout_core::config::ResearchConfig;
use ideascout_core::{PaperSource, SourceClient, SourceError};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build the HTTP client for one source.
pub(crate) fn http_client(
    source: PaperSource,
    timeout: Duration,
    user_agent: &str,
) -> Result<reqwest::Client, SourceError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()
        .map_err(|e| SourceError::Transport {
            source_name: source.display_name().to_string(),
            message: format!("Failed to create HTTP client: {}", e),
        })
}

fn transport_error(source: PaperSource, timeout_secs: u64, e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout {
            source_name: source.display_name().to_string(),
            timeout_secs,
        }
    } else {
        SourceError::Transport {
            source_name: source.display_name().to_string(),
            message: e.to_string(),
        }
    }
}

/// Send a request and return the body of a successful response.
pub(crate) async fn fetch_text(
    source: PaperSource,
    timeout_secs: u64,
    request: reqwest::RequestBuilder,
) -> Result<String, SourceError> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(source, timeout_secs, e))?;

    let status = response.status();
    if !status.is_success() {
        debug!(source = %source, status = %status, "Source returned an error status");
        return Err(SourceError::Status {
            source_name: source.display_name().to_string(),
            code: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| transport_error(source, timeout_secs, e))
}

pub(crate) fn malformed(source: PaperSource, message: impl Into<String>) -> SourceError {
    SourceError::MalformedEnvelope {
        source_name: source.display_name().to_string(),
        message: message.into(),
    }
}

/// All three sources, in registration order, configured from `config`.
pub fn default_sources(config: &ResearchConfig) -> Result<Vec<Arc<dyn SourceClient>>, SourceError> {
    Ok(vec![
        Arc::new(semantic_scholar::SemanticScholarClient::new(config)?),
        Arc::new(arxiv::ArxivClient::new(config)?),
        Arc::new(crossref::CrossRefClient::new(config)?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources_order() {
        let sources = default_sources(&ResearchConfig::default()).unwrap();
        let order: Vec<_> = sources.iter().map(|s| s.source()).collect();
        assert_eq!(order, PaperSource::ALL.to_vec());
    }

    #[test]
    fn test_malformed_message() {
        let err = malformed(PaperSource::Arxiv, "missing feed");
        assert_eq!(err.to_string(), "arXiv returned a malformed response: missing feed");
    }
}
