//! Configuration system for IdeaScout.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment.
//! Configuration is loaded from `~/.config/ideascout/config.toml` and/or
//! `.ideascout/config.toml` in the workspace directory.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoutConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub research: ResearchConfig,
}

/// Configuration for the AI completion capability used for term generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether to call the AI provider at all. When false, the heuristic
    /// term generator is always used.
    pub enabled: bool,
    /// Provider name: "openai" or any OpenAI-compatible endpoint.
    pub provider: String,
    /// Model identifier (e.g., "gpt-4o-mini").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Inline API key. Prefer `api_key_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Optional base URL override for the API endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Temperature for term generation.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.3,
            max_tokens: 100,
            timeout_secs: 20,
        }
    }
}

/// Configuration for the paper aggregation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Optional Semantic Scholar API key, sent as `x-api-key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_scholar_api_key: Option<String>,
    /// Transport timeout for Semantic Scholar and arXiv requests.
    pub per_source_timeout_secs: u64,
    /// Transport timeout for CrossRef, the slowest source.
    pub crossref_timeout_secs: u64,
    /// Wall-clock budget for the whole fan-out.
    pub aggregation_budget_secs: u64,
    /// Upper bound on `max_results` for any request.
    pub max_results_ceiling: usize,
    /// Result count used when the caller does not specify one.
    pub default_max_results: usize,
    /// Retry arXiv once with a generic query when the first feed is empty.
    pub arxiv_retry_on_empty: bool,
    /// Contact address for the CrossRef polite pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossref_mailto: Option<String>,
    /// User-Agent sent to every source.
    pub user_agent: String,
    #[serde(default)]
    pub endpoints: SourceEndpoints,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            semantic_scholar_api_key: None,
            per_source_timeout_secs: 30,
            crossref_timeout_secs: 45,
            aggregation_budget_secs: 50,
            max_results_ceiling: 20,
            default_max_results: 10,
            arxiv_retry_on_empty: true,
            crossref_mailto: None,
            user_agent: format!("IdeaScout/{}", env!("CARGO_PKG_VERSION")),
            endpoints: SourceEndpoints::default(),
        }
    }
}

impl ResearchConfig {
    pub fn per_source_timeout(&self) -> Duration {
        Duration::from_secs(self.per_source_timeout_secs)
    }

    pub fn crossref_timeout(&self) -> Duration {
        Duration::from_secs(self.crossref_timeout_secs)
    }

    pub fn aggregation_budget(&self) -> Duration {
        Duration::from_secs(self.aggregation_budget_secs)
    }

    /// The longest transport timeout of any source.
    pub fn slowest_source_timeout_secs(&self) -> u64 {
        self.per_source_timeout_secs.max(self.crossref_timeout_secs)
    }
}

/// Base URLs for the three sources. Overridable for proxies and tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEndpoints {
    pub semantic_scholar: String,
    pub arxiv: String,
    pub crossref: String,
}

impl Default for SourceEndpoints {
    fn default() -> Self {
        Self {
            semantic_scholar: "https://api.semanticscholar.org/graph/v1".to_string(),
            arxiv: "https://export.arxiv.org/api/query".to_string(),
            crossref: "https://api.crossref.org".to_string(),
        }
    }
}

/// Check a loaded configuration for values the pipeline cannot honour.
pub fn validate_config(config: &ScoutConfig) -> Result<(), ConfigError> {
    let research = &config.research;
    if research.per_source_timeout_secs == 0 || research.crossref_timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "source timeouts must be greater than zero".to_string(),
        });
    }
    if research.max_results_ceiling == 0 {
        return Err(ConfigError::Invalid {
            message: "max_results_ceiling must be greater than zero".to_string(),
        });
    }
    if research.default_max_results == 0
        || research.default_max_results > research.max_results_ceiling
    {
        return Err(ConfigError::Invalid {
            message: format!(
                "default_max_results must be between 1 and {}",
                research.max_results_ceiling
            ),
        });
    }
    // A budget at or below the slowest source would pre-empt it.
    let slowest = research.slowest_source_timeout_secs();
    if research.aggregation_budget_secs <= slowest {
        return Err(ConfigError::Invalid {
            message: format!(
                "aggregation_budget_secs ({}) must exceed the slowest source timeout ({})",
                research.aggregation_budget_secs, slowest
            ),
        });
    }
    if config.llm.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "llm.timeout_secs must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Path of the user-level config file, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "ideascout", "ideascout")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit config file (passed as argument)
/// 2. `SEMANTIC_SCHOLAR_API_KEY`
/// 3. Environment variables (prefixed with `IDEASCOUT_`)
/// 4. Workspace-local config (`.ideascout/config.toml`)
/// 5. User config (`~/.config/ideascout/config.toml`)
/// 6. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<ScoutConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(ScoutConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".ideascout").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // IDEASCOUT_LLM__MODEL, IDEASCOUT_RESEARCH__AGGREGATION_BUDGET_SECS, etc.
    figment = figment.merge(Env::prefixed("IDEASCOUT_").split("__"));
    figment = figment.merge(
        Env::raw()
            .only(&["SEMANTIC_SCHOLAR_API_KEY"])
            .map(|_| "research.semantic_scholar_api_key".into()),
    );

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::ParseError {
                message: format!("config file not found: {}", path.display()),
            });
        }
        figment = figment.merge(Toml::file(path));
    }

    let config: ScoutConfig = figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}
