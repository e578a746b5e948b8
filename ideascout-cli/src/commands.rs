//! CLI subcommand handlers.

use crate::output;
use crate::{Commands, ConfigAction};
use ideascout_core::config::{ScoutConfig, load_config};
use ideascout_core::providers::create_provider;
use ideascout_core::{CompletionProvider, ResearchEngine, SearchTermGenerator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub workspace: PathBuf,
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
}

impl Context {
    fn load_config(&self) -> anyhow::Result<ScoutConfig> {
        let mut config = load_config(Some(&self.workspace), self.config_path.as_deref())
            .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        Ok(config)
    }
}

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::Search {
            idea,
            max_results,
            json,
            no_ai,
        } => handle_search(ctx, &idea, max_results, json, no_ai).await,
        Commands::Terms { idea, no_ai } => handle_terms(ctx, &idea, no_ai).await,
        Commands::Config { action } => handle_config(action, ctx),
    }
}

/// The configured provider, or `None` when AI is off or cannot start.
fn resolve_provider(config: &ScoutConfig, no_ai: bool) -> Option<Arc<dyn CompletionProvider>> {
    if no_ai {
        return None;
    }
    match create_provider(&config.llm) {
        Ok(provider) => provider,
        Err(e) => {
            warn!(error = %e, "AI term generation unavailable; using heuristic terms");
            None
        }
    }
}

async fn handle_search(
    ctx: &Context,
    idea: &str,
    max_results: Option<usize>,
    json: bool,
    no_ai: bool,
) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let provider = resolve_provider(&config, no_ai);
    let sources = ideascout_tools::default_sources(&config.research)?;
    let engine = ResearchEngine::new(&config, provider, sources);

    let max_results = max_results.unwrap_or(config.research.default_max_results);
    let result = engine.research_papers(idea, max_results).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", output::render_result(&result));
    }
    Ok(())
}

async fn handle_terms(ctx: &Context, idea: &str, no_ai: bool) -> anyhow::Result<()> {
    if idea.trim().is_empty() {
        anyhow::bail!("idea text is empty");
    }
    let config = ctx.load_config()?;
    let generator = SearchTermGenerator::new(resolve_provider(&config, no_ai))
        .with_sampling(config.llm.temperature, config.llm.max_tokens);
    for term in generator.generate(idea).await {
        println!("{}", term);
    }
    Ok(())
}

fn handle_config(action: ConfigAction, ctx: &Context) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = init_config(&ctx.workspace)?;
            println!("Configuration file: {}", config_path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = ctx.load_config()?;
            println!("{}", toml::to_string_pretty(&redacted(config))?);
            Ok(())
        }
    }
}

/// Write the default config to `<workspace>/.ideascout/config.toml` unless
/// one already exists.
fn init_config(workspace: &Path) -> anyhow::Result<PathBuf> {
    let config_dir = workspace.join(".ideascout");
    std::fs::create_dir_all(&config_dir)?;
    let config_path = config_dir.join("config.toml");
    if !config_path.exists() {
        let toml_str = toml::to_string_pretty(&ScoutConfig::default())?;
        std::fs::write(&config_path, toml_str)?;
    }
    Ok(config_path)
}

fn redacted(mut config: ScoutConfig) -> ScoutConfig {
    const MASK: &str = "********";
    if config.llm.api_key.is_some() {
        config.llm.api_key = Some(MASK.to_string());
    }
    if config.research.semantic_scholar_api_key.is_some() {
        config.research.semantic_scholar_api_key = Some(MASK.to_string());
    }
    config
}
