//! IdeaScout CLI: find academic papers relevant to a startup idea.

mod commands;
mod output;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// IdeaScout: research papers for your next idea
#[derive(Parser, Debug)]
#[command(name = "ideascout", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (reads `.ideascout/config.toml` from here)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// AI model used for search term generation
    #[arg(short, long)]
    model: Option<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Search all sources for papers relevant to an idea
    Search {
        /// Free-text description of the idea
        idea: String,
        /// Maximum number of papers to return
        #[arg(short = 'n', long = "max")]
        max_results: Option<usize>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        /// Skip AI term generation and use the keyword heuristic
        #[arg(long)]
        no_ai: bool,
    },
    /// Show the search terms an idea would produce
    Terms {
        idea: String,
        #[arg(long)]
        no_ai: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Write a default configuration file to the workspace
    Init,
    /// Show the merged configuration (secrets redacted)
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    // RUST_LOG wins over -v when set.
    let stderr_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    let log_dir = directories::ProjectDirs::from("dev", "ideascout", "ideascout")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "ideascout.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let ctx = commands::Context {
        workspace,
        config_path: cli.config,
        model: cli.model,
    };
    commands::handle_command(cli.command, &ctx).await
}
