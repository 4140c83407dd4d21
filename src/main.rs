//! # codewhisper CLI
//!
//! ## Usage
//!
//! ```bash
//! codewhisper --config ./config/codewhisper.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `codewhisper init` | Create the SQLite database and schema |
//! | `codewhisper ask -P "<prompt>"` | Answer one question with file context |
//! | `codewhisper chat` | Interactive session |
//! | `codewhisper discover "<prompt>"` | Show the files discovery would pick |
//! | `codewhisper history <session-id>` | Print a stored session |
//!
//! ## Examples
//!
//! ```bash
//! # Ask about explicit files
//! codewhisper ask -P "why is this slow?" -F src/db.rs -F src/query.rs
//!
//! # Let discovery pick the files
//! codewhisper ask -P "how does login work" -A --path ./app --max-files 3
//!
//! # Interactive, with a different model
//! codewhisper chat -M anthropic/claude-3-haiku
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use codewhisper::ask::run_ask;
use codewhisper::chat::{run_chat, ChatOptions};
use codewhisper::client::OpenRouterClient;
use codewhisper::config::{self, Config};
use codewhisper::discover::{run_discover, DiscoveryRequest};
use codewhisper::history::run_history;
use codewhisper::migrate;
use codewhisper::sqlite_store::SqliteStoreFactory;
use codewhisper_core::session::SessionCoordinator;

/// A coding assistant with automatic context discovery and persistent
/// conversation history.
#[derive(Parser)]
#[command(name = "codewhisper", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Defaults apply if it does not exist.
    #[arg(long, global = true, default_value = "./config/codewhisper.toml")]
    config: PathBuf,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Ask a single question with file context.
    Ask {
        /// The question to ask.
        #[arg(short = 'P', long)]
        prompt: String,

        #[command(flatten)]
        context: ContextArgs,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Start an interactive session.
    Chat {
        /// First question, asked before the prompt loop starts.
        #[arg(short = 'P', long)]
        prompt: Option<String>,

        #[command(flatten)]
        context: ContextArgs,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Show which files discovery selects for a prompt.
    Discover {
        prompt: String,

        #[command(flatten)]
        discovery: DiscoveryArgs,
    },

    /// Print the messages of a stored session.
    History { session_id: String },
}

#[derive(Args)]
struct ContextArgs {
    /// Code file to include as context. Repeatable.
    #[arg(short = 'F', long = "file")]
    files: Vec<PathBuf>,

    /// Discover relevant files automatically.
    #[arg(short = 'A', long = "auto")]
    auto: bool,

    #[command(flatten)]
    discovery: DiscoveryArgs,
}

#[derive(Args)]
struct DiscoveryArgs {
    /// Directory to search when discovering files.
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Maximum number of files to select.
    #[arg(long)]
    max_files: Option<usize>,

    /// Maximum directory depth below the search root.
    #[arg(long)]
    max_depth: Option<usize>,
}

#[derive(Args)]
struct ModelArgs {
    /// Model identifier, e.g. `meta-llama/llama-4-maverick:free`.
    #[arg(short = 'M', long = "model")]
    name: Option<String>,

    /// API key for the model provider.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl DiscoveryArgs {
    fn apply(&self, cfg: &mut Config) -> Result<()> {
        if let Some(n) = self.max_files {
            if n == 0 {
                anyhow::bail!("--max-files must be >= 1");
            }
            cfg.discovery.max_files = n;
        }
        if let Some(d) = self.max_depth {
            cfg.discovery.max_depth = d;
        }
        Ok(())
    }
}

impl ModelArgs {
    fn apply(&self, cfg: &mut Config) {
        if let Some(name) = &self.name {
            cfg.model.name = name.clone();
        }
        if let Some(key) = &self.api_key {
            cfg.model.api_key = Some(key.clone());
        }
    }
}

fn chat_options(cfg: &Config, prompt: Option<String>, context: ContextArgs) -> ChatOptions {
    ChatOptions {
        model: cfg.model.name.clone(),
        files: context.files,
        prompt,
        auto_discover: context.auto,
        base_path: context.discovery.path,
        discovery: cfg.discovery.clone(),
    }
}

fn session_for(cfg: &Config) -> SessionCoordinator {
    let factory = Arc::new(SqliteStoreFactory::new(&cfg.db.path));
    SessionCoordinator::with_system_prompt(factory, &cfg.session.system_prompt)
}

/// A non-empty, valid `RUST_LOG` wins; otherwise WARN, or DEBUG with
/// `--verbose`.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "warn" };
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = log_filter(cli.verbose, std::env::var("RUST_LOG").ok().as_deref());
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    let mut cfg = config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ask {
            prompt,
            context,
            model,
        } => {
            if context.files.is_empty() && !context.auto {
                anyhow::bail!(
                    "Provide context files with -F/--file or enable auto-discovery with -A/--auto."
                );
            }
            context.discovery.apply(&mut cfg)?;
            model.apply(&mut cfg);
            let client = OpenRouterClient::new(&cfg.model)?;
            let options = chat_options(&cfg, Some(prompt), context);
            let mut session = session_for(&cfg);
            run_ask(&mut session, &client, &options, &mut std::io::stdout()).await?;
        }
        Commands::Chat {
            prompt,
            context,
            model,
        } => {
            context.discovery.apply(&mut cfg)?;
            model.apply(&mut cfg);
            let client = OpenRouterClient::new(&cfg.model)?;
            let options = chat_options(&cfg, prompt, context);
            let mut session = session_for(&cfg);
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            run_chat(
                &mut session,
                &client,
                &options,
                input,
                &mut std::io::stdout(),
            )
            .await?;
        }
        Commands::Discover { prompt, discovery } => {
            discovery.apply(&mut cfg)?;
            let request = DiscoveryRequest::new(&prompt, &discovery.path, &cfg.discovery);
            run_discover(&request).await?;
        }
        Commands::History { session_id } => {
            run_history(&cfg, &session_id).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_log_filter_defaults() {
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(true, None).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(log_filter(false, Some("  ")).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn test_rust_log_takes_precedence() {
        assert_eq!(log_filter(false, Some("info")).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(true, Some("error")).max_level_hint(), Some(LevelFilter::ERROR));
        assert_eq!(
            log_filter(false, Some("codewhisper=trace")).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }
}
