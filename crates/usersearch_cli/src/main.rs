//! usersearch CLI - search GitHub users from the terminal or over HTTP.

mod commands;
mod config;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use usersearch::CancelToken;

use crate::commands::limits::OutputFormat;
use crate::commands::search::SearchArgs;

#[derive(Parser)]
#[command(name = "usersearch")]
#[command(version)]
#[command(about = "Search GitHub users with structured filters")]
#[command(
    long_about = "usersearch turns structured filters (account type, repository and follower \
ranges, location, language, creation date, sponsorship) into GitHub user search queries. \
Requests are retried on rate limiting and transient network failures. Results can be \
printed, paged through, or served over a local JSON API."
)]
#[command(after_long_help = r#"EXAMPLES
    Search for users in a city with at least 10 repositories:
        $ usersearch search "react developer" --location "San Francisco" --repos ">=10"

    Organizations created in 2020, most followed first:
        $ usersearch search rust --type org --created 2020-01-01..2020-12-31 --sort followers

    Fetch every page as JSON:
        $ usersearch search ferris --all --output json

    Watch the search rate limit:
        $ usersearch limits --watch 30

    Serve the JSON API on another port:
        $ usersearch serve --bind 127.0.0.1:8080

CONFIGURATION
    usersearch reads configuration from (later wins):
      1. ~/.config/usersearch/config.toml (or $XDG_CONFIG_HOME/usersearch/config.toml)
      2. ./usersearch.toml
      3. Environment variables (USERSEARCH_* prefix, e.g., USERSEARCH_GITHUB__TOKEN)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    USERSEARCH_GITHUB__TOKEN        GitHub personal access token (falls back to GITHUB_TOKEN)
    USERSEARCH_GITHUB__API_URL      API base URL (default: https://api.github.com)
    USERSEARCH_RETRY__MAX_RETRIES   Retries after the first attempt (default: 3)
    USERSEARCH_SERVER__BIND         Address for `serve` (default: 127.0.0.1:3000)
    RUST_LOG                        Log filter (default: usersearch=info,usersearch_cli=info)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search users
    Search(SearchArgs),
    /// Show the search rate limit
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
        /// Keep polling every SECONDS until Ctrl+C
        #[arg(short, long, value_name = "SECONDS")]
        watch: Option<u64>,
    },
    /// Serve the JSON search API
    Serve {
        /// Address to listen on (default from config or 127.0.0.1:3000)
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Generate man page(s)
    Man {
        /// Output directory for man pages (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays clean for table/JSON output
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("usersearch=info,usersearch_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();

    let cancel = CancelToken::new();
    match cli.command {
        Commands::Completions { shell } => {
            commands::meta::handle_completions(shell)?;
        }
        Commands::Man { output } => {
            commands::meta::handle_man(output)?;
        }
        Commands::Search(args) => {
            shutdown::setup_shutdown_handler(cancel.clone());
            commands::search::handle_search(args, &config, cancel).await?;
        }
        Commands::Limits { output, watch } => {
            shutdown::setup_shutdown_handler(cancel.clone());
            commands::limits::handle_limits(output, watch, &config, cancel).await?;
        }
        Commands::Serve { bind } => {
            shutdown::setup_shutdown_handler(cancel.clone());
            commands::serve::handle_serve(bind, &config, cancel).await?;
        }
    }

    Ok(())
}
