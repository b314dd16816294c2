//! Configuration file support for usersearch.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `USERSEARCH_`, sections split by
//!    `__`, e.g. `USERSEARCH_GITHUB__TOKEN`, `USERSEARCH_RETRY__MAX_RETRIES`)
//! 3. Config file (./usersearch.toml, then ~/.config/usersearch/config.toml)
//! 4. Built-in defaults
//!
//! A plain `GITHUB_TOKEN` is used when no token is configured otherwise.
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use GITHUB_TOKEN / USERSEARCH_GITHUB__TOKEN
//! api_url = "https://api.github.com"
//! user_agent = "usersearch"
//!
//! [retry]
//! max_retries = 3
//! base_delay_ms = 1000
//! max_delay_ms = 10000
//! jitter = true
//!
//! [search]
//! per_page = 30
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;
use usersearch::github::{DEFAULT_API_URL, DEFAULT_USER_AGENT};
use usersearch::retry::{DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_DELAY_MS, DEFAULT_MAX_RETRIES};
use usersearch::validation::DEFAULT_PER_PAGE;
use usersearch::{ClientConfig, RetryConfig};

/// Environment variable consulted when no token is configured.
pub const LEGACY_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub retry: RetrySettings,
    pub search: SearchConfig,
    pub server: ServerConfig,
}

/// GitHub API access.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Personal access token.
    pub token: Option<String>,
    pub api_url: String,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Retry and backoff behaviour for API requests.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            jitter: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Page size used when `--per-page` is not given.
    pub per_page: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/usersearch/config.toml)
    /// 3. Local config file (./usersearch.toml)
    /// 4. Environment variables with USERSEARCH_ prefix
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = Self::default_config_path()
            && path.exists()
        {
            tracing::debug!("Loading config from {:?}", path);
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let local_config = PathBuf::from("usersearch.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./usersearch.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        Self::from_builder(builder.add_source(env_source()))
    }

    fn from_builder(builder: config::ConfigBuilder<DefaultState>) -> Self {
        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<Config>() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to deserialize config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to build config: {}", e);
                Config::default()
            }
        }
    }

    /// The configured token, falling back to `GITHUB_TOKEN`. Blank values
    /// count as unset.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| std::env::var(LEGACY_TOKEN_VAR).ok())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            Duration::from_millis(self.retry.base_delay_ms),
            Duration::from_millis(self.retry.max_delay_ms),
            self.retry.max_retries,
        )
        .with_jitter(self.retry.jitter)
    }

    /// Build the library client configuration. Fails without a token.
    pub fn client_config(&self) -> Result<ClientConfig, Box<dyn std::error::Error>> {
        let token = self.github_token().ok_or(
            "No GitHub token configured. Set GITHUB_TOKEN, USERSEARCH_GITHUB__TOKEN, \
             or [github] token in the config file.",
        )?;
        Ok(ClientConfig::new(token)
            .with_api_url(self.github.api_url.clone())
            .with_user_agent(self.github.user_agent.clone())
            .with_retry(self.retry_config()))
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "usersearch").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("USERSEARCH")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
