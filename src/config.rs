use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the community, e.g. `https://intranet.example.com`.
    pub endpoint: Url,
    /// Community key the v2 API routes are scoped to.
    pub community_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub default_limit: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

fn default_search_limit() -> u32 {
    5
}

/// API credentials for the community, read from the environment once and
/// passed explicitly to the client constructor. `IGLOO_ACCESS_KEY` and
/// `IGLOO_API_KEY` identify the application, `IGLOO_USER`/`IGLOO_PASS` the
/// service account the session runs as.
#[derive(Debug, Clone)]
pub struct IglooCredentials {
    pub user: String,
    pub pass: String,
    pub api_key: String,
    pub access_key: String,
}

impl IglooCredentials {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            user: std::env::var("IGLOO_USER").context("IGLOO_USER not set")?,
            pass: std::env::var("IGLOO_PASS").context("IGLOO_PASS not set")?,
            api_key: std::env::var("IGLOO_API_KEY").context("IGLOO_API_KEY not set")?,
            access_key: std::env::var("IGLOO_ACCESS_KEY").context("IGLOO_ACCESS_KEY not set")?,
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate backend
    match config.backend.endpoint.scheme() {
        "http" | "https" => {}
        other => anyhow::bail!("backend.endpoint must be http or https, got '{}'", other),
    }
    if config.backend.endpoint.cannot_be_a_base() {
        anyhow::bail!(
            "backend.endpoint is not a usable base URL: {}",
            config.backend.endpoint
        );
    }
    if config.backend.community_key.trim().is_empty() {
        anyhow::bail!("backend.community_key must not be empty");
    }
    if config.backend.timeout_secs == 0 {
        anyhow::bail!("backend.timeout_secs must be >= 1");
    }

    // Validate server
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }

    // Validate search
    if config.search.default_limit == 0 {
        anyhow::bail!("search.default_limit must be >= 1");
    }

    Ok(config)
}
