//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! PAT values are never part of this file; they are read from the process
//! environment (`PAT_*`) at start-up.

use graphql_probe::{DEFAULT_USER_AGENT, GRAPHQL_ENDPOINT};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file used when neither `--config` nor `CONFIG_PATH` is given
pub const DEFAULT_CONFIG_PATH: &str = "pat-info.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

/// GraphQL upstream used for probing
#[derive(Debug, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_graphql_url")]
    pub graphql_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Shared-cache window for successful reports. This is what keeps the
/// endpoint itself from burning quota when hit repeatedly.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_seconds")]
    pub cache_seconds: u64,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_max_connections() -> usize {
    64
}

fn default_graphql_url() -> String {
    GRAPHQL_ENDPOINT.to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_cache_seconds() -> u64 {
    300
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            graphql_url: default_graphql_url(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_seconds: default_cache_seconds(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| common::Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| common::Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.finish()
    }

    /// Like `load`, but a missing file at `DEFAULT_CONFIG_PATH` means built-in
    /// defaults. An explicitly requested path must exist.
    pub fn load_or_default(path: &Path) -> common::Result<Self> {
        if path == Path::new(DEFAULT_CONFIG_PATH) && !path.exists() {
            return Config::default().finish();
        }
        Self::load(path)
    }

    fn finish(mut self) -> common::Result<Self> {
        self.apply_env()?;
        self.validate()?;
        Ok(self)
    }

    /// `CACHE_SECONDS` wins over the file when it is a positive integer and
    /// is ignored otherwise. `LISTEN_ADDR` must parse when set.
    fn apply_env(&mut self) -> common::Result<()> {
        if let Ok(raw) = std::env::var("CACHE_SECONDS")
            && let Ok(secs) = raw.trim().parse::<u64>()
            && secs > 0
        {
            self.cache.cache_seconds = secs;
        }

        if let Ok(raw) = std::env::var("LISTEN_ADDR") {
            self.server.listen_addr = raw.parse().map_err(|e| {
                common::Error::Invalid(format!("LISTEN_ADDR is not a socket address ({raw}): {e}"))
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> common::Result<()> {
        if !self.upstream.graphql_url.starts_with("http://")
            && !self.upstream.graphql_url.starts_with("https://")
        {
            return Err(common::Error::Invalid(format!(
                "graphql_url must start with http:// or https://, got: {}",
                self.upstream.graphql_url
            )));
        }

        if self.upstream.timeout_secs == 0 {
            return Err(common::Error::Invalid(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.server.max_connections == 0 {
            return Err(common::Error::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.cache.cache_seconds == 0 {
            return Err(common::Error::Invalid(
                "cache_seconds must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from(DEFAULT_CONFIG_PATH)
    }
}
