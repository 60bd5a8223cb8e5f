//! Client and application configuration.
//!
//! `ClientConfig` is what an `OgnaClient` is built from: the service base URL
//! plus transport settings, either set explicitly or read from the
//! environment (`OGNA_BASE_URL`, `OGNA_ENV`, `OGNA_TIMEOUT_SECS`).
//!
//! `Config` is the small persisted file remembering the last base URL and
//! email, stored at `~/.config/ogna/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "ogna";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_BASE_URL: &str = "OGNA_BASE_URL";
pub const ENV_DEPLOYMENT: &str = "OGNA_ENV";
pub const ENV_TIMEOUT_SECS: &str = "OGNA_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root, without trailing slashes.
    pub base_url: String,
    /// Production deployments mark persisted cookies `Secure`.
    pub production: bool,
    /// Whole-request timeout for the HTTP transport. `None` keeps the
    /// transport default.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            production: false,
            timeout: None,
        }
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build entirely from the process environment. `OGNA_BASE_URL` is required.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply `OGNA_ENV` and `OGNA_TIMEOUT_SECS` from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(ENV_BASE_URL)
            .filter(|url| !url.trim().is_empty())
            .with_context(|| format!("{} is not set", ENV_BASE_URL))?;
        Self::new(base_url).apply_lookup(lookup)
    }

    fn apply_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(deployment) = lookup(ENV_DEPLOYMENT) {
            self.production = deployment.trim().eq_ignore_ascii_case("production");
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))?;
            self.timeout = Some(Duration::from_secs(secs));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub base_url: Option<String>,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted cookie jar and local store for the
    /// configured service. Each origin gets its own directory.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(origin_dir(cache_dir.join(APP_NAME), self.base_url.as_deref()))
    }
}

/// `root` with one segment per service origin, so a session stored for one
/// server is never read by a client of another.
pub fn origin_dir(root: PathBuf, base_url: Option<&str>) -> PathBuf {
    match base_url {
        Some(url) => root.join(origin_key(url)),
        None => root,
    }
}

/// Filesystem-safe key for the scheme, host and port of `base_url`.
/// Paths below the origin do not change the key.
pub fn origin_key(base_url: &str) -> String {
    let (scheme, rest) = base_url.split_once("://").unwrap_or(("http", base_url));
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    format!("{}_{}", scheme, authority)
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}
