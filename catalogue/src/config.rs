//! Catalogue configuration.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use derivative::Derivative;
use sea_orm::ConnectOptions;
use serde::Deserialize;
use xdg::BaseDirectories;

/// Application prefix in XDG base directories.
///
/// This will be concatenated into `$XDG_CONFIG_HOME/tapecat`.
const XDG_PREFIX: &str = "tapecat";

/// Environment variable storing the configuration itself.
const ENV_CONFIG: &str = "TAPECAT_CATALOGUE_CONFIG";

/// Configuration for the catalogue.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Database connection.
    pub database: DatabaseConfig,

    /// Archive file listings.
    #[serde(rename = "archive-file-listing")]
    #[serde(default = "Default::default")]
    pub archive_file_listing: ArchiveFileListingConfig,
}

/// Database connection configuration.
#[derive(Clone, Derivative, Deserialize)]
#[derivative(Debug)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Connection URL.
    ///
    /// The URL may embed credentials, so it is never printed.
    #[derivative(Debug = "ignore")]
    pub url: String,

    /// Maximum number of pooled connections.
    ///
    /// Must be 1 for in-memory SQLite databases, since every
    /// connection would otherwise see its own empty database.
    #[serde(rename = "max-connections")]
    pub max_connections: Option<u32>,

    /// How long to wait when opening a connection.
    #[serde(rename = "connect-timeout")]
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Whether to log every SQL statement.
    #[serde(rename = "sqlx-logging")]
    #[serde(default = "default_sqlx_logging")]
    pub sqlx_logging: bool,
}

/// Archive file listing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveFileListingConfig {
    /// Number of archive files fetched per round-trip by listing streams.
    #[serde(rename = "page-size")]
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl DatabaseConfig {
    /// Returns the options to open the connection pool with.
    pub fn connect_options(&self) -> ConnectOptions {
        let mut options = ConnectOptions::new(self.url.clone());
        options
            .connect_timeout(self.connect_timeout)
            .sqlx_logging(self.sqlx_logging);

        if let Some(max_connections) = self.max_connections {
            options.max_connections(max_connections);
        }

        options
    }
}

impl Default for ArchiveFileListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_sqlx_logging() -> bool {
    false
}

fn default_page_size() -> u64 {
    1000
}

pub fn load_config_from_path(path: &Path) -> Result<Config> {
    tracing::info!("Using configurations: {:?}", path);

    let config = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {:?}", path))?;
    load_config_from_str(&config)
}

pub fn load_config_from_str(s: &str) -> Result<Config> {
    let config: Config = toml::from_str(s).context("Invalid configuration file")?;

    if config.archive_file_listing.page_size == 0 {
        anyhow::bail!("archive-file-listing.page-size must not be zero");
    }

    Ok(config)
}

/// Loads the configuration in the standard order of precedence.
///
/// An explicit path wins, then the `TAPECAT_CATALOGUE_CONFIG` environment
/// variable, then the XDG configuration file.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    if let Some(config_path) = config_path {
        return load_config_from_path(config_path);
    }

    if let Ok(config_env) = env::var(ENV_CONFIG) {
        tracing::info!("Using configurations from environment variable");
        return load_config_from_str(&config_env);
    }

    let config_path = get_xdg_config_path()?;
    if !config_path.exists() {
        anyhow::bail!(
            "No configuration found. Pass one with -f, set {} or create {:?}",
            ENV_CONFIG,
            config_path
        );
    }

    load_config_from_path(&config_path)
}

pub fn get_xdg_config_path() -> Result<PathBuf> {
    let xdg_dirs = BaseDirectories::with_prefix(XDG_PREFIX)?;
    let config_path = xdg_dirs.get_config_home().join("catalogue.toml");

    Ok(config_path)
}
