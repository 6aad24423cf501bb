//! Configuration loading
//!
//! Every setting is resolved with the same priority order:
//! 1. Environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)
//!
//! A missing TOML file is not an error; the service starts on defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit TOML file
pub const CONFIG_PATH_ENV: &str = "FRESHFEED_CONFIG";

pub const LISTEN_ADDR_ENV: &str = "FRESHFEED_LISTEN_ADDR";
pub const DATABASE_ENV: &str = "FRESHFEED_DATABASE";
pub const FEED_URL_ENV: &str = "FRESHFEED_FEED_URL";
pub const CATALOG_URL_ENV: &str = "FRESHFEED_CATALOG_URL";
pub const HTTP_TIMEOUT_ENV: &str = "FRESHFEED_HTTP_TIMEOUT";
pub const LOG_LEVEL_ENV: &str = "FRESHFEED_LOG_LEVEL";
pub const DEFAULT_SOURCE_ENV: &str = "FRESHFEED_DEFAULT_SOURCE";

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5740";
const DEFAULT_FEED_URL: &str = "https://www.reddit.com";
const DEFAULT_CATALOG_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SOURCE: &str = "hiphopheads";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Logging section of the TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// On-disk TOML layout. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    pub listen_addr: Option<String>,
    pub database_path: Option<PathBuf>,
    pub feed_base_url: Option<String>,
    pub catalog_base_url: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub default_source: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub database_path: PathBuf,
    pub feed_base_url: String,
    pub catalog_base_url: String,
    pub http_timeout_secs: u64,
    pub default_source: String,
    pub log_level: String,
}

impl ServiceConfig {
    /// Load the TOML file (if any) and resolve against the environment
    pub fn load() -> Result<Self> {
        let toml_config = match config_file_path() {
            Some(path) => load_toml_config(&path)?,
            None => {
                warn!("No config directory available, using defaults");
                TomlConfig::default()
            }
        };
        Self::resolve(&toml_config)
    }

    /// Resolve settings from environment variables over `toml_config` over defaults
    pub fn resolve(toml_config: &TomlConfig) -> Result<Self> {
        let http_timeout_secs = match env_value(HTTP_TIMEOUT_ENV) {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                Error::Config(format!("{} must be a number of seconds: {}", HTTP_TIMEOUT_ENV, e))
            })?,
            None => toml_config
                .http_timeout_secs
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            listen_addr: pick(LISTEN_ADDR_ENV, toml_config.listen_addr.as_deref(), DEFAULT_LISTEN_ADDR),
            database_path: env_value(DATABASE_ENV)
                .map(PathBuf::from)
                .or_else(|| toml_config.database_path.clone())
                .unwrap_or_else(default_database_path),
            feed_base_url: trim_base(pick(
                FEED_URL_ENV,
                toml_config.feed_base_url.as_deref(),
                DEFAULT_FEED_URL,
            )),
            catalog_base_url: trim_base(pick(
                CATALOG_URL_ENV,
                toml_config.catalog_base_url.as_deref(),
                DEFAULT_CATALOG_URL,
            )),
            http_timeout_secs,
            default_source: pick(
                DEFAULT_SOURCE_ENV,
                toml_config.default_source.as_deref(),
                DEFAULT_SOURCE,
            ),
            log_level: pick(
                LOG_LEVEL_ENV,
                toml_config.logging.level.as_deref(),
                DEFAULT_LOG_LEVEL,
            ),
        })
    }
}

/// Read a TOML config file.
///
/// Returns defaults with a warning when the file does not exist.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file not found at {}, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Path of the TOML file: `FRESHFEED_CONFIG` or `<config dir>/freshfeed/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = env_value(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("freshfeed").join("config.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("freshfeed"))
        .unwrap_or_else(|| PathBuf::from("./freshfeed_data"))
        .join("cache.db")
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn pick(env_name: &str, toml_value: Option<&str>, default: &str) -> String {
    env_value(env_name)
        .or_else(|| toml_value.map(str::to_string))
        .unwrap_or_else(|| default.to_string())
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
