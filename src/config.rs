use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::notify::sendgrid;
use crate::version::registries::npm;

// =============================================================================
// Time-related constants
// =============================================================================

/// Default check interval in milliseconds (24 hours)
pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

/// Timeout for each HTTP request in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Delay between starting each dependency check to avoid rate limiting (10ms)
pub const FETCH_STAGGER_DELAY_MS: u64 = 10;

/// Default number of dependency checks allowed in flight at once
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 10;

/// Upper bound accepted for `MAX_CONCURRENT_FETCHES`
pub const MAX_CONCURRENT_FETCHES_LIMIT: usize = 1024;

/// Default sender display name
pub const DEFAULT_SENDER_NAME: &str = "depwatch";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Runtime configuration, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Manifests to watch (`MANIFEST_URLS`)
    pub manifest_urls: Vec<String>,
    /// Dependencies that also alert on minor releases (`MINOR_DEPENDENCIES`)
    pub minor_dependencies: HashSet<String>,
    /// Alert recipients (`NOTIFY_EMAILS`)
    pub recipients: Vec<String>,
    pub sender_email: String,
    pub sender_name: String,
    pub sendgrid_key: String,
    pub sendgrid_url: String,
    /// Base of the upstream package listing (`REGISTRY_URL`)
    pub registry_url: String,
    pub ledger_path: PathBuf,
    pub check_interval: Duration,
    pub fetch_timeout: Duration,
    pub max_concurrent_fetches: usize,
    /// Write logs here instead of stderr (`DEPWATCH_LOG_FILE`)
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let recipients = split_list(get("NOTIFY_EMAILS").as_deref());
        if recipients.is_empty() {
            return Err(ConfigError::Missing("NOTIFY_EMAILS"));
        }

        Ok(Self {
            manifest_urls: split_list(get("MANIFEST_URLS").as_deref()),
            minor_dependencies: split_list(get("MINOR_DEPENDENCIES").as_deref())
                .into_iter()
                .collect(),
            recipients,
            sender_email: required("SENDER_EMAIL")?,
            sender_name: get("SENDER_NAME").unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string()),
            sendgrid_key: required("SENDGRID_KEY")?,
            sendgrid_url: get("SENDGRID_URL")
                .unwrap_or_else(|| sendgrid::DEFAULT_BASE_URL.to_string()),
            registry_url: get("REGISTRY_URL").unwrap_or_else(|| npm::DEFAULT_BASE_URL.to_string()),
            ledger_path: get("LEDGER_PATH").map(PathBuf::from).unwrap_or_else(db_path),
            check_interval: Duration::from_millis(parse_number(
                "CHECK_INTERVAL_MS",
                get("CHECK_INTERVAL_MS"),
                DEFAULT_CHECK_INTERVAL_MS,
            )?),
            fetch_timeout: Duration::from_millis(FETCH_TIMEOUT_MS),
            max_concurrent_fetches: parse_concurrency(get("MAX_CONCURRENT_FETCHES"))?,
            log_file: get("DEPWATCH_LOG_FILE").map(PathBuf::from),
        })
    }
}

/// Split a comma- and/or space-separated list, dropping empty entries
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split([' ', ','])
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_number<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    match value {
        None => Ok(default),
        Some(value) => match value.parse::<T>() {
            Ok(n) if n > T::default() => Ok(n),
            _ => Err(ConfigError::Invalid { var, value }),
        },
    }
}

fn parse_concurrency(value: Option<String>) -> Result<usize, ConfigError> {
    let limit = parse_number(
        "MAX_CONCURRENT_FETCHES",
        value.clone(),
        DEFAULT_MAX_CONCURRENT_FETCHES,
    )?;

    match value {
        Some(value) if limit > MAX_CONCURRENT_FETCHES_LIMIT => Err(ConfigError::Invalid {
            var: "MAX_CONCURRENT_FETCHES",
            value,
        }),
        _ => Ok(limit),
    }
}

/// Returns the path to the data directory for depwatch.
/// Uses $XDG_DATA_HOME/depwatch if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/depwatch,
/// or ./depwatch if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the default path to the ledger database.
pub fn db_path() -> PathBuf {
    data_dir().join("ledger.db")
}

/// Ledger location without requiring the rest of the configuration
pub fn ledger_path_from_env() -> PathBuf {
    std::env::var("LEDGER_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(db_path)
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("depwatch")
}
