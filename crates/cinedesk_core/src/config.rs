//! Runtime configuration resolved from the environment.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - Malformed values are errors, never silently replaced by defaults.

use crate::logging::default_log_level;
use crate::probe::prober::DEFAULT_PROBE_TIMEOUT;
use crate::probe::source::DEFAULT_MAX_PROBE_BYTES;
use crate::repo::catalog_repo::DEFAULT_STORAGE_KEY;
use crate::service::admin_session::CategorySwitchPolicy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "CINEDESK_DB_PATH";
pub const ENV_STORAGE_KEY: &str = "CINEDESK_STORAGE_KEY";
pub const ENV_LOG_LEVEL: &str = "CINEDESK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "CINEDESK_LOG_DIR";
pub const ENV_PROBE_TIMEOUT_MS: &str = "CINEDESK_PROBE_TIMEOUT_MS";
pub const ENV_PROBE_MAX_BYTES: &str = "CINEDESK_PROBE_MAX_BYTES";
pub const ENV_CATEGORY_SWITCH: &str = "CINEDESK_CATEGORY_SWITCH";

const DEFAULT_DB_FILE_NAME: &str = "cinedesk.sqlite3";

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { variable: &'static str, value: String },
    InvalidPolicy(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a positive integer, got `{value}`")
            }
            Self::InvalidPolicy(message) => write!(f, "{ENV_CATEGORY_SWITCH}: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Settings shared by the CLI and FFI surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    pub db_path: PathBuf,
    pub storage_key: String,
    pub log_level: String,
    /// File logging directory; `None` means no file logs.
    pub log_dir: Option<PathBuf>,
    pub probe_timeout: Duration,
    pub probe_max_bytes: usize,
    pub category_switch: CategorySwitchPolicy,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            probe_max_bytes: DEFAULT_MAX_PROBE_BYTES,
            category_switch: CategorySwitchPolicy::default(),
        }
    }
}

impl AdminConfig {
    /// Reads `CINEDESK_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(key) = get(ENV_STORAGE_KEY) {
            config.storage_key = key;
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = get(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(raw) = get(ENV_PROBE_TIMEOUT_MS) {
            config.probe_timeout = Duration::from_millis(parse_positive(ENV_PROBE_TIMEOUT_MS, &raw)?);
        }
        if let Some(raw) = get(ENV_PROBE_MAX_BYTES) {
            let bytes = parse_positive(ENV_PROBE_MAX_BYTES, &raw)?;
            config.probe_max_bytes =
                usize::try_from(bytes).map_err(|_| ConfigError::InvalidNumber {
                    variable: ENV_PROBE_MAX_BYTES,
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = get(ENV_CATEGORY_SWITCH) {
            config.category_switch = raw.parse().map_err(ConfigError::InvalidPolicy)?;
        }
        Ok(config)
    }
}

fn parse_positive(variable: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber {
            variable,
            value: raw.to_string(),
        }),
    }
}
