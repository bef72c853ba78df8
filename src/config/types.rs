//! Configuration types.
//!
//! The [`Config`] struct is the whole configuration surface of the crate.
//! Every field is optional in spirit: a missing credential or directory
//! degrades the corresponding acquisition tier or feature, it never fails
//! construction.

use std::env;
use std::path::PathBuf;

use clap::ValueEnum;

use crate::config::constants::DEFAULT_USER_AGENT;

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration.
///
/// Construct programmatically or via [`Config::from_env`]. Absent values
/// disable their feature: no license key means the vendor download tier is
/// skipped, no object cache directory means that tier is skipped, and so on.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the GeoIP database files. Falls back to a local
    /// `.geoip_cache` directory when unset or not writable.
    pub db_dir: Option<PathBuf>,

    /// Database edition identifiers to acquire (e.g. `GeoLite2-City`).
    pub edition_ids: Vec<String>,

    /// MaxMind account id. Optional; only used alongside the license key.
    pub account_id: Option<String>,

    /// MaxMind license key. Absent means the vendor download tier is
    /// unconfigured, which is a valid degraded state.
    pub license_key: Option<String>,

    /// Root directory for the object cache tier. Absent disables that tier.
    pub object_cache_dir: Option<PathBuf>,

    /// Per-request timeout in seconds for HTTP probes.
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_dir: None,
            edition_ids: crate::config::DEFAULT_EDITION_IDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            account_id: None,
            license_key: None,
            object_cache_dir: None,
            timeout_seconds: crate::config::HTTP_PROBE_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Builds a configuration from the process environment.
    ///
    /// Reads `GEOIP_DB_PATH`, `GEOIPUPDATE_EDITION_IDS` (whitespace
    /// separated), `MAXMIND_ACCOUNT_ID`, `MAXMIND_LICENSE_KEY`, and
    /// `OBJECT_CACHE_DIR`. Missing or empty variables leave the defaults in
    /// place.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = non_empty_var("GEOIP_DB_PATH") {
            config.db_dir = Some(PathBuf::from(dir));
        }
        if let Some(editions) = non_empty_var("GEOIPUPDATE_EDITION_IDS") {
            let ids: Vec<String> = editions.split_whitespace().map(str::to_string).collect();
            if !ids.is_empty() {
                config.edition_ids = ids;
            }
        }
        config.account_id = non_empty_var("MAXMIND_ACCOUNT_ID");
        config.license_key = non_empty_var("MAXMIND_LICENSE_KEY");
        config.object_cache_dir = non_empty_var("OBJECT_CACHE_DIR").map(PathBuf::from);

        config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
