//! Configuration settings and validation.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::watcher::{PathMatcher, DEFAULT_CASE_PATTERN};
use crate::{Error, Result};

/// File name of the folder log database inside the data directory.
pub const DATABASE_FILE: &str = "created_folders.db";

/// Upper bound for the debounce window.
const MAX_DEBOUNCE_WINDOW: Duration = Duration::from_secs(3600);

/// Where the debounce gate keeps its last-admitted timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebounceMode {
    /// No gate, every matching creation is dispatched.
    Off,
    /// Timestamp kept in memory, reset on restart.
    #[default]
    Memory,
    /// Timestamp read from the folder log on every decision.
    Ledger,
}

impl FromStr for DebounceMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" => Ok(Self::Off),
            "memory" => Ok(Self::Memory),
            "ledger" => Ok(Self::Ledger),
            other => Err(format!(
                "invalid debounce mode '{other}', must be one of: off, memory, ledger"
            )),
        }
    }
}

impl fmt::Display for DebounceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Off => "off",
            Self::Memory => "memory",
            Self::Ledger => "ledger",
        };
        f.write_str(name)
    }
}

/// Main configuration for the case watcher.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the directory tree to watch.
    pub watch_dir: PathBuf,

    /// Directory for the `SQLite` folder log.
    pub data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pattern a folder base name must match in full.
    pub case_pattern: String,

    /// Debounce gate variant.
    pub debounce_mode: DebounceMode,

    /// Minimum spacing between two dispatched case folders.
    pub debounce_window: Duration,

    /// Endpoint that receives new-case notifications.
    pub notify_url: Option<String>,

    /// Value sent in the `x-api-key` header.
    pub notify_api_key: Option<String>,

    /// Timeout for a single notification request.
    pub notify_timeout: Duration,

    /// How long shutdown waits for in-flight work.
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_dir: PathBuf::from("."),
            data_dir: PathBuf::from("./data"),
            log_level: "info".to_string(),
            case_pattern: DEFAULT_CASE_PATTERN.to_string(),
            debounce_mode: DebounceMode::default(),
            debounce_window: Duration::from_secs(1),
            notify_url: None,
            notify_api_key: None,
            notify_timeout: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.watch_dir.as_os_str().is_empty() {
            return Err(Error::config("watch_dir cannot be empty"));
        }

        PathMatcher::new(&self.case_pattern)?;

        if self.debounce_window > MAX_DEBOUNCE_WINDOW {
            return Err(Error::config("debounce window cannot exceed one hour"));
        }

        match &self.notify_url {
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(Error::config(format!(
                    "notify url '{url}' must start with http:// or https://"
                )));
            }
            None if self.notify_api_key.is_some() => {
                return Err(Error::config("notify api key given without a notify url"));
            }
            _ => {}
        }

        if self.notify_timeout.is_zero() {
            return Err(Error::config("notify timeout cannot be 0"));
        }

        if self.shutdown_grace.is_zero() {
            return Err(Error::config("shutdown grace period cannot be 0"));
        }

        Ok(())
    }

    /// Get the path to the `SQLite` database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    /// Effective debounce window, zero when the gate is off.
    #[must_use]
    pub const fn effective_window(&self) -> Duration {
        match self.debounce_mode {
            DebounceMode::Off => Duration::ZERO,
            DebounceMode::Memory | DebounceMode::Ledger => self.debounce_window,
        }
    }
}
