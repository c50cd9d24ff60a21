//! Job configuration — paths, thresholds, and the fetch horizon.
//!
//! Every knob the job reads lives in [`JobConfig`], with defaults matching
//! the production deployment. Configs load from TOML where every field is
//! optional, so tests can override a single threshold without touching the
//! process environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while building a [`JobConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown horizon '{0}' (valid: 3month, 6month, 12month)")]
    UnknownHorizon(String),
}

/// Provider lookahead window for the earnings calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Horizon {
    #[default]
    #[serde(rename = "3month")]
    ThreeMonth,
    #[serde(rename = "6month")]
    SixMonth,
    #[serde(rename = "12month")]
    TwelveMonth,
}

impl Horizon {
    /// The wire string the provider expects in the `horizon` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThreeMonth => "3month",
            Self::SixMonth => "6month",
            Self::TwelveMonth => "12month",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Horizon {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3month" => Ok(Self::ThreeMonth),
            "6month" => Ok(Self::SixMonth),
            "12month" => Ok(Self::TwelveMonth),
            other => Err(ConfigError::UnknownHorizon(other.to_string())),
        }
    }
}

/// Complete configuration for a refresh or backfill run.
///
/// Defaults:
/// - `universe_path`: `eps_calendar_universe.csv`
/// - `cache_path`: `earnings_cache.json`
/// - `archive_dir`: `earnings_archive`
/// - `history_dir`: `earnings_history`
/// - `horizon`: `3month`
/// - `min_raw_rows`: 100 (the real calendar always exceeds this)
/// - `min_filtered_rows`: 10 (catches silent universe-match breakage)
/// - `backfill_days`: 30
/// - `endpoint`: the AlphaVantage query URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Path to the ticker watchlist CSV.
    pub universe_path: PathBuf,

    /// Path of the live, front-end-facing cache file.
    pub cache_path: PathBuf,

    /// Directory receiving timestamped copies of superseded snapshots.
    pub archive_dir: PathBuf,

    /// Directory receiving write-once per-report-date files.
    pub history_dir: PathBuf,

    /// Provider lookahead window.
    pub horizon: Horizon,

    /// Minimum raw row count below which the fetch is treated as a
    /// provider malfunction.
    pub min_raw_rows: usize,

    /// Minimum filtered row count below which the run is treated as a
    /// silent universe-matching failure.
    pub min_filtered_rows: usize,

    /// Length of the trailing backfill window, in days (inclusive).
    pub backfill_days: i64,

    /// Provider endpoint URL (query parameters are appended per request).
    pub endpoint: String,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            universe_path: PathBuf::from("eps_calendar_universe.csv"),
            cache_path: PathBuf::from("earnings_cache.json"),
            archive_dir: PathBuf::from("earnings_archive"),
            history_dir: PathBuf::from("earnings_history"),
            horizon: Horizon::ThreeMonth,
            min_raw_rows: 100,
            min_filtered_rows: 10,
            backfill_days: 30,
            endpoint: "https://www.alphavantage.co/query".to_string(),
        }
    }
}

impl JobConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string. Missing fields take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
