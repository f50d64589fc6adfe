//! Environment configuration
//!
//! The environment is read exactly once, through a lookup function, and
//! turned into a [`TrackerConfig`] plus the log level. Tests pass a map
//! instead of touching the process environment.

use anyhow::{Context, Result, bail};
use parcel_core::{DetectionMode, StoreConfig, TrackerConfig};
use tracing::Level;

const DEFAULT_LOG_LEVEL: &str = "warn";
const DEFAULT_STORE_FILE: &str = ".parcel-tracker/parcels.json";

/// Everything the binary needs from its environment
#[derive(Debug)]
pub struct CliConfig {
    pub tracker: TrackerConfig,
    pub log_level: Level,
}

impl CliConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Unset and blank are the same thing.
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut tracker = TrackerConfig::default();

        tracker.store = match var("PARCEL_STORE_TYPE").as_deref().unwrap_or("file") {
            "file" => StoreConfig::File {
                path: var("PARCEL_STORE_PATH")
                    .unwrap_or_else(|| default_store_path(var("HOME").as_deref())),
            },
            "memory" => StoreConfig::Memory,
            other => bail!(
                "PARCEL_STORE_TYPE '{}' is not supported. Supported types: file, memory",
                other
            ),
        };

        tracker.providers.tracktry_api_key = var("TRACKTRY_API_KEY");
        tracker.providers.seventeen_track_api_key =
            var("SEVENTEEN_TRACK_API_KEY").or_else(|| var("17TRACK_API_KEY"));

        if let Some(raw) = var("PARCEL_MAX_CONCURRENT_CHECKS") {
            tracker.engine.max_concurrent_checks = raw
                .parse::<usize>()
                .with_context(|| {
                    format!("PARCEL_MAX_CONCURRENT_CHECKS must be a number. Got: {}", raw)
                })?;
        }

        if let Some(raw) = var("PARCEL_CALL_TIMEOUT_SECS") {
            tracker.engine.call_timeout_secs = raw
                .parse::<u64>()
                .with_context(|| {
                    format!("PARCEL_CALL_TIMEOUT_SECS must be a number. Got: {}", raw)
                })?;
        }

        if let Some(raw) = var("PARCEL_DETECTION_MODE") {
            tracker.engine.detection_mode = raw.parse::<DetectionMode>()?;
        }

        if let Some(raw) = var("PARCEL_NOTIFY_COMMAND") {
            tracker.notifier.command = raw.split_whitespace().map(String::from).collect();
        }

        tracker.validate()?;

        let log_level =
            parse_log_level(var("PARCEL_LOG_LEVEL").as_deref().unwrap_or(DEFAULT_LOG_LEVEL))?;

        Ok(Self { tracker, log_level })
    }
}

fn default_store_path(home: Option<&str>) -> String {
    match home {
        Some(home) => format!("{}/{}", home.trim_end_matches('/'), DEFAULT_STORE_FILE),
        None => DEFAULT_STORE_FILE.to_string(),
    }
}

fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => bail!(
            "PARCEL_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            raw
        ),
    }
}
