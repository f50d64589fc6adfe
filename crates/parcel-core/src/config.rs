//! Configuration types for the parcel tracker
//!
//! Configuration is a plain value built once at startup (the binary reads
//! the environment) and injected into provider factories, the resolver and
//! the tracker. Nothing below the binary reads ambient environment state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main tracker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Parcel store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Provider credentials
    #[serde(default)]
    pub providers: ProviderCredentials,

    /// Resolver chain order
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Check-cycle settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// Notification transport
    #[serde(default)]
    pub notifier: NotifierConfig,
}

impl TrackerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()?;
        self.resolver.validate()?;
        self.engine.validate()?;
        self.notifier.validate()?;
        Ok(())
    }
}

/// Parcel store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// JSON file store
    File {
        /// Path to the store file
        path: String,
    },

    /// In-memory store (not persistent)
    #[default]
    Memory,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.trim().is_empty() => {
                Err(crate::Error::config("Store file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Credentials for keyed providers
///
/// A missing key disables that provider; it is never an error by itself.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderCredentials {
    /// Tracktry API key
    pub tracktry_api_key: Option<String>,

    /// 17TRACK API key
    pub seventeen_track_api_key: Option<String>,
}

// Keys never reach logs
impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(key: &Option<String>) -> &'static str {
            if key.is_some() { "<REDACTED>" } else { "<unset>" }
        }
        f.debug_struct("ProviderCredentials")
            .field("tracktry_api_key", &redact(&self.tracktry_api_key))
            .field("seventeen_track_api_key", &redact(&self.seventeen_track_api_key))
            .finish()
    }
}

/// Resolver chain: provider names, in the order they are tried
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Carrier-dedicated providers; each is tried first for parcels of its carrier
    #[serde(default = "default_dedicated")]
    pub dedicated: Vec<String>,

    /// Universal fallback providers, tried in order for every parcel
    #[serde(default = "default_universal")]
    pub universal: Vec<String>,
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self
            .dedicated
            .iter()
            .chain(self.universal.iter())
            .any(|name| name.trim().is_empty())
        {
            return Err(crate::Error::config("Resolver provider names cannot be empty"));
        }
        Ok(())
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            dedicated: default_dedicated(),
            universal: default_universal(),
        }
    }
}

fn default_dedicated() -> Vec<String> {
    ["colissimo", "chronopost", "cainiao", "yanwen"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_universal() -> Vec<String> {
    ["tracktry", "cainiao", "17track"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Which events a check may report as new
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionMode {
    /// Only the newest event is considered
    #[default]
    Latest,
    /// When the newest event is new, older unseen events are archived with it
    AllUnseen,
}

impl std::str::FromStr for DetectionMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "latest" => Ok(DetectionMode::Latest),
            "all-unseen" | "all_unseen" => Ok(DetectionMode::AllUnseen),
            other => Err(crate::Error::config(format!(
                "Unknown detection mode '{}'. Valid: latest, all-unseen",
                other
            ))),
        }
    }
}

/// Check-cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Parcels resolved concurrently during one check (1 = sequential)
    #[serde(default = "default_max_concurrent_checks")]
    pub max_concurrent_checks: usize,

    /// Upper bound on a single provider call (in seconds)
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Which events may be reported as new
    #[serde(default)]
    pub detection_mode: DetectionMode,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.max_concurrent_checks == 0 {
            return Err(crate::Error::config("max_concurrent_checks must be > 0"));
        }
        if self.call_timeout_secs == 0 {
            return Err(crate::Error::config("call_timeout_secs must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: default_max_concurrent_checks(),
            call_timeout_secs: default_call_timeout_secs(),
            detection_mode: DetectionMode::default(),
        }
    }
}

fn default_max_concurrent_checks() -> usize {
    4
}

fn default_call_timeout_secs() -> u64 {
    crate::traits::DEFAULT_HTTP_TIMEOUT.as_secs()
}

/// Notification transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Program and leading arguments; the message is appended last
    #[serde(default = "default_notify_command")]
    pub command: Vec<String>,

    /// Upper bound on one delivery (in seconds)
    #[serde(default = "default_notify_timeout_secs")]
    pub timeout_secs: u64,
}

impl NotifierConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(crate::Error::config("Notifier command cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Notifier timeout must be > 0"));
        }
        Ok(())
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            command: default_notify_command(),
            timeout_secs: default_notify_timeout_secs(),
        }
    }
}

fn default_notify_command() -> Vec<String> {
    ["openclaw", "message", "send", "--message"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_notify_timeout_secs() -> u64 {
    30
}
