//! Error types for the parcel tracker
//!
//! Tracking failures (transport, parse) never escape a provider's `fetch`;
//! data errors (duplicate add, unknown removal) are surfaced to the caller.

use thiserror::Error;

/// Result type alias for parcel tracker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the parcel tracker
#[derive(Error, Debug)]
pub enum Error {
    /// Tracking provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// HTTP transport errors (DNS, connect, timeout, non-2xx)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Unexpected provider response shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration errors (including a missing provider credential)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parcel store errors
    #[error("State store error: {0}")]
    StateStore(String),

    /// Notification transport errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// Invalid input (e.g. a malformed tracking number)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Key already present in the store
    #[error("{0}")]
    AlreadyExists(String),

    /// Key not found in the store
    #[error("{0}")]
    NotFound(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a state store error
    pub fn state_store(msg: impl Into<String>) -> Self {
        Self::StateStore(msg.into())
    }

    /// Create a notification error
    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an "already exists" error
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether this is a user-facing data error rather than an infrastructure failure
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::AlreadyExists(_) | Self::NotFound(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_errors_are_classified() {
        assert!(Error::already_exists("dup").is_data_error());
        assert!(Error::not_found("missing").is_data_error());
        assert!(Error::invalid_input("bad").is_data_error());
        assert!(!Error::http("timeout").is_data_error());
        assert!(!Error::config("no key").is_data_error());
    }

    #[test]
    fn data_errors_display_their_message_verbatim() {
        let err = Error::not_found("Parcel XX123 not found");
        assert_eq!(err.to_string(), "Parcel XX123 not found");
    }
}
