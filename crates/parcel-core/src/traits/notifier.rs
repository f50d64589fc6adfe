// # Notifier Trait
//
// Defines the notification transport boundary.
//
// A check cycle hands the transport exactly one pre-formatted message
// (see `crate::notify::format_message`). The transport reports success or
// failure; falling back to standard output is the caller's decision.
//
// ## Implementations
//
// - External command: `crate::notify::CommandNotifier`

use async_trait::async_trait;

/// Trait for notification transports
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message
    ///
    /// # Returns
    ///
    /// - `Ok(())`: the transport accepted the message
    /// - `Err(Error::Notification)`: delivery failed
    async fn send(&self, message: &str) -> Result<(), crate::Error>;

    /// Transport name (for logging)
    fn notifier_name(&self) -> &'static str;
}
