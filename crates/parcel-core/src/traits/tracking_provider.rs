// # Tracking Provider Trait
//
// Defines the interface every tracking source (carrier endpoint or
// multi-carrier aggregator) implements.
//
// ## Implementations
//
// - Carrier endpoints: `parcel-provider-carriers` crate (La Poste, Chronopost, Cainiao, Yanwen)
// - Aggregators: `parcel-provider-aggregators` crate (Tracktry, 17TRACK)
//
// ## Usage
//
// ```rust,ignore
// use parcel_core::TrackingProvider;
//
// let provider = /* TrackingProvider implementation */;
// if let Some(result) = provider.fetch(&number, None).await {
//     println!("{}: {}", result.provider, result.status);
// }
// ```

use crate::carrier::{Carrier, TrackingNumber};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on one provider HTTP request
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// One tracking checkpoint, normalized across providers
///
/// Every field is free text. Timestamps stay in whatever form the provider
/// sent, since formats vary and are not guaranteed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: String,
    pub status: String,
    pub location: String,
    pub description: String,
}

impl Event {
    pub fn new(
        timestamp: impl Into<String>,
        status: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            status: status.into(),
            location: location.into(),
            description: description.into(),
        }
    }
}

/// Result of one tracking query
///
/// Events are newest-first; `events[0]` is the latest checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingResult {
    /// Carrier code reported by the provider (may be outside [`Carrier`])
    pub carrier: Option<String>,
    /// Name of the provider that answered
    pub provider: String,
    /// Overall shipment status
    pub status: String,
    /// Checkpoints, newest first
    pub events: Vec<Event>,
}

impl TrackingResult {
    /// The newest checkpoint, if any
    pub fn latest(&self) -> Option<&Event> {
        self.events.first()
    }
}

/// Trait for tracking provider implementations
///
/// Implementors supply [`track`](TrackingProvider::track), which may fail.
/// Callers use [`fetch`](TrackingProvider::fetch), which never fails: any
/// error is logged on the diagnostic channel and becomes "no result", so a
/// resolver can always fall through to the next provider.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// - Build the provider-specific request (URL, headers, credential)
/// - Issue it with a bounded timeout
/// - Map the native response to [`Event`]s, newest first
/// - Substitute empty strings for missing optional fields
///
/// Providers never touch the parcel store, never retry, and never decide
/// whether an event is new.
#[async_trait]
pub trait TrackingProvider: Send + Sync {
    /// Query the provider
    ///
    /// # Returns
    ///
    /// - `Ok(Some(result))`: the provider knows this parcel
    /// - `Ok(None)`: the provider answered but has nothing for it
    /// - `Err(Error)`: transport or parse failure
    async fn track(
        &self,
        number: &TrackingNumber,
        hint: Option<Carrier>,
    ) -> Result<Option<TrackingResult>, crate::Error>;

    /// Query the provider, swallowing failures
    ///
    /// A result with no events counts as no result.
    async fn fetch(&self, number: &TrackingNumber, hint: Option<Carrier>) -> Option<TrackingResult> {
        match self.track(number, hint).await {
            Ok(Some(result)) if !result.events.is_empty() => Some(result),
            Ok(_) => {
                tracing::debug!(
                    provider = self.provider_name(),
                    number = %number,
                    "provider returned no events"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    provider = self.provider_name(),
                    number = %number,
                    error = %e,
                    "tracking query failed"
                );
                None
            }
        }
    }

    /// Provider name (for logging, chain configuration and results)
    fn provider_name(&self) -> &'static str;

    /// Carrier this provider is dedicated to, or `None` for universal providers
    fn carrier(&self) -> Option<Carrier> {
        None
    }
}

/// Helper trait for constructing tracking providers from configuration
pub trait TrackingProviderFactory: Send + Sync {
    /// Create a provider from the shared configuration
    ///
    /// # Returns
    ///
    /// - `Ok(provider)`: ready to use
    /// - `Err(Error::Config)`: a required credential is missing; the
    ///   provider is disabled, not fatal
    fn create(
        &self,
        config: &crate::config::TrackerConfig,
    ) -> Result<Box<dyn TrackingProvider>, crate::Error>;
}
