//! Tracking resolver
//!
//! Tries providers in priority order for one parcel and returns the first
//! non-empty result:
//!
//! 1. The provider dedicated to the parcel's carrier, if there is one
//! 2. Every universal provider, in configured order
//!
//! Results are never merged. A provider that was already asked during the
//! same resolution is not asked again, and every call is bounded by the
//! configured timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::carrier::{Carrier, CarrierMatcher, TrackingNumber};
use crate::error::{Error, Result};
use crate::traits::{TrackingProvider, TrackingResult};

/// Ordered provider chain
pub struct TrackingResolver {
    dedicated: HashMap<Carrier, Arc<dyn TrackingProvider>>,
    universal: Vec<Arc<dyn TrackingProvider>>,
    matcher: CarrierMatcher,
    call_timeout: Duration,
}

impl TrackingResolver {
    /// Create an empty resolver
    pub fn new(call_timeout: Duration) -> Self {
        Self {
            dedicated: HashMap::new(),
            universal: Vec::new(),
            matcher: CarrierMatcher::builtin().clone(),
            call_timeout,
        }
    }

    /// Replace the matcher used when no carrier hint is given
    pub fn with_matcher(mut self, matcher: CarrierMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Register a carrier-dedicated provider.
    ///
    /// The provider must name its carrier. A later provider for the same
    /// carrier replaces the earlier one.
    pub fn add_dedicated(&mut self, provider: Arc<dyn TrackingProvider>) -> Result<()> {
        let carrier = provider.carrier().ok_or_else(|| {
            Error::config(format!(
                "Provider {} is not dedicated to a carrier",
                provider.provider_name()
            ))
        })?;
        if let Some(previous) = self.dedicated.insert(carrier, provider) {
            warn!(
                carrier = %carrier,
                replaced = previous.provider_name(),
                "dedicated provider replaced"
            );
        }
        Ok(())
    }

    /// Append a universal provider to the fallback chain
    pub fn add_universal(&mut self, provider: Arc<dyn TrackingProvider>) {
        self.universal.push(provider);
    }

    /// Dedicated provider for a carrier, if any
    pub fn dedicated_for(&self, carrier: Carrier) -> Option<&Arc<dyn TrackingProvider>> {
        self.dedicated.get(&carrier)
    }

    /// Names of the universal providers, in order
    pub fn universal_names(&self) -> Vec<&'static str> {
        self.universal.iter().map(|p| p.provider_name()).collect()
    }

    /// Whether no provider is configured at all
    pub fn is_empty(&self) -> bool {
        self.dedicated.is_empty() && self.universal.is_empty()
    }

    /// Matcher used when no carrier hint is given
    pub fn matcher(&self) -> &CarrierMatcher {
        &self.matcher
    }

    /// Per-call timeout
    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    /// Resolve a parcel through the chain.
    ///
    /// Without a hint, the carrier is taken from the matcher.
    ///
    /// # Returns
    ///
    /// - `Some(result)`: the first provider with events
    /// - `None`: nothing answered; the parcel is untrackable right now
    pub async fn resolve(
        &self,
        number: &TrackingNumber,
        hint: Option<Carrier>,
    ) -> Option<TrackingResult> {
        let carrier = hint.or_else(|| self.matcher.match_carrier(number.as_str()));
        let mut tried: Vec<&'static str> = Vec::new();

        if let Some(provider) = carrier.and_then(|c| self.dedicated.get(&c)) {
            tried.push(provider.provider_name());
            if let Some(result) = self.call(provider.as_ref(), number, carrier).await {
                return Some(result);
            }
        }

        for provider in &self.universal {
            let name = provider.provider_name();
            if tried.contains(&name) {
                debug!(provider = name, number = %number, "provider already tried, skipping");
                continue;
            }
            tried.push(name);
            if let Some(result) = self.call(provider.as_ref(), number, carrier).await {
                return Some(result);
            }
        }

        debug!(number = %number, tried = ?tried, "no provider returned tracking data");
        None
    }

    async fn call(
        &self,
        provider: &dyn TrackingProvider,
        number: &TrackingNumber,
        carrier: Option<Carrier>,
    ) -> Option<TrackingResult> {
        debug!(provider = provider.provider_name(), number = %number, "querying provider");
        match tokio::time::timeout(self.call_timeout, provider.fetch(number, carrier)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    provider = provider.provider_name(),
                    number = %number,
                    timeout_secs = self.call_timeout.as_secs_f64(),
                    "provider call timed out"
                );
                None
            }
        }
    }
}
