//! Plugin-based provider registry
//!
//! Tracking providers are registered by name at startup and assembled into
//! a resolver chain from configuration, avoiding hardcoded dispatch on
//! provider names.
//!
//! ## Registration
//!
//! Provider crates expose a `register` function:
//!
//! ```rust,ignore
//! // In parcel-provider-aggregators
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("tracktry", Box::new(TracktryFactory));
//! }
//! ```
//!
//! ## Chain assembly
//!
//! ```rust,ignore
//! let registry = ProviderRegistry::new();
//! parcel_provider_carriers::register(&registry);
//! parcel_provider_aggregators::register(&registry);
//!
//! let resolver = registry.build_resolver(&config)?;
//! ```

use crate::config::TrackerConfig;
use crate::error::{Error, Result};
use crate::resolver::TrackingResolver;
use crate::traits::{TrackingProvider, TrackingProviderFactory};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Registry of tracking provider factories, keyed by provider name
///
/// ## Thread Safety
///
/// Interior mutability with RwLock allows concurrent reads and exclusive
/// registration.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Box<dyn TrackingProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider name used in the resolver chain (e.g., "tracktry")
    /// - `factory`: Factory object for creating provider instances
    pub fn register_provider(
        &self,
        name: impl Into<String>,
        factory: Box<dyn TrackingProviderFactory>,
    ) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), factory);
    }

    /// Create a provider by name
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn TrackingProvider>)`: Created provider instance
    /// - `Err(Error::Config)`: Unknown name, or the factory refused (e.g. missing credential)
    pub fn create_provider(
        &self,
        name: &str,
        config: &TrackerConfig,
    ) -> Result<Box<dyn TrackingProvider>> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let factory = providers
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown provider: {}", name)))?;
        factory.create(config)
    }

    /// List registered provider names, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider name is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }

    /// Assemble the resolver chain described by `config.resolver`.
    ///
    /// Providers that cannot be built (unknown name, missing credential) are
    /// logged as disabled and left out; the rest of the chain still works.
    /// A name used in both lists shares one instance.
    pub fn build_resolver(&self, config: &TrackerConfig) -> Result<TrackingResolver> {
        config.validate()?;

        let mut resolver =
            TrackingResolver::new(Duration::from_secs(config.engine.call_timeout_secs));
        let mut built: HashMap<String, Option<Arc<dyn TrackingProvider>>> = HashMap::new();

        let mut instance = |name: &str| -> Option<Arc<dyn TrackingProvider>> {
            built
                .entry(name.to_string())
                .or_insert_with(|| match self.create_provider(name, config) {
                    Ok(provider) => {
                        tracing::debug!(provider = name, "provider enabled");
                        Some(Arc::from(provider))
                    }
                    Err(Error::Config(reason)) => {
                        tracing::info!(provider = name, reason = %reason, "provider disabled");
                        None
                    }
                    Err(e) => {
                        tracing::warn!(provider = name, error = %e, "provider failed to initialize");
                        None
                    }
                })
                .clone()
        };

        for name in &config.resolver.dedicated {
            if let Some(provider) = instance(name) {
                if let Err(e) = resolver.add_dedicated(provider) {
                    tracing::warn!(provider = %name, error = %e, "skipping dedicated provider");
                }
            }
        }

        for name in &config.resolver.universal {
            if let Some(provider) = instance(name) {
                resolver.add_universal(provider);
            }
        }

        if resolver.is_empty() {
            tracing::warn!("no tracking providers are enabled; every parcel will be untrackable");
        }

        Ok(resolver)
    }
}
