// # Aggregator Tracking Providers
//
// Universal providers backed by keyed multi-carrier APIs. Each factory
// refuses to build without its API key, which leaves the provider out of
// the resolver chain instead of failing startup.
//
// ## Providers
//
// - `tracktry`: Tracktry v1 (`TRACKTRY_API_KEY`)
// - `17track`: 17TRACK v2.2 (`SEVENTEEN_TRACK_API_KEY` / `17TRACK_API_KEY`)
//
// ## Security
//
// API keys are never logged; Debug output redacts them.

mod http;
pub mod seventeen_track;
pub mod tracktry;


use parcel_core::ProviderRegistry;

pub use seventeen_track::{SeventeenTrackFactory, SeventeenTrackProvider};
pub use tracktry::{TracktryFactory, TracktryProvider};

/// Register the aggregator providers with a registry
///
/// # Example
///
/// ```rust
/// use parcel_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// parcel_provider_aggregators::register(&registry);
/// assert!(registry.has_provider("17track"));
/// ```
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider("tracktry", Box::new(TracktryFactory));
    registry.register_provider("17track", Box::new(SeventeenTrackFactory));
}
