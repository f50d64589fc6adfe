// # Carrier Tracking Providers
//
// Providers that talk to a single carrier's own public tracking endpoint.
// None of them needs a credential.
//
// ## Providers
//
// - `colissimo`: La Poste unified tracking (Colissimo and La Poste letters)
// - `chronopost`: Chronopost tracking
// - `cainiao`: Cainiao global tracking, also usable as a universal fallback
// - `yanwen`: Yanwen lookup page (presence check only)
//
// ## Usage
//
// ```rust,ignore
// let registry = ProviderRegistry::new();
// parcel_provider_carriers::register(&registry);
// ```

pub mod cainiao;
pub mod chronopost;
pub mod colissimo;
mod http;
pub mod yanwen;


use parcel_core::ProviderRegistry;

pub use cainiao::{CainiaoFactory, CainiaoProvider};
pub use chronopost::{ChronopostFactory, ChronopostProvider};
pub use colissimo::{ColissimoFactory, ColissimoProvider};
pub use yanwen::{YanwenFactory, YanwenProvider};

/// Register every carrier provider with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_provider("colissimo", Box::new(ColissimoFactory));
    registry.register_provider("chronopost", Box::new(ChronopostFactory));
    registry.register_provider("cainiao", Box::new(CainiaoFactory));
    registry.register_provider("yanwen", Box::new(YanwenFactory));
}
