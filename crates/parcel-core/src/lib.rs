// # parcel-core
//
// Core library for multi-carrier parcel tracking.
//
// ## Architecture Overview
//
// The pipeline is: carrier inference → provider resolution → event
// normalization → change detection.
//
// - **CarrierMatcher**: ordered shape rules mapping a tracking number to a carrier
// - **TrackingProvider**: trait every tracking source implements (carrier endpoint or aggregator)
// - **TrackingResolver**: dedicated provider first, then the universal chain; first result wins
// - **ChangeDetector**: compares the newest event against the parcel's notified set
// - **ParcelStore**: trait for persistent parcel state (the fingerprint ledger)
// - **ParcelTracker**: runs add/remove/list/track and the check cycle
// - **ProviderRegistry**: plugin-based registry that assembles the resolver chain
//
// ## Design Principles
//
// 1. **Separation of Concerns**: providers fetch, the detector decides, the store remembers
// 2. **Plugin-Based**: providers are registered by name, no hard-coded dispatch
// 3. **Library-First**: everything the binary does is available as a library
// 4. **Idempotency**: a re-poll with no new event changes nothing

pub mod carrier;
pub mod config;
pub mod detector;
pub mod error;
pub mod normalize;
pub mod notify;
pub mod registry;
pub mod resolver;
pub mod store;
#[cfg(feature = "test-util")]
pub mod testing;
pub mod tracker;
pub mod traits;

// Re-export core types for convenience
pub use carrier::{Carrier, CarrierMatcher, TrackingNumber, carrier_display_name, detect_carrier};
pub use config::{
    DetectionMode, EngineConfig, NotifierConfig, ProviderCredentials, ResolverConfig,
    StoreConfig, TrackerConfig,
};
pub use detector::{ChangeDetector, Detection, Update};
pub use error::{Error, Result};
pub use notify::{CommandNotifier, fallback_lines, format_message};
pub use registry::ProviderRegistry;
pub use resolver::TrackingResolver;
pub use store::{FileParcelStore, MemoryParcelStore, open_store};
pub use tracker::{CheckReport, ParcelTracker};
pub use traits::{
    DEFAULT_HTTP_TIMEOUT, Event, Fingerprint, HistoryEntry, Notifier, PENDING_STATUS, Parcel,
    ParcelStore, TrackingProvider, TrackingProviderFactory, TrackingResult,
};
