//! Core traits for the parcel tracker
//!
//! This module defines the abstract interfaces at the system's seams.
//!
//! - [`TrackingProvider`]: Query one tracking source and normalize its response
//! - [`ParcelStore`]: Persistent parcel state, notified-event ledger and history
//! - [`Notifier`]: Deliver a formatted update message

pub mod tracking_provider;
pub mod parcel_store;
pub mod notifier;

pub use tracking_provider::{
    DEFAULT_HTTP_TIMEOUT, Event, TrackingProvider, TrackingProviderFactory, TrackingResult,
};
pub use parcel_store::{Fingerprint, HistoryEntry, Parcel, ParcelStore, PENDING_STATUS};
pub use notifier::Notifier;
