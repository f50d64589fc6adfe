// # Parcel Store Trait
//
// Defines the interface for persistent parcel state.
//
// ## Purpose
//
// The store is the durable side of change detection. It keeps:
// - Every tracked parcel, keyed by normalized tracking number
// - Each parcel's notified-event fingerprints (the de-dup ledger)
// - An append-only history of archived events per parcel
//
// Fingerprints are never removed from a stored parcel. `update_parcel`
// merges the incoming set into the stored one, so a stale or concurrent
// writer can add to the ledger but never shrink it.
//
// ## Implementations
//
// - In-memory: `MemoryParcelStore`
// - JSON file: `FileParcelStore`

use crate::carrier::{Carrier, TrackingNumber};
use crate::traits::tracking_provider::Event;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Status given to a parcel before its first successful check
pub const PENDING_STATUS: &str = "Added - pending first check";

/// Deterministic de-dup key for an event: `"{timestamp}_{status}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(event: &Event) -> Self {
        Self(format!("{}_{}", event.timestamp, event.status))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked parcel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Store-assigned id, increasing with insertion order
    pub id: u64,
    pub tracking_number: TrackingNumber,
    /// Carrier detected when the parcel was added
    pub carrier_hint: Option<Carrier>,
    pub alias: Option<String>,
    pub destination: Option<String>,
    pub status: Option<String>,
    /// Carrier code reported by the last provider that answered
    pub last_carrier: Option<String>,
    /// Description of the last notified event
    pub last_event: Option<String>,
    /// Timestamp of the last notified event, as the provider sent it
    pub last_update: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Fingerprints of events already reported
    #[serde(default)]
    pub notified: BTreeSet<Fingerprint>,
}

impl Parcel {
    /// A fresh, not-yet-stored parcel (id is assigned on insert)
    pub fn new(
        tracking_number: TrackingNumber,
        carrier_hint: Option<Carrier>,
        alias: Option<String>,
        destination: Option<String>,
    ) -> Self {
        Self {
            id: 0,
            tracking_number,
            carrier_hint,
            alias,
            destination,
            status: Some(PENDING_STATUS.to_string()),
            last_carrier: None,
            last_event: None,
            last_update: None,
            created_at: Utc::now(),
            notified: BTreeSet::new(),
        }
    }

    pub fn has_notified(&self, fingerprint: &Fingerprint) -> bool {
        self.notified.contains(fingerprint)
    }

    /// Fold an updated copy into this stored parcel.
    ///
    /// Identity fields (id, number, hint, creation time) are kept; the
    /// notified set becomes the union of both.
    pub(crate) fn absorb(&mut self, incoming: &Parcel) {
        self.alias = incoming.alias.clone();
        self.destination = incoming.destination.clone();
        self.status = incoming.status.clone();
        self.last_carrier = incoming.last_carrier.clone();
        self.last_event = incoming.last_event.clone();
        self.last_update = incoming.last_update.clone();
        self.notified.extend(incoming.notified.iter().cloned());
    }
}

/// Newest-created first; ties broken by descending id
pub(crate) fn sort_newest_first(parcels: &mut [Parcel]) {
    parcels.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

pub(crate) fn duplicate_error(number: &TrackingNumber) -> crate::Error {
    crate::Error::already_exists(format!("Parcel {} is already being tracked", number))
}

pub(crate) fn missing_error(number: &TrackingNumber) -> crate::Error {
    crate::Error::not_found(format!("Parcel {} not found", number))
}

/// An archived event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub tracking_number: TrackingNumber,
    pub event: Event,
    pub recorded_at: DateTime<Utc>,
}

/// Trait for parcel store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks. Each
/// call is atomic with respect to the parcel it touches.
#[async_trait]
pub trait ParcelStore: Send + Sync {
    /// Insert a new parcel
    ///
    /// # Returns
    ///
    /// - `Ok(Parcel)`: the stored parcel, with its assigned id
    /// - `Err(Error::AlreadyExists)`: the tracking number is already stored
    async fn insert(&self, parcel: Parcel) -> Result<Parcel, crate::Error>;

    /// Get a parcel by tracking number
    async fn get(&self, number: &TrackingNumber) -> Result<Option<Parcel>, crate::Error>;

    /// List all parcels, newest-created first
    async fn list(&self) -> Result<Vec<Parcel>, crate::Error>;

    /// Overwrite a parcel's mutable fields, merging its notified set
    ///
    /// # Returns
    ///
    /// - `Err(Error::NotFound)`: the parcel was removed meanwhile
    async fn update_parcel(&self, parcel: &Parcel) -> Result<(), crate::Error>;

    /// Remove a parcel and its history
    ///
    /// # Returns
    ///
    /// - `Err(Error::NotFound)`: nothing stored under that number; the
    ///   store is left untouched
    async fn remove(&self, number: &TrackingNumber) -> Result<(), crate::Error>;

    /// Append an event to a parcel's history
    async fn append_history(
        &self,
        number: &TrackingNumber,
        event: &Event,
    ) -> Result<(), crate::Error>;

    /// A parcel's history, oldest entry first
    async fn history(&self, number: &TrackingNumber) -> Result<Vec<HistoryEntry>, crate::Error>;

    /// Persist any pending changes
    async fn flush(&self) -> Result<(), crate::Error>;
}
