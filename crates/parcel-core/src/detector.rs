//! Change detection
//!
//! Decides whether a fresh tracking result carries an event the user has not
//! been told about yet. Detection is keyed on the newest event's
//! fingerprint; the detector itself is pure and returns the parcel state to
//! write back rather than writing it.

use serde::Serialize;

use crate::carrier::TrackingNumber;
use crate::config::DetectionMode;
use crate::traits::{Event, Fingerprint, Parcel, TrackingResult};

/// A new event to report upward
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Update {
    pub tracking_number: TrackingNumber,
    pub alias: Option<String>,
    /// Carrier code: the provider's if it named one, else the stored hint
    pub carrier: Option<String>,
    pub status: String,
    /// The newest event
    pub event: Event,
}

/// Outcome of a positive detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub update: Update,
    /// Parcel with the new fingerprints and refreshed status fields
    pub parcel: Parcel,
    /// Events to append to history, oldest first
    pub archive: Vec<Event>,
}

/// Compares results against a parcel's notified set
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    mode: DetectionMode,
}

impl ChangeDetector {
    pub fn new(mode: DetectionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    /// Detect a new event.
    ///
    /// Returns `None` when the result has no events or its newest event was
    /// already notified; in both cases the parcel must not be touched.
    pub fn detect(&self, parcel: &Parcel, result: &TrackingResult) -> Option<Detection> {
        let latest = result.latest()?;
        let fingerprint = Fingerprint::of(latest);
        if parcel.has_notified(&fingerprint) {
            return None;
        }

        let carrier = result
            .carrier
            .clone()
            .filter(|code| !code.is_empty())
            .or_else(|| parcel.carrier_hint.map(|c| c.code().to_string()));

        let mut archive = Vec::new();
        let mut updated = parcel.clone();

        // Inserted first so an older duplicate of the latest event is skipped
        updated.notified.insert(fingerprint);

        if self.mode == DetectionMode::AllUnseen {
            // Older events arrive newest-first; archive them oldest-first
            for older in result.events[1..].iter().rev() {
                if updated.notified.insert(Fingerprint::of(older)) {
                    archive.push(older.clone());
                }
            }
        }

        archive.push(latest.clone());

        updated.status = Some(result.status.clone());
        updated.last_carrier = carrier.clone();
        updated.last_event = Some(latest.description.clone());
        updated.last_update = Some(latest.timestamp.clone());

        Some(Detection {
            update: Update {
                tracking_number: parcel.tracking_number.clone(),
                alias: parcel.alias.clone(),
                carrier,
                status: result.status.clone(),
                event: latest.clone(),
            },
            parcel: updated,
            archive,
        })
    }
}
