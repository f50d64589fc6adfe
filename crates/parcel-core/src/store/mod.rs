// # Parcel Store Implementations
//
// This module provides implementations of the ParcelStore trait for
// different persistence strategies. Both share `StoreData`, the plain
// in-memory table the trait operations are defined against; the file
// store adds persistence around it.

pub mod file;
pub mod memory;

pub use file::FileParcelStore;
pub use memory::MemoryParcelStore;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::carrier::TrackingNumber;
use crate::config::StoreConfig;
use crate::traits::parcel_store::{
    HistoryEntry, Parcel, ParcelStore, duplicate_error, missing_error, sort_newest_first,
};
use crate::traits::tracking_provider::Event;

/// Open the store described by the configuration
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn ParcelStore>, Error> {
    match config {
        StoreConfig::File { path } => {
            tracing::debug!(path = %path, "opening file parcel store");
            Ok(Arc::new(FileParcelStore::new(path).await?))
        }
        StoreConfig::Memory => {
            tracing::debug!("using in-memory parcel store");
            Ok(Arc::new(MemoryParcelStore::new()))
        }
    }
}

/// Parcels and history, keyed by normalized tracking number
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct StoreData {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    parcels: HashMap<String, Parcel>,
    #[serde(default)]
    history: HashMap<String, Vec<HistoryEntry>>,
}

impl StoreData {
    pub(crate) fn len(&self) -> usize {
        self.parcels.len()
    }

    pub(crate) fn insert(&mut self, mut parcel: Parcel) -> Result<Parcel, Error> {
        let key = parcel.tracking_number.as_str().to_string();
        if self.parcels.contains_key(&key) {
            return Err(duplicate_error(&parcel.tracking_number));
        }

        // Ids keep increasing even across removals
        let max_id = self.parcels.values().map(|p| p.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id) + 1;
        parcel.id = self.next_id;

        self.parcels.insert(key, parcel.clone());
        Ok(parcel)
    }

    pub(crate) fn get(&self, number: &TrackingNumber) -> Option<Parcel> {
        self.parcels.get(number.as_str()).cloned()
    }

    pub(crate) fn list(&self) -> Vec<Parcel> {
        let mut parcels: Vec<Parcel> = self.parcels.values().cloned().collect();
        sort_newest_first(&mut parcels);
        parcels
    }

    pub(crate) fn update(&mut self, parcel: &Parcel) -> Result<(), Error> {
        match self.parcels.get_mut(parcel.tracking_number.as_str()) {
            Some(stored) => {
                stored.absorb(parcel);
                Ok(())
            }
            None => Err(missing_error(&parcel.tracking_number)),
        }
    }

    pub(crate) fn remove(&mut self, number: &TrackingNumber) -> Result<(), Error> {
        if self.parcels.remove(number.as_str()).is_none() {
            return Err(missing_error(number));
        }
        self.history.remove(number.as_str());
        Ok(())
    }

    pub(crate) fn append_history(&mut self, number: &TrackingNumber, event: &Event) -> Result<(), Error> {
        if !self.parcels.contains_key(number.as_str()) {
            return Err(missing_error(number));
        }
        self.history
            .entry(number.as_str().to_string())
            .or_default()
            .push(HistoryEntry {
                tracking_number: number.clone(),
                event: event.clone(),
                recorded_at: Utc::now(),
            });
        Ok(())
    }

    pub(crate) fn history(&self, number: &TrackingNumber) -> Vec<HistoryEntry> {
        self.history.get(number.as_str()).cloned().unwrap_or_default()
    }
}
