// # Memory Parcel Store
//
// In-memory implementation of ParcelStore.
//
// ## Purpose
//
// Provides a simple, fast store that doesn't persist across restarts.
// Useful for testing and for one-shot runs where nothing needs to survive.
//
// ## Crash Behavior
//
// - All parcels and fingerprints are lost on exit
// - A later run with a fresh store will report every latest event as new

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::carrier::TrackingNumber;
use crate::store::StoreData;
use crate::traits::parcel_store::{HistoryEntry, Parcel, ParcelStore};
use crate::traits::tracking_provider::Event;

/// In-memory parcel store
///
/// # Example
///
/// ```rust,no_run
/// use parcel_core::{MemoryParcelStore, Parcel, ParcelStore, TrackingNumber};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryParcelStore::new();
///     let number = TrackingNumber::parse("1Z999AA10123456784")?;
///     store.insert(Parcel::new(number.clone(), None, None, None)).await?;
///     assert!(store.get(&number).await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryParcelStore {
    inner: Arc<RwLock<StoreData>>,
}

impl MemoryParcelStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked parcels
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ParcelStore for MemoryParcelStore {
    async fn insert(&self, parcel: Parcel) -> Result<Parcel, Error> {
        self.inner.write().await.insert(parcel)
    }

    async fn get(&self, number: &TrackingNumber) -> Result<Option<Parcel>, Error> {
        Ok(self.inner.read().await.get(number))
    }

    async fn list(&self) -> Result<Vec<Parcel>, Error> {
        Ok(self.inner.read().await.list())
    }

    async fn update_parcel(&self, parcel: &Parcel) -> Result<(), Error> {
        self.inner.write().await.update(parcel)
    }

    async fn remove(&self, number: &TrackingNumber) -> Result<(), Error> {
        self.inner.write().await.remove(number)
    }

    async fn append_history(&self, number: &TrackingNumber, event: &Event) -> Result<(), Error> {
        self.inner.write().await.append_history(number, event)
    }

    async fn history(&self, number: &TrackingNumber) -> Result<Vec<HistoryEntry>, Error> {
        Ok(self.inner.read().await.history(number))
    }

    async fn flush(&self) -> Result<(), Error> {
        // Nothing to persist
        Ok(())
    }
}
