// # File Parcel Store
//
// File-based implementation of ParcelStore with crash recovery.
//
// ## Purpose
//
// Keeps parcels, their notified fingerprints and their archived history
// across runs. A check cycle is only idempotent across restarts if the
// fingerprint ledger survives, so every successful mutation is written
// through before the call returns.
//
// ## Concurrent Runs
//
// Several processes may share one store file (a scheduled `check` while
// someone runs `add`). Every operation takes an advisory lock on
// `<path>.lock` and re-reads the file under it, so a mutation always applies
// to the latest state on disk and never writes back a stale snapshot.
//
// ## Crash Recovery
//
// - Atomic writes: write to `.tmp`, then rename over the store file
// - Automatic backup: the previous file is copied to `.backup` first
// - Corruption detection: the file must deserialize on load
// - Recovery: falls back to the backup if the main file is corrupted
// - A mutation whose write fails leaves the store unchanged
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "next_id": 2,
//   "parcels": {
//     "1Z999AA10123456784": {
//       "id": 2,
//       "tracking_number": "1Z999AA10123456784",
//       "carrier_hint": "ups",
//       "status": "In transit",
//       "notified": ["2024-03-01 10:00_In transit"],
//       ...
//     }
//   },
//   "history": {
//     "1Z999AA10123456784": [{ "event": {...}, "recorded_at": "..." }]
//   }
// }
// ```

use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::Error;
use crate::carrier::TrackingNumber;
use crate::store::StoreData;
use crate::traits::parcel_store::{HistoryEntry, Parcel, ParcelStore};
use crate::traits::tracking_provider::Event;

/// Store file format version
const STORE_FILE_VERSION: &str = "1.0";

/// How long an operation waits for another process to release the store
const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// File-based parcel store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use parcel_core::{FileParcelStore, Parcel, ParcelStore, TrackingNumber};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileParcelStore::new("/tmp/parcels.json").await?;
///     let number = TrackingNumber::parse("AB123456789FR")?;
///
///     // Written to disk before insert returns
///     store.insert(Parcel::new(number.clone(), None, None, None)).await?;
///     assert!(store.get(&number).await?.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileParcelStore {
    path: PathBuf,
    /// Serializes operations of this instance before they contend for the file lock
    local: Mutex<()>,
}

/// Serializable store file format
#[derive(Debug, Serialize, Deserialize)]
struct StoreFileFormat {
    version: String,
    #[serde(flatten)]
    data: StoreData,
}

/// Exclusive advisory lock on the store's lock file, released on drop
struct StoreLock {
    file: std::fs::File,
}

impl StoreLock {
    async fn acquire(path: &Path) -> Result<Self, Error> {
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .await
            .map_err(|e| {
                Error::state_store(format!("Failed to open lock file {}: {}", path.display(), e))
            })?
            .into_std()
            .await;

        let deadline = Instant::now() + LOCK_TIMEOUT;
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => return Ok(Self { file }),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if Instant::now() >= deadline {
                        return Err(Error::state_store(format!(
                            "Timed out waiting for store lock {}",
                            path.display()
                        )));
                    }
                    tokio::time::sleep(LOCK_RETRY_INTERVAL).await;
                }
                Err(e) => {
                    return Err(Error::state_store(format!(
                        "Failed to lock {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock anyway
        let _ = FileExt::unlock(&self.file);
    }
}

impl FileParcelStore {
    /// Create or load a file store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Load the existing store file, if any
    /// 3. If it is corrupted, load the backup instead
    /// 4. If both fail, start empty
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::state_store(format!(
                        "Failed to create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let store = Self {
            path,
            local: Mutex::new(()),
        };

        // Surface unreadable files and run backup recovery up front
        let data = store.snapshot().await?;
        tracing::debug!("Opened parcel store {}: {} parcels", store.path.display(), data.len());

        Ok(store)
    }

    /// Load the store file, recovering from the backup on corruption
    async fn load_with_recovery(path: &Path) -> Result<StoreData, Error> {
        let err = match Self::load(path).await {
            Ok(data) => {
                tracing::trace!("Loaded parcel store: {} parcels", data.len());
                return Ok(data);
            }
            Err(e) => e,
        };

        // Only a malformed file is treated as corruption; I/O errors propagate
        if !matches!(err, Error::Json(_)) {
            return Err(err);
        }

        tracing::warn!(
            "Store file {} appears corrupted: {}. Attempting recovery from backup.",
            path.display(),
            err
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with an empty store.");
            return Ok(StoreData::default());
        }

        match Self::load(&backup_path).await {
            Ok(data) => {
                tracing::info!("Recovered parcel store from backup: {} parcels", data.len());
                if let Err(restore_err) = fs::copy(&backup_path, path).await {
                    tracing::error!("Failed to restore store file from backup: {}", restore_err);
                }
                Ok(data)
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup also unreadable: {}. Starting with an empty store.",
                    backup_err
                );
                Ok(StoreData::default())
            }
        }
    }

    async fn load(path: &Path) -> Result<StoreData, Error> {
        if !path.exists() {
            tracing::debug!("Store file does not exist: {}", path.display());
            return Ok(StoreData::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state_store(format!("Failed to read store file {}: {}", path.display(), e))
        })?;

        let file: StoreFileFormat = serde_json::from_str(&content)?;

        if file.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Store file version mismatch: expected {}, got {}. Attempting to load anyway.",
                STORE_FILE_VERSION,
                file.version
            );
        }

        Ok(file.data)
    }

    /// Write the store atomically: temp file, backup, rename
    async fn write(&self, data: StoreData) -> Result<(), Error> {
        let file = StoreFileFormat {
            version: STORE_FILE_VERSION.to_string(),
            data,
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::state_store(format!("Failed to serialize store: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.flush().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Parcel store written to {}", self.path.display());
        Ok(())
    }

    /// Current contents of the store file, read under the lock
    async fn snapshot(&self) -> Result<StoreData, Error> {
        let _local = self.local.lock().await;
        let _lock = StoreLock::acquire(&self.lock_path()).await?;
        Self::load_with_recovery(&self.path).await
    }

    /// Apply a mutation to the latest on-disk state and write it through.
    ///
    /// The lock is held from the reload to the rename, so mutations from any
    /// process reach the disk one at a time. A mutation that fails, or whose
    /// write fails, changes nothing.
    async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut StoreData) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let _local = self.local.lock().await;
        let _lock = StoreLock::acquire(&self.lock_path()).await?;

        let mut data = Self::load_with_recovery(&self.path).await?;
        let value = op(&mut data)?;
        self.write(data).await?;
        Ok(value)
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn lock_path(&self) -> PathBuf {
        let mut lock = self.path.clone();
        lock.set_extension("lock");
        lock
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Path of the store file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ParcelStore for FileParcelStore {
    async fn insert(&self, parcel: Parcel) -> Result<Parcel, Error> {
        self.mutate(|data| data.insert(parcel)).await
    }

    async fn get(&self, number: &TrackingNumber) -> Result<Option<Parcel>, Error> {
        Ok(self.snapshot().await?.get(number))
    }

    async fn list(&self) -> Result<Vec<Parcel>, Error> {
        Ok(self.snapshot().await?.list())
    }

    async fn update_parcel(&self, parcel: &Parcel) -> Result<(), Error> {
        self.mutate(|data| data.update(parcel)).await
    }

    async fn remove(&self, number: &TrackingNumber) -> Result<(), Error> {
        self.mutate(|data| data.remove(number)).await
    }

    async fn append_history(&self, number: &TrackingNumber, event: &Event) -> Result<(), Error> {
        self.mutate(|data| data.append_history(number, event)).await
    }

    async fn history(&self, number: &TrackingNumber) -> Result<Vec<HistoryEntry>, Error> {
        Ok(self.snapshot().await?.history(number))
    }

    async fn flush(&self) -> Result<(), Error> {
        // Every mutation is already on disk
        Ok(())
    }
}
