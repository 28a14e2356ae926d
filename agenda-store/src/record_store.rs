use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use agenda_domain::Reservation;
use tempfile::NamedTempFile;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt reservation file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode reservations: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    /// Whether the failure happened while reading the medium.
    pub fn is_read(&self) -> bool {
        matches!(self, StoreError::Read { .. } | StoreError::Corrupt { .. })
    }

    pub fn is_write(&self) -> bool {
        !self.is_read()
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable home of the full reservation set, kept as one JSON array on disk.
///
/// Every access goes through the store's lock: plain reads share it, while
/// [`RecordStore::save_all`] and [`RecordStore::begin`] hold it exclusively,
/// so a read-check-write sequence inside a transaction cannot interleave with
/// another writer. Writes land in a temp file next to the target and are
/// renamed over it, so readers only ever see a complete file.
///
/// The exclusive guard travels with the blocking write and is released only
/// once the rename has finished, even if the awaiting future is dropped.
pub struct RecordStore {
    path: PathBuf,
    staging_dir: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl RecordStore {
    /// Open the store at `path`, creating the parent directory and an empty
    /// record set on first use.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let staging_dir = parent_dir(&path).unwrap_or_else(|| Path::new(".")).to_path_buf();
        let init_path = path.clone();
        let init_staging = staging_dir.clone();

        let created = tokio::task::spawn_blocking(move || initialize(&init_path, &init_staging))
            .await
            .map_err(|e| StoreError::Write {
                path: path.clone(),
                source: io::Error::other(e),
            })??;

        if created {
            info!("Initialized empty reservation store at {}", path.display());
        } else {
            debug!("Opened reservation store at {}", path.display());
        }

        Ok(Self {
            path,
            staging_dir,
            lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of every stored reservation.
    pub async fn load_all(&self) -> StoreResult<Vec<Reservation>> {
        let _guard = self.lock.read().await;
        read_records(&self.path).await
    }

    /// Replace the stored set with `records`.
    pub async fn save_all(&self, records: &[Reservation]) -> StoreResult<()> {
        let guard = self.lock.clone().write_owned().await;
        write_records(&self.path, &self.staging_dir, records, guard).await
    }

    /// Start an exclusive read-modify-write transaction on a fresh read of the set.
    pub async fn begin(&self) -> StoreResult<StoreTransaction<'_>> {
        let guard = self.lock.clone().write_owned().await;
        let records = read_records(&self.path).await?;
        Ok(StoreTransaction {
            store: self,
            records,
            guard,
        })
    }
}

/// Exclusive hold on the store plus the record set read under it.
///
/// Dropping the transaction without calling [`StoreTransaction::commit`]
/// releases the lock and leaves the file untouched. Once `commit` has
/// started, the write runs to completion under the lock whether or not the
/// caller keeps waiting for it.
pub struct StoreTransaction<'a> {
    store: &'a RecordStore,
    records: Vec<Reservation>,
    guard: OwnedRwLockWriteGuard<()>,
}

impl StoreTransaction<'_> {
    pub fn records(&self) -> &[Reservation] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut Vec<Reservation> {
        &mut self.records
    }

    /// Persist the (possibly modified) set and release the lock.
    pub async fn commit(self) -> StoreResult<()> {
        write_records(&self.store.path, &self.store.staging_dir, &self.records, self.guard).await
    }
}

async fn read_records(path: &Path) -> StoreResult<Vec<Reservation>> {
    let owned = path.to_path_buf();
    let records = tokio::task::spawn_blocking(move || read_file(&owned))
        .await
        .map_err(|e| StoreError::Read {
            path: path.to_path_buf(),
            source: io::Error::other(e),
        })??;

    debug!(count = records.len(), "Loaded reservations");
    Ok(records)
}

async fn write_records(
    path: &Path,
    staging_dir: &Path,
    records: &[Reservation],
    guard: OwnedRwLockWriteGuard<()>,
) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(records).map_err(StoreError::Encode)?;
    let owned = path.to_path_buf();
    let staging = staging_dir.to_path_buf();

    let result = tokio::task::spawn_blocking(move || {
        let written = write_atomic(&owned, &staging, &bytes);
        drop(guard);
        written
    })
    .await
    .map_err(|e| StoreError::Write {
        path: path.to_path_buf(),
        source: io::Error::other(e),
    })
    .and_then(|r| r);

    match &result {
        Ok(()) => debug!(count = records.len(), "Saved reservations"),
        Err(e) => error!("Reservation store write failed: {}", e),
    }
    result
}

fn initialize(path: &Path, staging_dir: &Path) -> StoreResult<bool> {
    if let Some(dir) = parent_dir(path) {
        fs::create_dir_all(dir).map_err(|source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    if path.exists() {
        return Ok(false);
    }
    write_atomic(path, staging_dir, b"[]")?;
    Ok(true)
}

fn read_file(path: &Path) -> StoreResult<Vec<Reservation>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        // Absent medium is an empty set; the next commit recreates it
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomic(path: &Path, staging_dir: &Path, bytes: &[u8]) -> StoreResult<()> {
    let write_err = |source: io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(staging_dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    // On failure the temp file is dropped and removed; the target is untouched
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}
