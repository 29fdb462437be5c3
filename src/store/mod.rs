// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! File-backed cache store for the bookmark snapshot.
//!
//! The store persists one JSON artifact and answers two orthogonal
//! questions about it: *freshness* ([`CacheStore::is_valid`], a pure
//! mtime check that never parses content) and *usability*
//! ([`CacheStore::read_raw`], which parses regardless of age). An expired
//! artifact is still useful as the base of an incremental reconciliation
//! and as a fallback when a fetch fails, which is why the two gates are
//! kept separate.
//!
//! Parse failures are deliberately indistinguishable from a missing
//! artifact: a corrupt cache is a cold cache. Downstream sync logic
//! depends on that equivalence.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SyncConfig;
use crate::record::Bookmark;
use crate::snapshot::Snapshot;

/// Errors from the persistence layer.
///
/// These never cross the sync pipeline: the coordinator reports them via
/// the status path and keeps serving the in-memory result.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable read/write of the serialized snapshot, with staleness
/// evaluation.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    expiration: Duration,
}

impl CacheStore {
    /// Create a store over the given artifact path.
    pub fn new(path: impl Into<PathBuf>, expiration: Duration) -> Self {
        Self {
            path: path.into(),
            expiration,
        }
    }

    /// Create a store from the engine configuration.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.cache_path.clone(),
            Duration::from_secs(config.cache_expiration_secs),
        )
    }

    /// Path of the persisted artifact.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Freshness gate: the artifact exists and its mtime is younger than
    /// the expiration window. Filesystem metadata only; content is never
    /// parsed here, so a fresh-but-corrupt artifact still reports `true`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let Ok(meta) = std::fs::metadata(&self.path) else {
            return false;
        };
        let Ok(mtime) = meta.modified() else {
            return false;
        };
        match SystemTime::now().duration_since(mtime) {
            Ok(age) => age < self.expiration,
            // mtime in the future counts as fresh
            Err(_) => true,
        }
    }

    /// Read the snapshot only if the artifact is fresh and parses.
    pub async fn read(&self) -> Option<Snapshot> {
        if !self.is_valid() {
            return None;
        }
        self.read_raw().await
    }

    /// Read the snapshot regardless of freshness. Returns `None` when the
    /// artifact is missing, unreadable, or does not parse into a snapshot
    /// with a `bookmarks` field - corruption is treated as a cold cache.
    pub async fn read_raw(&self) -> Option<Snapshot> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    debug!(path = %self.path.display(), error = %e, "cache artifact unreadable");
                }
                return None;
            }
        };
        match serde_json::from_slice::<Snapshot>(&bytes) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "cache artifact failed to parse, treating as absent");
                None
            }
        }
    }

    /// Assemble and persist a snapshot: normalize every record, sort
    /// descending by recency, compute the watermark and count when not
    /// supplied, then [`persist`](Self::persist) the result.
    ///
    /// The assembled snapshot is returned so callers can serve it even when
    /// a later write fails at their level.
    pub async fn write(
        &self,
        records: Vec<Bookmark>,
        count: Option<u64>,
        watermark: Option<String>,
    ) -> Result<Snapshot, StorageError> {
        let snapshot = Snapshot::assemble(records, count, watermark);
        self.persist(&snapshot).await?;
        Ok(snapshot)
    }

    /// Atomically replace the artifact content with an already-assembled
    /// snapshot (temp file + rename, so readers never observe a torn
    /// artifact). Missing parent directories are created.
    pub async fn persist(&self, snapshot: &Snapshot) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            warn!(path = %self.path.display(), error = %e, "cache replace failed");
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        crate::metrics::record_store_write(snapshot.bookmarks.len(), bytes.len());
        debug!(
            path = %self.path.display(),
            records = snapshot.bookmarks.len(),
            count = snapshot.count,
            watermark = %snapshot.last_updated,
            "cache snapshot written"
        );
        Ok(())
    }

    /// Delete the artifact. Idempotent: a missing artifact is success.
    pub async fn clear(&self) -> Result<(), StorageError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
