// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Reconciliation: the fetch bodies behind the single-flight slot.
//!
//! `run_full` and `run_incremental` are only ever entered through
//! [`SyncCoordinator::run_fetch`](super::SyncCoordinator::run_fetch), so at
//! most one of them runs at a time per coordinator instance.
//! `reconcile_fresh` is the background decision path taken after a fresh
//! cache hit: throttle the metadata probe, compare remote totals and
//! watermark against the snapshot, and kick off an incremental sync when
//! they diverge.

use tracing::{debug, info, warn};

use crate::snapshot::{merge_by_id, Snapshot};
use crate::status::SyncPhase;

use super::{FetchKind, SyncCoordinator, SyncOutcome};

impl SyncCoordinator {
    /// Full fetch: replace the cache wholesale.
    ///
    /// On fetch failure, falls back to whatever snapshot is on disk (even
    /// an expired one); only with no cache of any kind does the outcome
    /// hard-fail with an empty record set. A write failure downgrades to a
    /// status message - the in-memory result is served regardless.
    pub(super) async fn run_full(&self) -> SyncOutcome {
        self.inner.status.emit(SyncPhase::Fetching(FetchKind::Full));

        match self.inner.source.fetch_all().await {
            Ok(records) => {
                crate::metrics::record_fetch("full", "success");
                let snapshot = Snapshot::assemble(records, None, None);
                let fetched = snapshot.bookmarks.len();
                match self.inner.store.persist(&snapshot).await {
                    Ok(()) => {
                        info!(records = fetched, "full sync complete");
                        self.inner.status.emit(SyncPhase::Updated(fetched));
                    }
                    Err(e) => {
                        crate::metrics::record_store_write_error();
                        warn!(error = %e, "snapshot write failed, serving in-memory result");
                        self.inner.status.emit(SyncPhase::StoreFailed(e.to_string()));
                    }
                }
                SyncOutcome::ok(snapshot.bookmarks)
            }
            Err(e) => {
                crate::metrics::record_fetch("full", "error");
                warn!(error = %e, "full fetch failed");
                self.inner.status.emit(SyncPhase::Failed(e.to_string()));

                if let Some(snapshot) = self.inner.store.read_raw().await {
                    if !snapshot.bookmarks.is_empty() {
                        debug!(
                            records = snapshot.bookmarks.len(),
                            "falling back to cached snapshot"
                        );
                        return SyncOutcome::ok(snapshot.bookmarks);
                    }
                }
                SyncOutcome::failed(e.to_string())
            }
        }
    }

    /// Incremental sync: fetch records newer than the cached watermark and
    /// merge them into the existing set by id.
    ///
    /// Falls back to a full fetch when no usable watermark or record set
    /// exists. The snapshot `count` is taken from a source metadata probe
    /// when one succeeds - deletions are invisible to an incremental
    /// fetch, so the remote total is authoritative - and recomputed from
    /// the merge result otherwise.
    pub(super) async fn run_incremental(&self, base: Option<Snapshot>) -> SyncOutcome {
        let base = match base {
            Some(snapshot) => Some(snapshot),
            None => self.inner.store.read_raw().await,
        };
        let Some(base) = base else {
            debug!("no snapshot to reconcile against, running full sync");
            return self.run_full().await;
        };
        if base.last_updated.is_empty() || base.bookmarks.is_empty() {
            debug!("snapshot has no watermark, running full sync");
            return self.run_full().await;
        }

        self.inner
            .status
            .emit(SyncPhase::Fetching(FetchKind::Incremental));

        match self.inner.source.fetch_since(&base.last_updated).await {
            Ok(updates) => {
                crate::metrics::record_fetch("incremental", "success");
                let changed = updates.len();
                let merged = merge_by_id(base.bookmarks, updates);

                let count = match self.inner.source.fetch_metadata().await {
                    Ok(meta) => Some(meta.count),
                    Err(e) => {
                        debug!(error = %e, "metadata unavailable after merge, recomputing count");
                        None
                    }
                };

                let snapshot = Snapshot::assemble(merged, count, None);
                match self.inner.store.persist(&snapshot).await {
                    Ok(()) => {
                        info!(changed, total = snapshot.bookmarks.len(), "incremental sync complete");
                        if changed > 0 {
                            self.inner.status.emit(SyncPhase::Updated(changed));
                        } else {
                            self.inner.status.emit(SyncPhase::UpToDate);
                        }
                    }
                    Err(e) => {
                        crate::metrics::record_store_write_error();
                        warn!(error = %e, "snapshot write failed, serving in-memory result");
                        self.inner.status.emit(SyncPhase::StoreFailed(e.to_string()));
                    }
                }
                SyncOutcome::ok(snapshot.bookmarks)
            }
            Err(e) => {
                crate::metrics::record_fetch("incremental", "error");
                warn!(error = %e, "incremental fetch failed, keeping cached data");
                self.inner.status.emit(SyncPhase::Failed(e.to_string()));
                // The stale snapshot stays authoritative; background
                // failures never hard-fail a waiter.
                SyncOutcome::ok(base.bookmarks)
            }
        }
    }

    /// Background reconciliation after a fresh cache hit.
    pub(super) async fn reconcile_fresh(&self, snapshot: Snapshot) {
        if !self.claim_probe_slot() {
            self.inner.status.emit(SyncPhase::UpToDate);
            return;
        }

        self.inner.status.emit(SyncPhase::Checking);
        match self.inner.source.fetch_metadata().await {
            Ok(meta) => {
                let local_len = snapshot.bookmarks.len() as u64;
                let stale = meta.count != snapshot.count
                    || meta.count != local_len
                    || meta.last_update.as_str() > snapshot.last_updated.as_str();
                if stale {
                    crate::metrics::record_probe("mismatch");
                    info!(
                        remote_count = meta.count,
                        cached_count = snapshot.count,
                        cached_records = local_len,
                        remote_watermark = %meta.last_update,
                        cached_watermark = %snapshot.last_updated,
                        "remote collection changed, reconciling"
                    );
                    let _ = self
                        .run_fetch(FetchKind::Incremental, false, Some(snapshot))
                        .await;
                } else {
                    crate::metrics::record_probe("match");
                    debug!("cache matches remote metadata");
                    self.inner.status.emit(SyncPhase::UpToDate);
                }
            }
            Err(e) => {
                crate::metrics::record_probe("error");
                warn!(error = %e, "metadata probe failed");
                self.inner.status.emit(SyncPhase::Failed(e.to_string()));
            }
        }
    }
}
