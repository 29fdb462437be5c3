// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sync coordinator.
//!
//! The [`SyncCoordinator`] is the state machine at the heart of the crate.
//! It decides between cache-hit, stale-cache, and cache-miss paths, shares
//! one in-flight fetch among all concurrent requests (single-flight), and
//! reports progress through the status broadcaster.
//!
//! # Request flow
//!
//! ```text
//! get_bookmarks(force=false)
//!   ├─ fresh cache hit      → return cached records,
//!   │                         probe remote metadata in the background
//!   ├─ stale-but-present    → return stale records,
//!   │                         incremental sync in the background
//!   └─ no usable cache      → full fetch, blocking the caller
//!
//! get_bookmarks(force=true) → dedicated full fetch, blocking;
//!                             falls back to any cached snapshot on failure
//! ```
//!
//! At most one fetch is in flight per coordinator instance. Requests that
//! arrive while a fetch is running subscribe to its outcome instead of
//! starting their own; a force request behind an *incremental* fetch waits
//! for it to settle and then runs its own full fetch under the same lock.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use marksync::{CacheStore, InMemorySource, SyncConfig, SyncCoordinator};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = SyncConfig::default();
//! let store = CacheStore::from_config(&config);
//! let source = Arc::new(InMemorySource::default());
//!
//! let coordinator = SyncCoordinator::new(config, store, source);
//! let outcome = coordinator.get_bookmarks(false).await;
//! println!("{} bookmarks", outcome.bookmarks.len());
//! # }
//! ```

mod reconcile;
mod types;

pub use types::{FetchKind, SyncOutcome};

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex as SyncMutex;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::snapshot::Snapshot;
use crate::source::BookmarkSource;
use crate::status::{StatusBroadcaster, StatusSink};
use crate::store::{CacheStore, StorageError};

/// The fetch currently occupying the single-flight slot. Waiters subscribe
/// to `rx` and resolve from the single published outcome.
struct InFlight {
    kind: FetchKind,
    rx: watch::Receiver<Option<SyncOutcome>>,
}

struct Inner {
    config: SyncConfig,
    store: CacheStore,
    source: Arc<dyn BookmarkSource>,
    status: StatusBroadcaster,
    /// Single-flight slot. Claimed before a fetch's first await point,
    /// cleared and published in one critical section when it settles.
    in_flight: Mutex<Option<InFlight>>,
    /// When the remote metadata was last probed (throttles probes).
    last_probe: SyncMutex<Option<Instant>>,
}

/// Orchestrates cache reads, remote fetches, merging, and status
/// reporting for one bookmark collection.
///
/// Cheap to clone; clones share all state. Dependencies are injected, so
/// independent instances (with independent single-flight state) coexist
/// freely - there is no process-wide singleton.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

impl SyncCoordinator {
    /// Create a coordinator over an injected store and source.
    pub fn new(config: SyncConfig, store: CacheStore, source: Arc<dyn BookmarkSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                store,
                source,
                status: StatusBroadcaster::new(),
                in_flight: Mutex::new(None),
                last_probe: SyncMutex::new(None),
            }),
        }
    }

    /// The configuration this coordinator was built with.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Fetch the bookmark collection.
    ///
    /// With `force_refresh`, always performs a full remote fetch and blocks
    /// until it settles, falling back to any cached snapshot (even an
    /// expired one) if the fetch fails. Without it, serves cached data
    /// immediately when any usable snapshot exists and reconciles with the
    /// remote in the background; only a cold cache blocks the caller.
    #[tracing::instrument(skip(self), fields(force = force_refresh))]
    pub async fn get_bookmarks(&self, force_refresh: bool) -> SyncOutcome {
        crate::metrics::record_request(force_refresh);

        if force_refresh {
            return self.run_fetch(FetchKind::Full, true, None).await;
        }

        if let Some(snapshot) = self.inner.store.read().await {
            if !snapshot.bookmarks.is_empty() {
                crate::metrics::record_cache_lookup("hit");
                debug!(records = snapshot.bookmarks.len(), "serving fresh cache");
                let bookmarks = snapshot.bookmarks.clone();
                self.spawn_fresh_reconcile(snapshot);
                return SyncOutcome::ok(bookmarks);
            }
        }

        if let Some(snapshot) = self.inner.store.read_raw().await {
            if !snapshot.bookmarks.is_empty() {
                crate::metrics::record_cache_lookup("stale");
                debug!(
                    records = snapshot.bookmarks.len(),
                    "serving expired cache, reconciling in background"
                );
                let bookmarks = snapshot.bookmarks.clone();
                self.spawn_incremental(snapshot);
                return SyncOutcome::ok(bookmarks);
            }
        }

        crate::metrics::record_cache_lookup("miss");
        self.run_fetch(FetchKind::Full, false, None).await
    }

    /// Alias for [`get_bookmarks(true)`](Self::get_bookmarks).
    pub async fn refresh(&self) -> SyncOutcome {
        self.get_bookmarks(true).await
    }

    /// Delete the persisted cache artifact. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn clear_cache(&self) -> Result<(), StorageError> {
        info!("clearing bookmark cache");
        self.inner.store.clear().await
    }

    /// Register the (single) status sink, replacing any previous one.
    pub fn register_status_sink(&self, sink: Arc<dyn StatusSink>) {
        self.inner.status.register(sink);
    }

    /// Drop the active status sink.
    pub fn unregister_status_sink(&self) {
        self.inner.status.unregister();
    }

    // --- Single-flight machinery ---

    /// Run a fetch under the single-flight slot, or resolve from one
    /// already in flight.
    ///
    /// Join policy: a non-force request joins whatever is running; a force
    /// request joins only a full fetch - behind an incremental it waits for
    /// the settle and then claims the slot for its own dedicated full
    /// fetch (it queues, it never preempts).
    pub(crate) async fn run_fetch(
        &self,
        kind: FetchKind,
        force: bool,
        base: Option<Snapshot>,
    ) -> SyncOutcome {
        enum Waiting {
            Join(watch::Receiver<Option<SyncOutcome>>),
            SettleThenRetry(watch::Receiver<Option<SyncOutcome>>),
        }

        loop {
            let mut slot = self.inner.in_flight.lock().await;
            let waiting = match slot.as_ref() {
                None => None,
                Some(flight) if !force || flight.kind == FetchKind::Full => {
                    Some(Waiting::Join(flight.rx.clone()))
                }
                Some(flight) => Some(Waiting::SettleThenRetry(flight.rx.clone())),
            };

            match waiting {
                None => {
                    let (tx, rx) = watch::channel(None);
                    // Claim the slot before the fetch's first await point.
                    *slot = Some(InFlight { kind, rx });
                    drop(slot);

                    let started = Instant::now();
                    let outcome = match kind {
                        FetchKind::Full => self.run_full().await,
                        FetchKind::Incremental => self.run_incremental(base).await,
                    };
                    crate::metrics::record_fetch_latency(kind.label(), started.elapsed());

                    // Settle: clear the slot and publish in one critical
                    // section. A request arriving after this lock releases
                    // starts a fresh fetch; every earlier joiner observes
                    // the published outcome (the watch channel retains it).
                    let mut slot = self.inner.in_flight.lock().await;
                    *slot = None;
                    let _ = tx.send(Some(outcome.clone()));
                    drop(slot);
                    return outcome;
                }
                Some(Waiting::Join(mut rx)) => {
                    drop(slot);
                    crate::metrics::record_fetch_joined();
                    debug!(kind = %kind, "joining in-flight fetch");
                    if let Ok(published) = rx.wait_for(|o| o.is_some()).await {
                        if let Some(outcome) = (*published).clone() {
                            return outcome;
                        }
                    }
                    // Publisher vanished without settling; retry.
                }
                Some(Waiting::SettleThenRetry(mut rx)) => {
                    drop(slot);
                    debug!("force refresh queued behind in-flight incremental sync");
                    let _ = rx.wait_for(|o| o.is_some()).await;
                }
            }
        }
    }

    fn spawn_fresh_reconcile(&self, snapshot: Snapshot) {
        let this = self.clone();
        tokio::spawn(async move {
            this.reconcile_fresh(snapshot).await;
        });
    }

    fn spawn_incremental(&self, snapshot: Snapshot) {
        let this = self.clone();
        tokio::spawn(async move {
            let _ = this
                .run_fetch(FetchKind::Incremental, false, Some(snapshot))
                .await;
        });
    }

    /// Claim the metadata-probe slot if the configured interval has passed
    /// since the last probe. Claiming up front means concurrent cache hits
    /// cannot double-probe.
    fn claim_probe_slot(&self) -> bool {
        let interval = Duration::from_secs(self.inner.config.metadata_check_interval_secs);
        let mut last = self.inner.last_probe.lock();
        match *last {
            Some(at) if at.elapsed() < interval => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }
}
