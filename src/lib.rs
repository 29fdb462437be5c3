//! # marksync
//!
//! A bookmark collection sync engine: keeps a local snapshot cache of a
//! remote bookmark service fresh with as few network calls as possible,
//! and serves it to interactive consumers (pickers, launchers) instantly.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Consumers                            │
//! │  • get_bookmarks(force) / refresh() / clear_cache()        │
//! │  • optional StatusSink for progress lines                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SyncCoordinator                         │
//! │  • cache-hit / stale-hit / cold-miss decision              │
//! │  • single-flight: concurrent requests share one fetch      │
//! │  • metadata probe throttling, merge-by-id reconciliation   │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                           │
//!                 ▼                           ▼
//! ┌───────────────────────────┐ ┌───────────────────────────────┐
//! │        CacheStore         │ │     BookmarkSource (trait)    │
//! │  • one JSON artifact      │ │  • fetch_all / fetch_since    │
//! │  • mtime freshness gate   │ │  • fetch_metadata             │
//! │  • atomic replace writes  │ │  • PagedSource adapter        │
//! └───────────────────────────┘ └───────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use marksync::{CacheStore, InMemorySource, SyncConfig, SyncCoordinator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SyncConfig {
//!         cache_path: "/tmp/bookmarks_cache.json".into(),
//!         ..Default::default()
//!     };
//!
//!     let store = CacheStore::from_config(&config);
//!     let source = Arc::new(InMemorySource::default()); // swap in a real adapter
//!     let coordinator = SyncCoordinator::new(config, store, source);
//!
//!     // Serves cached data instantly when present; reconciles with the
//!     // remote in the background.
//!     let outcome = coordinator.get_bookmarks(false).await;
//!     for bm in &outcome.bookmarks {
//!         println!("{}  {}", bm.title, bm.url);
//!     }
//! }
//! ```
//!
//! ## Behavior
//!
//! - **Cache first**: any usable snapshot (even an expired one) is served
//!   immediately; the network is only on the critical path for a cold
//!   cache or a forced refresh.
//! - **Incremental sync**: records modified after the cached watermark are
//!   merged in by id; the remote total stays authoritative.
//! - **Single-flight**: concurrent requests observe exactly one underlying
//!   fetch and all resolve from its outcome.
//! - **Degraded, never broken**: corrupt artifacts read as a cold cache,
//!   failed writes still serve the in-memory result, and background fetch
//!   errors leave the cached answer in place.
//!
//! ## Modules
//!
//! - [`coordinator`]: the [`SyncCoordinator`] orchestrating all components
//! - [`store`]: file-backed snapshot persistence with staleness evaluation
//! - [`source`]: the [`BookmarkSource`] seam plus pagination and in-memory
//!   adapters
//! - [`record`] / [`snapshot`]: data model, merge, watermark
//! - [`status`]: best-effort progress broadcasting
//! - [`config`]: engine configuration

pub mod config;
pub mod coordinator;
pub mod metrics;
pub mod record;
pub mod snapshot;
pub mod source;
pub mod status;
pub mod store;

pub use config::SyncConfig;
pub use coordinator::{FetchKind, SyncCoordinator, SyncOutcome};
pub use record::Bookmark;
pub use snapshot::Snapshot;
pub use source::memory::InMemorySource;
pub use source::paged::{PageFetcher, PagedSource, RemotePage};
pub use source::{BookmarkSource, SourceError, SourceMetadata};
pub use status::{StatusBroadcaster, StatusSink, SyncPhase};
pub use store::{CacheStore, StorageError};
