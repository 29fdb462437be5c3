// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Best-effort status broadcasting.
//!
//! The coordinator emits a human-readable progress line at each phase
//! transition. Delivery is observational only: at most one sink is
//! registered at a time, messages are delivered asynchronously when a
//! tokio runtime is available, and nothing in the sync pipeline waits on
//! or depends on a sink.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::coordinator::FetchKind;

/// Receiver of progress messages. Implementations must not block: the
/// message may be delivered inline from the sync path when no runtime is
/// available to spawn onto.
pub trait StatusSink: Send + Sync {
    fn status(&self, message: &str);
}

/// Phase transitions reported during a sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    /// Probing remote metadata for staleness.
    Checking,
    /// A fetch is running.
    Fetching(FetchKind),
    /// A sync settled and wrote N records' worth of changes.
    Updated(usize),
    /// Cache matches the remote; nothing to do.
    UpToDate,
    /// A fetch or probe failed.
    Failed(String),
    /// The snapshot could not be persisted (in-memory result still served).
    StoreFailed(String),
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checking => write!(f, "checking for bookmark updates"),
            Self::Fetching(FetchKind::Full) => write!(f, "fetching bookmarks"),
            Self::Fetching(FetchKind::Incremental) => write!(f, "fetching bookmark updates"),
            Self::Updated(n) => write!(f, "updated {} bookmarks", n),
            Self::UpToDate => write!(f, "bookmarks up to date"),
            Self::Failed(msg) => write!(f, "bookmark sync failed: {}", msg),
            Self::StoreFailed(msg) => write!(f, "cache write failed: {}", msg),
        }
    }
}

/// Holds zero or one [`StatusSink`] and fans phase transitions out to it.
#[derive(Default)]
pub struct StatusBroadcaster {
    sink: RwLock<Option<Arc<dyn StatusSink>>>,
}

impl StatusBroadcaster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink, replacing any previous one.
    pub fn register(&self, sink: Arc<dyn StatusSink>) {
        *self.sink.write() = Some(sink);
    }

    /// Drop the active sink, if any.
    pub fn unregister(&self) {
        *self.sink.write() = None;
    }

    /// Deliver a phase transition to the active sink, best-effort.
    pub fn emit(&self, phase: SyncPhase) {
        let Some(sink) = self.sink.read().clone() else {
            return;
        };
        let message = phase.to_string();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    sink.status(&message);
                });
            }
            Err(_) => sink.status(&message),
        }
    }
}
