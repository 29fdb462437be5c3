//! In-memory bookmark source for tests, examples, and local development.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::{BookmarkSource, SourceError, SourceMetadata};
use crate::record::Bookmark;
use crate::snapshot::watermark_of;

/// A [`BookmarkSource`] backed by a plain record vector.
///
/// `fetch_since` and `fetch_metadata` are derived from the records per the
/// source contract, so the coordinator behaves exactly as it would against
/// a remote collection. Per-method call counters and a switchable failure
/// mode make single-flight and probe-throttling observable from tests.
pub struct InMemorySource {
    records: RwLock<Vec<Bookmark>>,
    metadata_override: RwLock<Option<SourceMetadata>>,
    failing: AtomicBool,
    delay_ms: AtomicU64,
    fetch_all_calls: AtomicUsize,
    fetch_since_calls: AtomicUsize,
    fetch_metadata_calls: AtomicUsize,
}

impl InMemorySource {
    #[must_use]
    pub fn new(records: Vec<Bookmark>) -> Self {
        Self {
            records: RwLock::new(records),
            metadata_override: RwLock::new(None),
            failing: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            fetch_all_calls: AtomicUsize::new(0),
            fetch_since_calls: AtomicUsize::new(0),
            fetch_metadata_calls: AtomicUsize::new(0),
        }
    }

    /// Replace the remote record set.
    pub fn set_records(&self, records: Vec<Bookmark>) {
        *self.records.write() = records;
    }

    /// Force `fetch_metadata` to report the given summary instead of one
    /// derived from the records.
    pub fn set_metadata(&self, metadata: Option<SourceMetadata>) {
        *self.metadata_override.write() = metadata;
    }

    /// When set, every fetch reports a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Simulated per-call latency. Lets tests hold a fetch in flight long
    /// enough for concurrent requests to pile up behind it.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn simulate_latency(&self) {
        let ms = self.delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    pub fn fetch_all_calls(&self) -> usize {
        self.fetch_all_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_since_calls(&self) -> usize {
        self.fetch_since_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_metadata_calls(&self) -> usize {
        self.fetch_metadata_calls.load(Ordering::SeqCst)
    }

    fn check_failing(&self) -> Result<(), SourceError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SourceError::Transport("in-memory source set to fail".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl BookmarkSource for InMemorySource {
    async fn fetch_all(&self) -> Result<Vec<Bookmark>, SourceError> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.check_failing()?;
        Ok(self.records.read().clone())
    }

    async fn fetch_since(&self, watermark: &str) -> Result<Vec<Bookmark>, SourceError> {
        self.fetch_since_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.check_failing()?;
        Ok(self
            .records
            .read()
            .iter()
            .filter(|r| r.last_update.as_str() > watermark)
            .cloned()
            .collect())
    }

    async fn fetch_metadata(&self) -> Result<SourceMetadata, SourceError> {
        self.fetch_metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.check_failing()?;
        if let Some(meta) = self.metadata_override.read().clone() {
            return Ok(meta);
        }
        let records = self.records.read();
        Ok(SourceMetadata {
            count: records.len() as u64,
            last_update: watermark_of(&records),
        })
    }
}
