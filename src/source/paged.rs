//! Generic pagination adapter over a page-level fetcher.
//!
//! Remote bookmark APIs serve fixed-size pages sorted by most recently
//! modified first. [`PagedSource`] turns any [`PageFetcher`] into a full
//! [`BookmarkSource`]: exhaustive accumulation for full syncs, early-exit
//! paging for incremental syncs, and a body-free stats call for metadata
//! probes.

use async_trait::async_trait;
use tracing::debug;

use super::{BookmarkSource, SourceError, SourceMetadata};
use crate::record::Bookmark;

/// One page of remote records plus the server-reported total.
#[derive(Debug, Clone)]
pub struct RemotePage {
    /// Records in this page, most recently modified first.
    pub items: Vec<Bookmark>,
    /// Total records the server reports for the whole collection.
    pub total: u64,
}

/// Page-level access to a remote collection. Implemented by the concrete
/// HTTP client outside this crate.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch page `page` (zero-based) of at most `per_page` records,
    /// sorted by most recently modified first.
    async fn fetch_page(&self, page: usize, per_page: usize) -> Result<RemotePage, SourceError>;

    /// Fetch collection totals without record bodies.
    async fn fetch_stats(&self) -> Result<SourceMetadata, SourceError>;
}

/// [`BookmarkSource`] over a [`PageFetcher`].
pub struct PagedSource<F> {
    fetcher: F,
    per_page: usize,
}

impl<F: PageFetcher> PagedSource<F> {
    /// Wrap a fetcher. `per_page` comes from `SyncConfig::page_size`.
    pub fn new(fetcher: F, per_page: usize) -> Self {
        Self {
            fetcher,
            per_page: per_page.max(1),
        }
    }
}

#[async_trait]
impl<F: PageFetcher> BookmarkSource for PagedSource<F> {
    /// Page through the whole collection, accumulating until the running
    /// total equals the server-reported count. Any page failure aborts the
    /// whole fetch; a short page before the total is reached is an
    /// [`SourceError::Incomplete`] rather than a partial success.
    async fn fetch_all(&self) -> Result<Vec<Bookmark>, SourceError> {
        let mut records: Vec<Bookmark> = Vec::new();
        let mut page = 0usize;
        loop {
            let fetched = self.fetcher.fetch_page(page, self.per_page).await?;
            let total = fetched.total;

            if fetched.items.is_empty() && (records.len() as u64) < total {
                return Err(SourceError::Incomplete {
                    got: records.len(),
                    expected: total,
                });
            }
            records.extend(fetched.items);

            if records.len() as u64 >= total {
                debug!(pages = page + 1, records = records.len(), "full fetch complete");
                return Ok(records);
            }
            page += 1;
        }
    }

    /// Page through most-recent-first records, keeping those strictly newer
    /// than `watermark`. Stops at the first page whose oldest record is not
    /// newer than the watermark, or that runs short of `per_page`.
    async fn fetch_since(&self, watermark: &str) -> Result<Vec<Bookmark>, SourceError> {
        let mut newer: Vec<Bookmark> = Vec::new();
        let mut page = 0usize;
        loop {
            let fetched = self.fetcher.fetch_page(page, self.per_page).await?;
            let page_len = fetched.items.len();
            let mut reached_watermark = false;

            for record in fetched.items {
                if record.last_update.as_str() > watermark {
                    newer.push(record);
                } else {
                    reached_watermark = true;
                }
            }

            if reached_watermark || page_len < self.per_page {
                debug!(pages = page + 1, newer = newer.len(), watermark, "incremental fetch complete");
                return Ok(newer);
            }
            page += 1;
        }
    }

    async fn fetch_metadata(&self) -> Result<SourceMetadata, SourceError> {
        self.fetcher.fetch_stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bm(id: &str, last_update: &str) -> Bookmark {
        let mut b = Bookmark::new(id, format!("title-{id}"), format!("https://example.com/{id}"));
        b.last_update = last_update.to_string();
        b
    }

    /// Scripted fetcher: serves `records` (already most-recent-first) in
    /// pages and counts page calls.
    struct ScriptedFetcher {
        records: Vec<Bookmark>,
        /// Overrides the real total when set (to simulate a lying server).
        total_override: Mutex<Option<u64>>,
        fail_page: Option<usize>,
        pages_fetched: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new(records: Vec<Bookmark>) -> Self {
            Self {
                records,
                total_override: Mutex::new(None),
                fail_page: None,
                pages_fetched: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for ScriptedFetcher {
        async fn fetch_page(&self, page: usize, per_page: usize) -> Result<RemotePage, SourceError> {
            self.pages_fetched.fetch_add(1, Ordering::SeqCst);
            if self.fail_page == Some(page) {
                return Err(SourceError::Status(500));
            }
            let total = self
                .total_override
                .lock()
                .unwrap_or(self.records.len() as u64);
            let start = (page * per_page).min(self.records.len());
            let end = (start + per_page).min(self.records.len());
            Ok(RemotePage {
                items: self.records[start..end].to_vec(),
                total,
            })
        }

        async fn fetch_stats(&self) -> Result<SourceMetadata, SourceError> {
            Ok(SourceMetadata {
                count: self.records.len() as u64,
                last_update: self
                    .records
                    .iter()
                    .map(|r| r.last_update.clone())
                    .max()
                    .unwrap_or_default(),
            })
        }
    }

    fn five_records() -> Vec<Bookmark> {
        vec![
            bm("5", "2024-05-01T00:00:00.000Z"),
            bm("4", "2024-04-01T00:00:00.000Z"),
            bm("3", "2024-03-01T00:00:00.000Z"),
            bm("2", "2024-02-01T00:00:00.000Z"),
            bm("1", "2024-01-01T00:00:00.000Z"),
        ]
    }

    #[tokio::test]
    async fn test_fetch_all_pages_until_total() {
        let source = PagedSource::new(ScriptedFetcher::new(five_records()), 2);
        let records = source.fetch_all().await.unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(source.fetcher.pages_fetched.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_fetch_all_single_page() {
        let source = PagedSource::new(ScriptedFetcher::new(five_records()), 50);
        let records = source.fetch_all().await.unwrap();
        assert_eq!(records.len(), 5);
        assert_eq!(source.fetcher.pages_fetched.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_all_page_error_aborts() {
        let mut fetcher = ScriptedFetcher::new(five_records());
        fetcher.fail_page = Some(1);
        let source = PagedSource::new(fetcher, 2);

        let err = source.fetch_all().await.unwrap_err();
        assert_eq!(err, SourceError::Status(500));
    }

    #[tokio::test]
    async fn test_fetch_all_short_collection_is_incomplete() {
        let fetcher = ScriptedFetcher::new(five_records());
        *fetcher.total_override.lock() = Some(9); // server claims more than it serves
        let source = PagedSource::new(fetcher, 2);

        let err = source.fetch_all().await.unwrap_err();
        assert_eq!(err, SourceError::Incomplete { got: 5, expected: 9 });
    }

    #[tokio::test]
    async fn test_fetch_all_empty_collection() {
        let source = PagedSource::new(ScriptedFetcher::new(vec![]), 2);
        let records = source.fetch_all().await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_since_stops_at_watermark() {
        let source = PagedSource::new(ScriptedFetcher::new(five_records()), 2);
        let newer = source.fetch_since("2024-03-01T00:00:00.000Z").await.unwrap();

        let ids: Vec<&str> = newer.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "4"]);
        // Page 0 = [5,4] (all newer), page 1 = [3,2] hits the watermark.
        assert_eq!(source.fetcher.pages_fetched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_since_everything_newer() {
        let source = PagedSource::new(ScriptedFetcher::new(five_records()), 2);
        let newer = source.fetch_since("2020-01-01T00:00:00.000Z").await.unwrap();
        assert_eq!(newer.len(), 5);
    }

    #[tokio::test]
    async fn test_fetch_since_nothing_newer() {
        let source = PagedSource::new(ScriptedFetcher::new(five_records()), 2);
        let newer = source.fetch_since("2024-05-01T00:00:00.000Z").await.unwrap();
        assert!(newer.is_empty());
        assert_eq!(source.fetcher.pages_fetched.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_since_propagates_errors() {
        let mut fetcher = ScriptedFetcher::new(five_records());
        fetcher.fail_page = Some(0);
        let source = PagedSource::new(fetcher, 2);

        let err = source.fetch_since("2020-01-01T00:00:00.000Z").await.unwrap_err();
        assert_eq!(err, SourceError::Status(500));
    }

    #[tokio::test]
    async fn test_fetch_metadata_delegates() {
        let source = PagedSource::new(ScriptedFetcher::new(five_records()), 2);
        let meta = source.fetch_metadata().await.unwrap();
        assert_eq!(meta.count, 5);
        assert_eq!(meta.last_update, "2024-05-01T00:00:00.000Z");
    }
}
