//! Public types for the sync coordinator.

use crate::record::Bookmark;

/// Which fetch strategy an in-flight sync is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Exhaustive re-fetch of the entire remote collection, replacing the
    /// cache wholesale.
    Full,
    /// Fetch of records modified after the cached watermark, merged into
    /// the existing cache.
    Incremental,
}

impl FetchKind {
    /// Metric label.
    #[must_use]
    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }
}

impl std::fmt::Display for FetchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result delivered to every waiter of a sync request.
///
/// `error` is set only on the hard-failure paths: a blocking fetch failed
/// and no cache of any kind existed to fall back on. Background
/// reconciliation failures never set it; they surface through the status
/// sink while the already-delivered cached data stays authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub bookmarks: Vec<Bookmark>,
    pub error: Option<String>,
}

impl SyncOutcome {
    #[must_use]
    pub(crate) fn ok(bookmarks: Vec<Bookmark>) -> Self {
        Self {
            bookmarks,
            error: None,
        }
    }

    #[must_use]
    pub(crate) fn failed(error: String) -> Self {
        Self {
            bookmarks: Vec::new(),
            error: Some(error),
        }
    }

    /// True when the request hard-failed (empty result, error set).
    #[must_use]
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}
