//! Remote bookmark source interface.
//!
//! The sync coordinator consumes a [`BookmarkSource`] and never talks to
//! the network itself. Concrete HTTP clients live outside this crate;
//! [`paged::PagedSource`] adapts any page-level fetcher into the trait,
//! and [`memory::InMemorySource`] backs tests and local development.

pub mod memory;
pub mod paged;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::Bookmark;

/// Errors reported by a bookmark source. Sources return these; they never
/// panic and never return partial record sets as success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Network-level failure (connect, timeout, transfer).
    #[error("transport error: {0}")]
    Transport(String),
    /// Remote answered with a non-2xx status.
    #[error("remote returned status {0}")]
    Status(u16),
    /// Payload did not parse into the expected shape.
    #[error("malformed payload: {0}")]
    Malformed(String),
    /// Paging ended before the server-reported total was reached.
    #[error("incomplete page sequence: got {got} of {expected} records")]
    Incomplete { got: usize, expected: u64 },
}

/// Cheap remote summary used for staleness comparison, fetched without
/// transferring record bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Total records the remote reports.
    pub count: u64,
    /// Most recent `lastUpdate` across the remote collection (ISO-8601).
    pub last_update: String,
}

/// Abstract remote bookmark collection.
#[async_trait]
pub trait BookmarkSource: Send + Sync {
    /// Fetch the entire collection. Implementations must either return the
    /// complete record set or an error - never a partial set.
    async fn fetch_all(&self) -> Result<Vec<Bookmark>, SourceError>;

    /// Fetch records modified strictly after `watermark` (string-compared
    /// ISO-8601 lower bound).
    async fn fetch_since(&self, watermark: &str) -> Result<Vec<Bookmark>, SourceError>;

    /// Fetch `{count, lastUpdate}` only.
    async fn fetch_metadata(&self) -> Result<SourceMetadata, SourceError>;
}
