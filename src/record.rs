//! Bookmark record model.
//!
//! The [`Bookmark`] is the unit that flows through the sync engine. Field
//! names follow the persisted artifact and the remote wire format
//! (`excerptClean`, `lastUpdate`), so a record round-trips byte-compatibly
//! between the remote payload, the in-memory model, and the cache file.
//!
//! Timestamps are fixed-width UTC ISO-8601 strings; their lexicographic
//! order equals chronological order, so all recency comparisons in this
//! crate are plain string comparisons.

use serde::{Deserialize, Serialize};

/// A single bookmark as stored in the cache snapshot.
///
/// # Example
///
/// ```
/// use marksync::Bookmark;
///
/// let mut bm = Bookmark::new("42", "Rust Book", "https://doc.rust-lang.org/book/");
/// bm.excerpt = "  The Rust\n  Programming   Language ".into();
/// bm.normalize();
/// assert_eq!(bm.excerpt_clean, "The Rust Programming Language");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Opaque unique identifier, stable across syncs. The merge key.
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub excerpt: String,
    /// Whitespace-normalized form of `excerpt`, derived at write time.
    #[serde(rename = "excerptClean", default)]
    pub excerpt_clean: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation timestamp (ISO-8601, UTC, fixed width).
    #[serde(default)]
    pub created: String,
    /// Last-modification timestamp (ISO-8601, UTC, fixed width).
    #[serde(rename = "lastUpdate", default)]
    pub last_update: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub collection: String,
}

impl Bookmark {
    /// Create a record with the given identity fields; everything else empty.
    pub fn new(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            excerpt: String::new(),
            excerpt_clean: String::new(),
            tags: Vec::new(),
            created: String::new(),
            last_update: String::new(),
            domain: String::new(),
            collection: String::new(),
        }
    }

    /// Recency key: `lastUpdate`, falling back to `created` when unset.
    #[must_use]
    pub fn recency(&self) -> &str {
        if self.last_update.is_empty() {
            &self.created
        } else {
            &self.last_update
        }
    }

    /// Derive `excerpt_clean` from `excerpt`.
    pub fn normalize(&mut self) {
        self.excerpt_clean = clean_excerpt(&self.excerpt);
    }
}

/// Collapse all whitespace runs (including newlines) to single spaces and
/// trim the ends. Idempotent.
#[must_use]
pub fn clean_excerpt(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

/// Sort records descending by recency (`lastUpdate` falling back to
/// `created`). Stable, so equal keys keep their incoming order.
pub fn sort_by_recency(records: &mut [Bookmark]) {
    records.sort_by(|a, b| b.recency().cmp(a.recency()));
}
