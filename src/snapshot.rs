//! Cache snapshot: the persisted unit of the bookmark cache.
//!
//! A [`Snapshot`] is assembled in memory (normalize, sort, watermark, count)
//! and then written wholesale; the persisted artifact is never mutated in
//! place. Merging incremental updates into an existing record set happens
//! here too, keyed by record id.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::record::{sort_by_recency, Bookmark};

/// The serialized cache artifact.
///
/// `count` is the authoritative remote total, not necessarily
/// `bookmarks.len()`; the two diverging is a staleness trigger for the
/// coordinator. `last_updated` is the watermark used as the low-water mark
/// for the next incremental fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub bookmarks: Vec<Bookmark>,
    #[serde(default)]
    pub count: u64,
    /// Epoch seconds of the last successful write.
    #[serde(default)]
    pub timestamp: i64,
    #[serde(rename = "lastUpdated", default)]
    pub last_updated: String,
}

impl Snapshot {
    /// Build a snapshot ready for persistence: derives `excerptClean` on
    /// every record, sorts descending by recency, and fills `count` and
    /// `last_updated` from the record set when not supplied.
    ///
    /// The supplied `count` (a source-reported total) wins over the local
    /// recomputation: deletions are invisible to an incremental fetch, so
    /// the remote total is the authoritative one.
    #[must_use]
    pub fn assemble(
        mut records: Vec<Bookmark>,
        count: Option<u64>,
        watermark: Option<String>,
    ) -> Self {
        for record in &mut records {
            record.normalize();
        }
        sort_by_recency(&mut records);

        let last_updated = watermark.unwrap_or_else(|| watermark_of(&records));
        let count = count.unwrap_or(records.len() as u64);

        Self {
            count,
            timestamp: epoch_seconds(),
            last_updated,
            bookmarks: records,
        }
    }
}

/// Maximum `lastUpdate` among the given records; empty string when none
/// carry one.
#[must_use]
pub fn watermark_of(records: &[Bookmark]) -> String {
    records
        .iter()
        .map(|r| r.last_update.as_str())
        .max()
        .unwrap_or("")
        .to_string()
}

/// Merge `incoming` into `existing`, keyed by id: incoming records overwrite
/// existing ones with the same id, records not mentioned are untouched, and
/// genuinely new records are appended. A pure map overwrite, so merging the
/// same update set twice equals merging it once.
#[must_use]
pub fn merge_by_id(existing: Vec<Bookmark>, incoming: Vec<Bookmark>) -> Vec<Bookmark> {
    let mut merged = existing;
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();

    for record in incoming {
        match index.get(&record.id).copied() {
            Some(i) => merged[i] = record,
            None => {
                index.insert(record.id.clone(), merged.len());
                merged.push(record);
            }
        }
    }
    merged
}

fn epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bm(id: &str, last_update: &str) -> Bookmark {
        let mut b = Bookmark::new(id, format!("title-{id}"), format!("https://example.com/{id}"));
        b.last_update = last_update.to_string();
        b
    }

    #[test]
    fn test_merge_overwrites_by_id() {
        let existing = vec![bm("1", "2024-01-01T00:00:00.000Z"), bm("2", "2024-01-02T00:00:00.000Z")];
        let incoming = vec![bm("1", "2024-02-01T00:00:00.000Z")];

        let merged = merge_by_id(existing, incoming);

        assert_eq!(merged.len(), 2);
        let one = merged.iter().find(|r| r.id == "1").unwrap();
        assert_eq!(one.last_update, "2024-02-01T00:00:00.000Z");
        // Untouched record survives unchanged.
        let two = merged.iter().find(|r| r.id == "2").unwrap();
        assert_eq!(two.last_update, "2024-01-02T00:00:00.000Z");
    }

    #[test]
    fn test_merge_appends_new_records() {
        let merged = merge_by_id(vec![bm("1", "a")], vec![bm("3", "b")]);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().any(|r| r.id == "3"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let existing = vec![bm("1", "2024-01-01T00:00:00.000Z"), bm("2", "2024-01-01T00:00:00.000Z")];
        let updates = vec![bm("2", "2024-03-01T00:00:00.000Z"), bm("9", "2024-03-02T00:00:00.000Z")];

        let once = merge_by_id(existing.clone(), updates.clone());
        let twice = merge_by_id(once.clone(), updates);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_duplicate_incoming_ids_last_wins() {
        let merged = merge_by_id(vec![], vec![bm("1", "first"), bm("1", "second")]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].last_update, "second");
    }

    #[test]
    fn test_assemble_sorts_and_computes_watermark() {
        let snap = Snapshot::assemble(
            vec![bm("old", "2024-01-01T00:00:00.000Z"), bm("new", "2024-05-01T00:00:00.000Z")],
            None,
            None,
        );

        assert_eq!(snap.bookmarks[0].id, "new");
        assert_eq!(snap.last_updated, "2024-05-01T00:00:00.000Z");
        assert_eq!(snap.count, 2);
        assert!(snap.timestamp > 0);
    }

    #[test]
    fn test_assemble_derives_excerpt_clean() {
        let mut record = bm("1", "2024-01-01T00:00:00.000Z");
        record.excerpt = "two\n lines".to_string();

        let snap = Snapshot::assemble(vec![record], None, None);
        assert_eq!(snap.bookmarks[0].excerpt_clean, "two lines");
    }

    #[test]
    fn test_assemble_supplied_count_wins() {
        let snap = Snapshot::assemble(vec![bm("1", "a")], Some(40), None);
        assert_eq!(snap.count, 40);
        assert_eq!(snap.bookmarks.len(), 1);
    }

    #[test]
    fn test_assemble_empty() {
        let snap = Snapshot::assemble(vec![], None, None);
        assert_eq!(snap.count, 0);
        assert_eq!(snap.last_updated, "");
        assert!(snap.bookmarks.is_empty());
    }

    #[test]
    fn test_watermark_covers_every_record() {
        let records = vec![bm("1", "2024-01-01T00:00:00.000Z"), bm("2", "2024-04-01T00:00:00.000Z")];
        let wm = watermark_of(&records);
        assert!(records.iter().all(|r| r.last_update.as_str() <= wm.as_str()));
    }

    #[test]
    fn test_snapshot_artifact_field_names() {
        let snap = Snapshot::assemble(vec![bm("1", "2024-01-01T00:00:00.000Z")], None, None);
        let value = serde_json::to_value(&snap).unwrap();
        assert!(value.get("lastUpdated").is_some());
        assert!(value.get("last_updated").is_none());
        assert!(value.get("bookmarks").is_some());
    }

    #[test]
    fn test_snapshot_without_bookmarks_field_rejected() {
        let result: Result<Snapshot, _> =
            serde_json::from_str(r#"{"count": 3, "timestamp": 1}"#);
        assert!(result.is_err());
    }
}
