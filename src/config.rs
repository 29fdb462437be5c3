//! Configuration for the sync engine.
//!
//! # Example
//!
//! ```
//! use marksync::SyncConfig;
//!
//! // Minimal config (uses defaults)
//! let config = SyncConfig::default();
//! assert_eq!(config.cache_expiration_secs, 24 * 60 * 60);
//!
//! // Full config
//! let config = SyncConfig {
//!     cache_path: "/tmp/bookmarks_cache.json".into(),
//!     cache_expiration_secs: 3600,
//!     metadata_check_interval_secs: 120,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;
use std::path::PathBuf;

/// Configuration consumed by the sync engine core.
///
/// All fields have sensible defaults. `page_size` is passed through to the
/// source adapter and never interpreted by the coordinator itself.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Location of the persisted cache artifact (JSON file)
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// How long the artifact counts as fresh, from its mtime (default: 24h)
    #[serde(default = "default_cache_expiration_secs")]
    pub cache_expiration_secs: u64,

    /// Minimum interval between remote metadata probes (default: 5 min)
    #[serde(default = "default_metadata_check_interval_secs")]
    pub metadata_check_interval_secs: u64,

    /// Records per page for paging source adapters (default: 50)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./bookmarks_cache.json")
}
fn default_cache_expiration_secs() -> u64 {
    24 * 60 * 60
}
fn default_metadata_check_interval_secs() -> u64 {
    5 * 60
}
fn default_page_size() -> usize {
    50
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            cache_expiration_secs: default_cache_expiration_secs(),
            metadata_check_interval_secs: default_metadata_check_interval_secs(),
            page_size: default_page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.cache_path, PathBuf::from("./bookmarks_cache.json"));
        assert_eq!(config.cache_expiration_secs, 86_400);
        assert_eq!(config.metadata_check_interval_secs, 300);
        assert_eq!(config.page_size, 50);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SyncConfig =
            serde_json::from_str(r#"{"cache_path": "/var/cache/bm.json"}"#).unwrap();
        assert_eq!(config.cache_path, PathBuf::from("/var/cache/bm.json"));
        assert_eq!(config.page_size, 50);
    }
}
