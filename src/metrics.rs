// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for marksync.
//!
//! Uses the `metrics` crate for backend-agnostic collection; the embedding
//! application chooses the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `marksync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `outcome`: hit, stale, miss (cache lookups); success, error (fetches)
//! - `kind`: full, incremental

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record a consumer request.
pub fn record_request(force_refresh: bool) {
    counter!(
        "marksync_requests_total",
        "force" => if force_refresh { "true" } else { "false" }
    )
    .increment(1);
}

/// Record a cache lookup outcome: "hit" (fresh), "stale", or "miss".
pub fn record_cache_lookup(outcome: &'static str) {
    counter!("marksync_cache_lookups_total", "outcome" => outcome).increment(1);
}

/// Record a settled fetch.
pub fn record_fetch(kind: &'static str, outcome: &'static str) {
    counter!(
        "marksync_fetches_total",
        "kind" => kind,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record fetch latency.
pub fn record_fetch_latency(kind: &'static str, duration: Duration) {
    histogram!("marksync_fetch_seconds", "kind" => kind).record(duration.as_secs_f64());
}

/// Record a request joining an already in-flight fetch instead of starting
/// its own.
pub fn record_fetch_joined() {
    counter!("marksync_fetch_joined_total").increment(1);
}

/// Record a remote metadata probe.
pub fn record_probe(outcome: &'static str) {
    counter!("marksync_metadata_probes_total", "outcome" => outcome).increment(1);
}

/// Record a snapshot write.
pub fn record_store_write(records: usize, bytes: usize) {
    counter!("marksync_store_writes_total").increment(1);
    gauge!("marksync_cached_records").set(records as f64);
    histogram!("marksync_store_write_bytes").record(bytes as f64);
}

/// Record a snapshot write failure.
pub fn record_store_write_error() {
    counter!("marksync_store_write_errors_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These verify the API compiles and doesn't panic; with no recorder
    // installed every call is a no-op.

    #[test]
    fn test_counters() {
        record_request(true);
        record_request(false);
        record_cache_lookup("hit");
        record_cache_lookup("stale");
        record_cache_lookup("miss");
        record_fetch("full", "success");
        record_fetch("incremental", "error");
        record_fetch_joined();
        record_probe("match");
        record_probe("mismatch");
        record_store_write_error();
    }

    #[test]
    fn test_histograms_and_gauges() {
        record_fetch_latency("full", Duration::from_millis(120));
        record_store_write(40, 16_384);
    }
}
