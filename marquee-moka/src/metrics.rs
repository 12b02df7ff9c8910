//! Moka capacity metrics.
//!
//! Enable the `metrics` feature to record them.
//!
//! - `marquee_moka_entries` - entries currently held (gauge)
//! - `marquee_moka_size_bytes` - weighted size in bytes (gauge)
//!
//! Both carry a `backend` label with the backend's [`StoreLabel`](marquee_core::StoreLabel).

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for cache entry count gauge.
    pub static ref MOKA_ENTRIES: &'static str = {
        metrics::describe_gauge!(
            "marquee_moka_entries",
            "Current number of entries in the Moka cache."
        );
        "marquee_moka_entries"
    };

    /// Metric name for cache size gauge.
    pub static ref MOKA_SIZE_BYTES: &'static str = {
        metrics::describe_gauge!(
            "marquee_moka_size_bytes",
            "Current weighted size of the Moka cache in bytes."
        );
        "marquee_moka_size_bytes"
    };
}

/// Records the entry count and weighted size of one backend.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_capacity(backend: &str, entries: u64, size_bytes: u64) {
    metrics::gauge!(*MOKA_ENTRIES, "backend" => backend.to_string()).set(entries as f64);
    metrics::gauge!(*MOKA_SIZE_BYTES, "backend" => backend.to_string()).set(size_bytes as f64);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_capacity(_backend: &str, _entries: u64, _size_bytes: u64) {}
