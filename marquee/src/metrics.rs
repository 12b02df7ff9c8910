//! Metrics declaration and recording helpers.
//!
//! Every helper compiles to nothing without the `metrics` feature.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Responses served from a namespace.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "marquee_cache_hit_total",
            "Total number of requests answered from a cache namespace."
        );
        "marquee_cache_hit_total"
    };
    /// Lookups that found nothing usable.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "marquee_cache_miss_total",
            "Total number of namespace lookups without a usable entry."
        );
        "marquee_cache_miss_total"
    };
    /// Requests sent to the network.
    pub static ref NETWORK_FETCH_COUNTER: &'static str = {
        metrics::describe_counter!(
            "marquee_network_fetch_total",
            "Total number of network fetches issued by the worker."
        );
        "marquee_network_fetch_total"
    };
    /// Precache assets that could not be installed.
    pub static ref PRECACHE_FAILURE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "marquee_precache_failure_total",
            "Total number of precache assets skipped during install."
        );
        "marquee_precache_failure_total"
    };
    /// Entries removed by count eviction or expiry.
    pub static ref EVICTION_COUNTER: &'static str = {
        metrics::describe_counter!(
            "marquee_eviction_total",
            "Total number of entries evicted from cache namespaces."
        );
        "marquee_eviction_total"
    };
    /// URLs stored by the priority cache protocol.
    pub static ref PRIORITY_STORED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "marquee_priority_stored_total",
            "Total number of URLs stored through priority cache requests."
        );
        "marquee_priority_stored_total"
    };
    /// Background revalidations that refreshed an entry.
    pub static ref REVALIDATION_COUNTER: &'static str = {
        metrics::describe_counter!(
            "marquee_revalidation_total",
            "Total number of completed background revalidations."
        );
        "marquee_revalidation_total"
    };

    // Offload manager metrics

    /// Track number of offload tasks spawned.
    pub static ref OFFLOAD_TASKS_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "marquee_offload_tasks_spawned_total",
            "Total number of offload tasks spawned."
        );
        "marquee_offload_tasks_spawned_total"
    };
    /// Track number of offload tasks completed.
    pub static ref OFFLOAD_TASKS_COMPLETED: &'static str = {
        metrics::describe_counter!(
            "marquee_offload_tasks_completed_total",
            "Total number of offload tasks completed."
        );
        "marquee_offload_tasks_completed_total"
    };
    /// Track number of offload tasks that timed out.
    pub static ref OFFLOAD_TASKS_TIMEOUT: &'static str = {
        metrics::describe_counter!(
            "marquee_offload_tasks_timeout_total",
            "Total number of offload tasks cancelled by timeout."
        );
        "marquee_offload_tasks_timeout_total"
    };
    /// Track number of offload tasks deduplicated (skipped).
    pub static ref OFFLOAD_TASKS_DEDUPLICATED: &'static str = {
        metrics::describe_counter!(
            "marquee_offload_tasks_deduplicated_total",
            "Total number of offload tasks skipped because an equal task was in flight."
        );
        "marquee_offload_tasks_deduplicated_total"
    };
    /// Histogram of offload task duration.
    pub static ref OFFLOAD_TASK_DURATION: &'static str = {
        metrics::describe_histogram!(
            "marquee_offload_task_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of offload tasks in seconds."
        );
        "marquee_offload_task_duration_seconds"
    };
}

/// Records a namespace hit.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_hit(namespace: &str) {
    metrics::counter!(*CACHE_HIT_COUNTER, "namespace" => namespace.to_string()).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_hit(_namespace: &str) {}

/// Records a namespace miss.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_miss(namespace: &str) {
    metrics::counter!(*CACHE_MISS_COUNTER, "namespace" => namespace.to_string()).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_miss(_namespace: &str) {}

/// Records a network fetch issued for `route`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_network(route: &str) {
    metrics::counter!(*NETWORK_FETCH_COUNTER, "route" => route.to_string()).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_network(_route: &str) {}

/// Records a precache asset skipped during install.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_precache_failure() {
    metrics::counter!(*PRECACHE_FAILURE_COUNTER).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_precache_failure() {}

/// Records `count` entries evicted from `namespace`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_eviction(namespace: &str, count: usize) {
    metrics::counter!(*EVICTION_COUNTER, "namespace" => namespace.to_string())
        .increment(count as u64);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_eviction(_namespace: &str, _count: usize) {}

/// Records one URL stored by a priority cache request.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_priority_stored() {
    metrics::counter!(*PRIORITY_STORED_COUNTER).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_priority_stored() {}

/// Records a finished background revalidation.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_revalidation(namespace: &str) {
    metrics::counter!(*REVALIDATION_COUNTER, "namespace" => namespace.to_string()).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_revalidation(_namespace: &str) {}

/// Records a background task of `kind` accepted by the offload manager.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_spawned(kind: &str) {
    metrics::counter!(*OFFLOAD_TASKS_SPAWNED, "kind" => kind.to_string()).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_spawned(_kind: &str) {}

/// Records a background task skipped because its entry is already being refreshed.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_deduplicated(kind: &str) {
    metrics::counter!(*OFFLOAD_TASKS_DEDUPLICATED, "kind" => kind.to_string()).increment(1);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_deduplicated(_kind: &str) {}

/// Records the end of a background task, cancelled or not.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_offload_finished(kind: &str, cancelled: bool, elapsed: std::time::Duration) {
    let counter = if cancelled {
        *OFFLOAD_TASKS_TIMEOUT
    } else {
        *OFFLOAD_TASKS_COMPLETED
    };
    metrics::counter!(counter, "kind" => kind.to_string()).increment(1);
    metrics::histogram!(*OFFLOAD_TASK_DURATION, "kind" => kind.to_string())
        .record(elapsed.as_secs_f64());
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_offload_finished(_kind: &str, _cancelled: bool, _elapsed: std::time::Duration) {}
