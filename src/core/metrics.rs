// src/core/metrics.rs

//! Defines and registers Prometheus metrics for the resolver pipeline.
//!
//! Uses `lazy_static` so metrics are registered exactly once, globally, for
//! the process lifetime — mirroring the teacher's `core::metrics` module.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, Histogram, HistogramVec, TextEncoder, register_counter,
    register_counter_vec, register_gauge, register_histogram, register_histogram_vec,
};

lazy_static! {
    // --- Server-wide ---
    pub static ref UPTIME_SECONDS: Gauge =
        register_gauge!("resolver_uptime_seconds", "Process uptime in seconds.").unwrap();
    pub static ref MEMORY_USED_BYTES: Gauge =
        register_gauge!("resolver_memory_used_bytes", "Resident memory used by the process in bytes.").unwrap();

    // --- Requests ---
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "resolver_requests_total",
        "Total number of requests received, labeled by path.",
        &["path"]
    )
    .unwrap();
    pub static ref RESPONSES_TOTAL: CounterVec = register_counter_vec!(
        "resolver_responses_total",
        "Total number of responses sent, labeled by path and status.",
        &["path", "status"]
    )
    .unwrap();
    pub static ref REQUEST_LATENCY_SECONDS: HistogramVec = register_histogram_vec!(
        "resolver_request_latency_seconds",
        "Latency of request handling in seconds, labeled by path.",
        &["path"]
    )
    .unwrap();
    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "resolver_errors_total",
        "Total number of errors, labeled by kind.",
        &["kind"]
    )
    .unwrap();

    // --- Tiered caches (C2) ---
    pub static ref CACHE_OPS_TOTAL: CounterVec = register_counter_vec!(
        "resolver_cache_ops_total",
        "Total number of cache operations, labeled by cache, op, and outcome.",
        &["cache_name", "op", "outcome"]
    )
    .unwrap();
    pub static ref CACHE_HITS_TOTAL: CounterVec = register_counter_vec!(
        "resolver_cache_hits_total",
        "Total number of cache hits, labeled by cache.",
        &["cache_name"]
    )
    .unwrap();
    pub static ref CACHE_MISSES_TOTAL: CounterVec = register_counter_vec!(
        "resolver_cache_misses_total",
        "Total number of cache misses, labeled by cache.",
        &["cache_name"]
    )
    .unwrap();
    pub static ref CACHE_SIZE: prometheus::GaugeVec = prometheus::register_gauge_vec!(
        "resolver_cache_size",
        "Current number of entries in a cache, labeled by cache.",
        &["cache_name"]
    )
    .unwrap();
    pub static ref CACHE_OP_LATENCY_SECONDS: HistogramVec = register_histogram_vec!(
        "resolver_cache_op_latency_seconds",
        "Latency of cache operations in seconds, labeled by cache and op.",
        &["cache_name", "op"]
    )
    .unwrap();
    pub static ref CACHE_EVICTIONS_TOTAL: CounterVec = register_counter_vec!(
        "resolver_cache_evictions_total",
        "Total number of LRU evictions, labeled by cache.",
        &["cache_name"]
    )
    .unwrap();
    pub static ref CACHE_EXPIRATIONS_TOTAL: CounterVec = register_counter_vec!(
        "resolver_cache_expirations_total",
        "Total number of TTL expirations, labeled by cache.",
        &["cache_name"]
    )
    .unwrap();

    // --- Player store (C1) ---
    pub static ref PLAYER_STORE_FILES: Gauge = register_gauge!(
        "resolver_player_store_files",
        "Number of player scripts currently retained on disk."
    )
    .unwrap();
    pub static ref PLAYER_STORE_FETCHES_TOTAL: Counter = register_counter!(
        "resolver_player_store_fetches_total",
        "Total number of upstream player-script fetches performed."
    )
    .unwrap();

    // --- Worker pool (C3) ---
    pub static ref WORKER_TASKS_TOTAL: CounterVec = register_counter_vec!(
        "resolver_worker_tasks_total",
        "Total number of worker tasks completed, labeled by status.",
        &["status"]
    )
    .unwrap();
    pub static ref WORKER_TASK_DURATION_SECONDS: Histogram = register_histogram!(
        "resolver_worker_task_duration_seconds",
        "Duration of a single preprocessing task in seconds."
    )
    .unwrap();
    pub static ref WORKER_ACTIVE: Gauge = register_gauge!(
        "resolver_worker_active",
        "Number of worker slots currently executing a task."
    )
    .unwrap();

    // --- Solver registry (C4) ---
    pub static ref SOLVER_BUILDS_TOTAL: CounterVec = register_counter_vec!(
        "resolver_solver_builds_total",
        "Total number of solver-pair builds, labeled by outcome.",
        &["outcome"]
    )
    .unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap()
}
