// src/core/cache/tiered.rs

//! Implements `TieredCache<V>`, the generic in-memory cache backing the
//! preprocessed/solver/sts caches (spec.md §4.2).

use crate::core::domain::Fingerprint;
use crate::core::metrics;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// A single cached entry: the value plus the monotonic time it was inserted.
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Observational snapshot of a cache's counters, per spec.md §4.2.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub max_size: usize,
    pub ops: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// A generic, size-bounded, TTL-expiring, LRU-evicting cache, keyed by
/// `Fingerprint`. One instance backs each of the three in-memory caches
/// (preprocessed, solver, sts); `name` is threaded through purely for
/// metrics labels, matching SPEC_FULL's cache-polymorphism design note.
pub struct TieredCache<V: Clone + Send + 'static> {
    name: &'static str,
    ttl: Duration,
    inner: Mutex<LruCache<Fingerprint, Entry<V>>>,
    hits: std::sync::atomic::AtomicU64,
    misses: std::sync::atomic::AtomicU64,
    ops: std::sync::atomic::AtomicU64,
    errors: std::sync::atomic::AtomicU64,
}

impl<V: Clone + Send + 'static> TieredCache<V> {
    pub fn new(name: &'static str, max_size: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_size.max(1)).unwrap();
        Self {
            name,
            ttl,
            inner: Mutex::new(LruCache::new(capacity)),
            hits: Default::default(),
            misses: Default::default(),
            ops: Default::default(),
            errors: Default::default(),
        }
    }

    fn record_op(&self, op: &'static str, outcome: &'static str, started: Instant) {
        self.ops.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        metrics::CACHE_OPS_TOTAL
            .with_label_values(&[self.name, op, outcome])
            .inc();
        metrics::CACHE_OP_LATENCY_SECONDS
            .with_label_values(&[self.name, op])
            .observe(started.elapsed().as_secs_f64());
    }

    /// Returns the value for `key`, or `None` if absent or expired. An
    /// expired entry is deleted as a side effect of the lookup.
    pub async fn get(&self, key: &Fingerprint) -> Option<V> {
        let started = Instant::now();
        let mut guard = self.inner.lock().await;
        let expired = guard
            .peek(key)
            .is_some_and(|e| e.inserted_at.elapsed() > self.ttl);
        if expired {
            guard.pop(key);
            drop(guard);
            self.misses
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            metrics::CACHE_MISSES_TOTAL.with_label_values(&[self.name]).inc();
            metrics::CACHE_EXPIRATIONS_TOTAL
                .with_label_values(&[self.name])
                .inc();
            self.record_op("get", "miss", started);
            return None;
        }

        let found = guard.get(key).map(|e| e.value.clone());
        drop(guard);
        if found.is_some() {
            self.hits
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            metrics::CACHE_HITS_TOTAL.with_label_values(&[self.name]).inc();
            self.record_op("get", "hit", started);
        } else {
            self.misses
                .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            metrics::CACHE_MISSES_TOTAL.with_label_values(&[self.name]).inc();
            self.record_op("get", "miss", started);
        }
        found
    }

    /// Returns `true` if `key` maps to a live (non-expired) entry, without
    /// promoting it in the LRU order.
    pub async fn has(&self, key: &Fingerprint) -> bool {
        let guard = self.inner.lock().await;
        guard
            .peek(key)
            .is_some_and(|e| e.inserted_at.elapsed() <= self.ttl)
    }

    /// Inserts or refreshes an entry. Capacity overflow evicts the
    /// least-recently-used remaining entry (handled internally by `lru`).
    pub async fn put(&self, key: Fingerprint, value: V) {
        let started = Instant::now();
        let mut guard = self.inner.lock().await;
        let max_size = guard.cap().get();
        let was_full = guard.len() >= max_size && !guard.contains(&key);
        guard.put(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
        let size = guard.len();
        drop(guard);
        if was_full {
            self.record_eviction();
        }
        metrics::CACHE_SIZE
            .with_label_values(&[self.name])
            .set(size as f64);
        self.record_op("put", "success", started);
    }

    /// Refreshes `key`'s LRU position without changing its value or TTL
    /// origin. No-op if the key is absent.
    pub async fn touch(&self, key: &Fingerprint) {
        let started = Instant::now();
        let mut guard = self.inner.lock().await;
        guard.promote(key);
        drop(guard);
        self.record_op("touch", "success", started);
    }

    /// Removes `key`, returning `true` if it was present.
    pub async fn delete(&self, key: &Fingerprint) -> bool {
        let started = Instant::now();
        let mut guard = self.inner.lock().await;
        let existed = guard.pop(key).is_some();
        let size = guard.len();
        drop(guard);
        metrics::CACHE_SIZE
            .with_label_values(&[self.name])
            .set(size as f64);
        self.record_op("delete", if existed { "success" } else { "miss" }, started);
        existed
    }

    /// Removes every entry from the cache.
    pub async fn clear(&self) {
        let started = Instant::now();
        let mut guard = self.inner.lock().await;
        guard.clear();
        drop(guard);
        metrics::CACHE_SIZE.with_label_values(&[self.name]).set(0.0);
        self.record_op("clear", "success", started);
    }

    /// Walks all entries and deletes the expired ones, returning the count
    /// removed. Invoked by the periodic sweep task (spec.md §4.2).
    pub async fn sweep_expired(&self) -> usize {
        let mut guard = self.inner.lock().await;
        let expired_keys: Vec<Fingerprint> = guard
            .iter()
            .filter(|(_, e)| e.inserted_at.elapsed() > self.ttl)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired_keys {
            guard.pop(key);
        }
        let size = guard.len();
        drop(guard);
        if !expired_keys.is_empty() {
            metrics::CACHE_EXPIRATIONS_TOTAL
                .with_label_values(&[self.name])
                .inc_by(expired_keys.len() as f64);
            metrics::CACHE_SIZE.with_label_values(&[self.name]).set(size as f64);
        }
        expired_keys.len()
    }

    fn record_eviction(&self) {
        metrics::CACHE_EVICTIONS_TOTAL
            .with_label_values(&[self.name])
            .inc();
    }

    pub async fn stats(&self) -> CacheStats {
        let guard = self.inner.lock().await;
        CacheStats {
            hits: self.hits.load(std::sync::atomic::Ordering::Relaxed),
            misses: self.misses.load(std::sync::atomic::Ordering::Relaxed),
            size: guard.len(),
            max_size: guard.cap().get(),
            ops: self.ops.load(std::sync::atomic::Ordering::Relaxed),
            errors: self.errors.load(std::sync::atomic::Ordering::Relaxed),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
