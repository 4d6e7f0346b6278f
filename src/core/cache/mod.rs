// src/core/cache/mod.rs

//! The generic, size-bounded, TTL-expiring, LRU-evicting cache (C2) and the
//! registry that wires up the three concrete in-memory caches plus their
//! periodic sweep task.

mod registry;
mod tiered;

pub use registry::CacheRegistry;
pub use tiered::{CacheStats, TieredCache};
