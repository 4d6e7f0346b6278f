// src/core/tasks/mod.rs

//! Thin per-task wrappers around the maintenance loops owned by `CacheRegistry`,
//! `PlayerStore`, and `RateLimiter`, mirroring the teacher's one-struct-per-task
//! layout (`TtlManager`, `CacheLockCleanerTask`) even though the loop bodies
//! themselves live alongside the state they maintain.

mod cache_sweep;
mod player_store_maintenance;
mod rate_limit_sweep;

pub use cache_sweep::CacheSweepTask;
pub use player_store_maintenance::PlayerStoreMaintenanceTask;
pub use rate_limit_sweep::RateLimitSweepTask;
