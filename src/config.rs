// src/config.rs

//! Manages server configuration: loading from the environment, resolving
//! defaults, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Configuration for a single in-memory tiered cache (spec.md §3's cache
/// identities table: preprocessed / solver / sts).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CacheTierConfig {
    #[serde(default = "default_cache_max")]
    pub max_size: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cache_max() -> usize {
    5000
}
fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for CacheTierConfig {
    fn default() -> Self {
        Self {
            max_size: default_cache_max(),
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Configuration for the three in-memory caches (C2).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CachesConfig {
    #[serde(default = "default_preprocessed_cache")]
    pub preprocessed: CacheTierConfig,
    #[serde(default = "default_solver_cache")]
    pub solver: CacheTierConfig,
    #[serde(default = "default_sts_cache")]
    pub sts: CacheTierConfig,
    /// How often the periodic sweep task purges expired entries from every tier.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_preprocessed_cache() -> CacheTierConfig {
    CacheTierConfig {
        max_size: 15_000,
        ttl_secs: 4 * 3600,
    }
}
fn default_solver_cache() -> CacheTierConfig {
    CacheTierConfig {
        max_size: 5_000,
        ttl_secs: 2 * 3600,
    }
}
fn default_sts_cache() -> CacheTierConfig {
    CacheTierConfig {
        max_size: 10_000,
        ttl_secs: 3600,
    }
}
fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for CachesConfig {
    fn default() -> Self {
        Self {
            preprocessed: default_preprocessed_cache(),
            solver: default_solver_cache(),
            sts: default_sts_cache(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Configuration for the on-disk player store (C1).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlayerStoreConfig {
    #[serde(default = "default_player_store_path")]
    pub path: String,
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
}

fn default_player_store_path() -> String {
    "player_cache".to_string()
}
fn default_retention_days() -> u64 {
    14
}

impl Default for PlayerStoreConfig {
    fn default() -> Self {
        Self {
            path: default_player_store_path(),
            retention_days: default_retention_days(),
        }
    }
}

/// Configuration for the preprocessing worker pool (C3).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorkerPoolConfig {
    #[serde(default = "default_worker_count")]
    pub count: usize,
    #[serde(default = "default_worker_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_worker_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_worker_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_worker_count() -> usize {
    16
}
fn default_worker_timeout_secs() -> u64 {
    60
}
fn default_worker_max_retries() -> u32 {
    5
}
fn default_worker_queue_capacity() -> usize {
    256
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            count: default_worker_count(),
            timeout_secs: default_worker_timeout_secs(),
            max_retries: default_worker_max_retries(),
            queue_capacity: default_worker_queue_capacity(),
        }
    }
}

/// Configuration for the rate-limit gate (C7).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_rate_limit_window_ms")]
    pub window_ms: u64,
    #[serde(default = "default_rate_limit_max_requests")]
    pub max_requests: u32,
}

fn default_rate_limit_window_ms() -> u64 {
    60_000
}
fn default_rate_limit_max_requests() -> u32 {
    120
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_rate_limit_window_ms(),
            max_requests: default_rate_limit_max_requests(),
        }
    }
}

/// The top-level, resolved configuration for the server.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bearer/Basic/raw token required on non-exempt endpoints. `None` disables auth.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub caches: CachesConfig,
    #[serde(default)]
    pub player_store: PlayerStoreConfig,
    #[serde(default)]
    pub workers: WorkerPoolConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Allow-listed player script hosts (spec.md §3).
    #[serde(default = "default_allowed_player_hosts")]
    pub allowed_player_hosts: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}
fn default_allowed_player_hosts() -> Vec<String> {
    crate::core::domain::DEFAULT_ALLOWED_PLAYER_HOSTS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_token: None,
            rate_limit: RateLimitConfig::default(),
            caches: CachesConfig::default(),
            player_store: PlayerStoreConfig::default(),
            workers: WorkerPoolConfig::default(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            allowed_player_hosts: default_allowed_player_hosts(),
        }
    }
}

impl Config {
    /// Builds configuration purely from environment variables (spec.md §6:
    /// "Configuration. Environment-driven."), layered over the defaults
    /// above. Nested fields use a double-underscore separator, e.g.
    /// `RESOLVER_CACHES__SOLVER__TTL_SECS`. Recognized variables are
    /// documented in `SPEC_FULL.md`.
    ///
    /// The canonical API-token variable is `RESOLVER_API_TOKEN`; this
    /// resolves the inconsistency noted in spec.md §9's Open Questions by
    /// picking a single name rather than accepting two aliases.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();
        let defaults_json = serde_json::to_value(&defaults)
            .context("failed to serialize default configuration")?;

        let builder = config::Config::builder()
            .add_source(config::File::from_str(
                &defaults_json.to_string(),
                config::FileFormat::Json,
            ))
            .add_source(
                config::Environment::with_prefix("RESOLVER")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("allowed_player_hosts"),
            );

        let resolved: Config = builder
            .build()
            .context("failed to build configuration from environment")?
            .try_deserialize()
            .context("failed to deserialize resolved configuration")?;

        resolved.validate()?;
        Ok(resolved)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.allowed_player_hosts.is_empty() {
            return Err(anyhow!("allowed_player_hosts cannot be empty"));
        }
        if self.workers.count == 0 {
            return Err(anyhow!("workers.count cannot be 0"));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(anyhow!("rate_limit.max_requests cannot be 0"));
        }
        Ok(())
    }
}
