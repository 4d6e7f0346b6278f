// src/core/player_store.rs

//! C1 — the on-disk, content-addressed player-script store.
//!
//! Grounded on the teacher's `CACHE.FETCH` stampede-protection pattern
//! (`core::commands::cache::cache_fetch`) for coalescing concurrent fetches
//! of the same script, and on `core::commands::helpers::validate_fetch_url`
//! for SSRF hardening of the upstream fetch.

use crate::config::PlayerStoreConfig;
use crate::core::domain::{Fingerprint, PlayerScript, PlayerUrl};
use crate::core::errors::ResolverError;
use crate::core::metrics;
use dashmap::DashMap;
use std::net::{IpAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, warn};

/// Content-addressed on-disk store for fetched player scripts (spec.md §4.1).
pub struct PlayerStore {
    root: PathBuf,
    retention: Duration,
    allowed_hosts: Vec<String>,
    http: reqwest::Client,
    /// Coalesces concurrent fetches of the same fingerprint, mirroring the
    /// teacher's `CacheState::fetch_locks`.
    fetch_locks: DashMap<Fingerprint, Arc<Mutex<()>>>,
}

impl PlayerStore {
    pub fn new(config: &PlayerStoreConfig, allowed_hosts: Vec<String>) -> Result<Self, ResolverError> {
        let http = reqwest::Client::builder()
            .user_agent("resolver-core/0.1")
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(ResolverError::from)?;

        Ok(Self {
            root: PathBuf::from(&config.path),
            retention: Duration::from_secs(config.retention_days * 24 * 3600),
            allowed_hosts,
            http,
            fetch_locks: DashMap::new(),
        })
    }

    /// Ensures the store root exists on disk. Call once at startup.
    pub async fn ensure_root(&self) -> Result<(), ResolverError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn path_for_fingerprint(&self, fp: &Fingerprint) -> PathBuf {
        self.root.join(format!("{}.js", fp.as_str()))
    }

    /// Returns the script for `player_url`, fetching and persisting it on
    /// disk if not already present (spec.md §4.1). Concurrent calls for the
    /// same fingerprint are coalesced into a single upstream fetch.
    pub async fn get_or_fetch(&self, player_url: &PlayerUrl) -> Result<(Fingerprint, PlayerScript), ResolverError> {
        let fp = player_url.fingerprint();
        let path = self.path_for_fingerprint(&fp);

        if let Some(script) = self.read_if_present(&path).await? {
            return Ok((fp, script));
        }

        // Acquire (or install) this fingerprint's coalescing lock.
        let lock = self
            .fetch_locks
            .entry(fp.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-check: another caller may have completed the fetch while we waited.
        if let Some(script) = self.read_if_present(&path).await? {
            return Ok((fp, script));
        }

        self.validate_url(player_url).await?;

        debug!(url = %player_url, "fetching player script from upstream");
        let response = self
            .http
            .get(player_url.as_str())
            .send()
            .await
            .map_err(ResolverError::from)?;
        if !response.status().is_success() {
            return Err(ResolverError::FetchFailed {
                status: response.status().as_u16(),
            });
        }
        let body = response.text().await.map_err(ResolverError::from)?;
        metrics::PLAYER_STORE_FETCHES_TOTAL.inc();

        self.write_atomic(&path, &body).await?;
        metrics::PLAYER_STORE_FILES.inc();

        Ok((fp, body))
    }

    async fn read_if_present(&self, path: &Path) -> Result<Option<PlayerScript>, ResolverError> {
        match fs::read_to_string(path).await {
            Ok(contents) => {
                // Re-writing the file (same contents) refreshes mtime so the
                // retention sweep treats this entry as recently used, without
                // depending on a platform-specific atime-setting API.
                fs::write(path, &contents).await?;
                Ok(Some(contents))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), ResolverError> {
        let tmp_path = path.with_extension("js.tmp");
        fs::write(&tmp_path, contents).await?;
        fs::rename(&tmp_path, path).await?;
        Ok(())
    }

    async fn validate_url(&self, player_url: &PlayerUrl) -> Result<(), ResolverError> {
        let url = url::Url::parse(player_url.as_str())?;
        let host = url
            .host_str()
            .ok_or_else(|| ResolverError::Validation("player_url has no host".to_string()))?
            .to_string();

        if !self.allowed_hosts.iter().any(|h| h.eq_ignore_ascii_case(&host)) {
            return Err(ResolverError::Validation(format!(
                "player_url host '{host}' is not allow-listed"
            )));
        }

        let port = url.port().unwrap_or(if url.scheme() == "https" { 443 } else { 80 });
        let target = format!("{host}:{port}");
        let addrs = tokio::task::spawn_blocking(move || target.to_socket_addrs())
            .await
            .map_err(|e| ResolverError::Internal(format!("DNS resolution task failed: {e}")))?
            .map_err(|e| ResolverError::Validation(format!("could not resolve host '{host}': {e}")))?;

        let mut resolved_any = false;
        for addr in addrs {
            resolved_any = true;
            if !is_globally_routable(&addr.ip()) {
                return Err(ResolverError::Validation(format!(
                    "player_url host resolves to a forbidden IP address: {}",
                    addr.ip()
                )));
            }
        }
        if !resolved_any {
            return Err(ResolverError::Validation(
                "player_url host did not resolve to any IP address".to_string(),
            ));
        }
        Ok(())
    }

    /// Deletes files whose access time exceeds the retention window. Run once
    /// at startup and then periodically by the sweep task (spec.md §4.1).
    pub async fn sweep_retention(&self) -> Result<usize, ResolverError> {
        let mut removed = 0usize;
        let mut survivors = 0usize;
        let mut entries = fs::read_dir(&self.root).await?;
        let now = SystemTime::now();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("js") {
                continue;
            }
            let metadata = entry.metadata().await?;
            let last_used = metadata
                .accessed()
                .or_else(|_| metadata.modified())
                .unwrap_or(now);
            let age = now.duration_since(last_used).unwrap_or(Duration::ZERO);
            if age > self.retention {
                if let Err(e) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "failed to remove expired player script");
                } else {
                    removed += 1;
                }
            } else {
                survivors += 1;
            }
        }

        metrics::PLAYER_STORE_FILES.set(survivors as f64);
        if removed > 0 {
            info!(removed, survivors, "player store retention sweep complete");
        }
        Ok(removed)
    }

    /// Periodic task: retention sweep on an interval, plus coalescing-lock
    /// cleanup mirroring the teacher's `CacheLockCleanerTask`.
    pub async fn run_maintenance(&self, interval: Duration, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_retention().await {
                        warn!(error = %e, "player store retention sweep failed");
                    }
                    self.clean_fetch_locks();
                }
                _ = shutdown_rx.recv() => {
                    debug!("player store maintenance task shutting down");
                    return;
                }
            }
        }
    }

    fn clean_fetch_locks(&self) {
        self.fetch_locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Removes every stored player script from disk (spec.md §4.5.6's
    /// `"player"` cache type).
    pub async fn clear_all(&self) -> Result<usize, ResolverError> {
        let mut removed = 0usize;
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("js") {
                continue;
            }
            fs::remove_file(&path).await?;
            removed += 1;
        }
        metrics::PLAYER_STORE_FILES.set(0.0);
        Ok(removed)
    }
}

fn is_globally_routable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !v4.is_private()
                && !v4.is_loopback()
                && !v4.is_link_local()
                && !v4.is_broadcast()
                && !v4.is_documentation()
                && !v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            let is_global = (v6.segments()[0] & 0xe000) == 0x2000;
            !v6.is_loopback() && !v6.is_unspecified() && is_global
        }
    }
}
