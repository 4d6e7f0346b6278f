// src/core/domain.rs

//! Core data types shared across the resolver pipeline (spec.md §3).

use crate::core::errors::ResolverError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// The allow-listed hosts a player URL is permitted to point at. Relative
/// paths beginning with `/s/player/` are expanded against the first entry.
pub const DEFAULT_ALLOWED_PLAYER_HOSTS: &[&str] = &["www.youtube.com", "youtube.com"];

/// A canonical, validated player URL. Construction is the only place
/// fingerprinting keys are derived from, so normalization happens once here
/// and nowhere else (spec.md §9: "Player-URL normalization must run before
/// fingerprinting").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerUrl(String);

impl PlayerUrl {
    /// Validates and normalizes a raw player URL string.
    ///
    /// * Relative paths beginning with `/s/player/` are expanded to the
    ///   canonical host (the first entry of `allowed_hosts`).
    /// * The resulting absolute URL must have a host in `allowed_hosts` and
    ///   must contain a `/player/` path segment.
    pub fn parse(raw: &str, allowed_hosts: &[String]) -> Result<Self, ResolverError> {
        let candidate = if raw.starts_with("/s/player/") {
            let host = allowed_hosts.first().ok_or_else(|| {
                ResolverError::Internal("no allowed player host configured".to_string())
            })?;
            format!("https://{host}{raw}")
        } else {
            raw.to_string()
        };

        let url = url::Url::parse(&candidate)
            .map_err(|e| ResolverError::Validation(format!("invalid player_url: {e}")))?;

        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ResolverError::Validation(
                "player_url must use http or https".to_string(),
            ));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ResolverError::Validation("player_url has no host".to_string()))?;

        if !allowed_hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) {
            return Err(ResolverError::Validation(format!(
                "player_url host '{host}' is not in the allow-list"
            )));
        }

        if !url.path().contains("/player/") {
            return Err(ResolverError::Validation(
                "player_url must contain a '/player/' path segment".to_string(),
            ));
        }

        Ok(PlayerUrl(url.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives this URL's fingerprint: hex-encoded SHA-256 of the canonical string.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        Fingerprint(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for PlayerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hex-encoded SHA-256 of a canonical player URL. Used as the on-disk
/// filename (C1) and as the key into every in-memory cache (C2).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw text of a fetched player script, owned by the player store on disk.
pub type PlayerScript = String;

/// Derived representation of a raw script, produced by the worker pool.
/// Opaque to everything except the solver extractor.
#[derive(Debug, Clone)]
pub struct PreprocessedScript(pub String);

/// A deobfuscation routine extracted from a preprocessed script: maps an
/// opaque token string to its decoded form.
pub trait Solver: Send + Sync + fmt::Debug {
    fn apply(&self, input: &str) -> Result<String, ResolverError>;
}

/// The pair of callables extracted from a player script (spec.md §3).
/// Absence of a slot signals "this player has no transform of that kind",
/// not an error; it is never fabricated except by `extract()` (§4.6).
#[derive(Clone)]
pub struct SolversPair {
    pub sig: Option<std::sync::Arc<dyn Solver>>,
    pub n: Option<std::sync::Arc<dyn Solver>>,
}

impl fmt::Debug for SolversPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolversPair")
            .field("sig", &self.sig.is_some())
            .field("n", &self.n.is_some())
            .finish()
    }
}

/// Decimal string in `[0, 9_999_999_999]` extracted from the player script,
/// used by upstream protocols as a version tag for the signature algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sts(u64);

impl Sts {
    pub const MAX: u64 = 9_999_999_999;

    pub fn new(value: i64) -> Result<Self, ResolverError> {
        if value < 0 || value as u64 > Self::MAX {
            return Err(ResolverError::Validation(format!(
                "signature timestamp {value} out of range [0, {}]",
                Self::MAX
            )));
        }
        Ok(Sts(value as u64))
    }

    pub fn as_decimal_string(&self) -> String {
        self.0.to_string()
    }
}
