// src/core/resolvers/mod.rs

//! C5 — the six request resolvers (spec.md §4.5). Each resolver is a pure
//! async function over a `RequestContext` and `Arc<ServerState>`, with
//! `{success, processing_time_ms, timestamp}` merged in by the HTTP layer
//! rather than here, so each one is directly unit-testable without HTTP
//! (mirroring the teacher's one-command-per-file layout under
//! `core::commands::cache::*`).

mod batch;
mod clear_cache;
mod decrypt;
mod resolve;
mod sts;
mod validate;

pub use batch::{batch, BatchInput, BatchItemResult, BatchOutput, BatchSummary};
pub use clear_cache::{clear_cache, ClearCacheInput, ClearCacheOutput};
pub use decrypt::{decrypt, DecryptInput, DecryptOutput};
pub use resolve::{resolve, ResolveInput, ResolveOutput};
pub use sts::{sts, StsInput, StsOutput};
pub use validate::{validate, ValidateInput, ValidateOutput};

use crate::core::domain::{PlayerUrl, SolversPair};
use crate::core::errors::ResolverError;
use crate::core::state::ServerState;
use std::sync::Arc;
use std::time::Instant;

/// Lets the HTTP layer surface a resolver-specific cache-hit/miss signal as
/// a response header without polluting the JSON body. Only `StsOutput`
/// overrides the default.
pub trait CacheHitAware {
    fn cache_hit(&self) -> Option<bool> {
        None
    }
}

impl CacheHitAware for DecryptOutput {}
impl CacheHitAware for ResolveOutput {}
impl CacheHitAware for BatchOutput {}
impl CacheHitAware for ValidateOutput {}
impl CacheHitAware for ClearCacheOutput {}

impl CacheHitAware for StsOutput {
    fn cache_hit(&self) -> Option<bool> {
        Some(self.cache_hit)
    }
}

/// Normalized request context threaded through every resolver.
pub struct RequestContext {
    pub request_id: String,
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }
}

/// Parses and validates a raw `player_url`, matching spec.md §3's
/// normalization-before-fingerprinting invariant.
pub(crate) fn parse_player_url(state: &ServerState, raw: &str) -> Result<PlayerUrl, ResolverError> {
    PlayerUrl::parse(raw, &state.config.allowed_player_hosts)
}

/// Implements spec.md §4.4's single-flight pipeline end to end: resolve the
/// player script via C1, then build (or retrieve) its `SolversPair` via C4.
pub(crate) async fn solvers_for(state: &Arc<ServerState>, player_url: &PlayerUrl) -> Result<SolversPair, ResolverError> {
    let (fingerprint, script) = state.player_store.get_or_fetch(player_url).await?;
    state
        .solvers
        .get_or_build(
            fingerprint,
            script,
            state.caches.clone(),
            state.workers.clone(),
            state.preprocessor.clone(),
            state.extractor.clone(),
        )
        .await
}
