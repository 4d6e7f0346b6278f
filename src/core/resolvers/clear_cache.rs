// src/core/resolvers/clear_cache.rs

use crate::core::errors::ResolverError;
use crate::core::state::ServerState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

fn default_cache_type() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ClearCacheInput {
    #[serde(default = "default_cache_type")]
    pub cache_type: String,
    #[serde(default)]
    pub clear_all: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearCacheOutput {
    pub cleared_caches: Vec<String>,
    pub cache_count: usize,
    pub clear_all: bool,
}

/// spec.md §4.5.6. `clear_all: true` is an alias for `cache_type: "all"`.
pub async fn clear_cache(state: &Arc<ServerState>, input: ClearCacheInput) -> Result<ClearCacheOutput, ResolverError> {
    let clear_all = input.clear_all || input.cache_type == "all";
    let cache_type = if clear_all { "all" } else { input.cache_type.as_str() };

    let mut cleared: Vec<String> = Vec::new();

    match cache_type {
        "all" => {
            let names = state
                .caches
                .clear("all")
                .await
                .map_err(ResolverError::Validation)?;
            cleared.extend(names.into_iter().map(str::to_string));

            let removed = state.player_store.clear_all().await?;
            cleared.push("player".to_string());
            info!(removed, "cleared player script store");
        }
        "player" => {
            let removed = state.player_store.clear_all().await?;
            cleared.push("player".to_string());
            info!(removed, "cleared player script store");
        }
        "preprocessed" | "solver" | "sts" => {
            let names = state
                .caches
                .clear(cache_type)
                .await
                .map_err(ResolverError::Validation)?;
            cleared.extend(names.into_iter().map(str::to_string));
        }
        other => {
            return Err(ResolverError::Validation(format!(
                "unknown cache_type '{other}'"
            )));
        }
    }

    let cache_count = cleared.len();
    Ok(ClearCacheOutput { cleared_caches: cleared, cache_count, clear_all })
}
