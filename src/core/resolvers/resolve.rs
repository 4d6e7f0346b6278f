// src/core/resolvers/resolve.rs

use super::{parse_player_url, solvers_for};
use crate::core::errors::ResolverError;
use crate::core::state::ServerState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

fn default_signature_key() -> String {
    "sig".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ResolveInput {
    pub stream_url: String,
    pub player_url: String,
    pub encrypted_signature: Option<String>,
    #[serde(default = "default_signature_key")]
    pub signature_key: String,
    pub n_param: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ResolveOutput {
    pub resolved_url: String,
}

/// spec.md §4.5.3.
pub async fn resolve(state: &Arc<ServerState>, input: ResolveInput) -> Result<ResolveOutput, ResolverError> {
    let player_url = parse_player_url(state, &input.player_url)?;
    let pair = solvers_for(state, &player_url).await?;

    let mut url = Url::parse(&input.stream_url)
        .map_err(|e| ResolverError::Validation(format!("invalid stream_url: {e}")))?;

    if let Some(encrypted) = &input.encrypted_signature {
        let solver = pair
            .sig
            .as_ref()
            .ok_or_else(|| ResolverError::Internal("no signature solver available for this player".to_string()))?;
        let decrypted = solver.apply(encrypted)?;

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "s" && k != input.signature_key.as_str())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair(&input.signature_key, &decrypted);
    }

    let effective_n = input.n_param.clone().or_else(|| {
        url.query_pairs()
            .find(|(k, _)| k == "n")
            .map(|(_, v)| v.into_owned())
    });

    if let (Some(n_token), Some(solver)) = (effective_n, &pair.n) {
        let decrypted_n = solver.apply(&n_token)?;
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "n")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(pairs)
            .append_pair("n", &decrypted_n);
    }

    Ok(ResolveOutput {
        resolved_url: url.to_string(),
    })
}
