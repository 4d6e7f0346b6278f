// src/core/resolvers/decrypt.rs

use super::{parse_player_url, solvers_for};
use crate::core::errors::ResolverError;
use crate::core::state::ServerState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct DecryptInput {
    pub player_url: String,
    pub encrypted_signature: Option<String>,
    pub n_param: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct DecryptOutput {
    pub decrypted_signature: String,
    pub decrypted_n_sig: String,
}

/// spec.md §4.5.1. Solver-throws are caught and logged; the corresponding
/// field is left empty but the overall response is still a success (spec.md
/// §7's documented, intentionally-preserved propagation policy).
pub async fn decrypt(state: &Arc<ServerState>, input: DecryptInput) -> Result<DecryptOutput, ResolverError> {
    let player_url = parse_player_url(state, &input.player_url)?;
    let pair = solvers_for(state, &player_url).await?;

    let decrypted_signature = match (&input.encrypted_signature, &pair.sig) {
        (Some(token), Some(solver)) => match solver.apply(token) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "sig solver failed during decrypt");
                String::new()
            }
        },
        _ => String::new(),
    };

    let decrypted_n_sig = match (&input.n_param, &pair.n) {
        (Some(token), Some(solver)) => match solver.apply(token) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "n solver failed during decrypt");
                String::new()
            }
        },
        _ => String::new(),
    };

    Ok(DecryptOutput {
        decrypted_signature,
        decrypted_n_sig,
    })
}
