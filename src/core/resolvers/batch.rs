// src/core/resolvers/batch.rs

use super::decrypt::{decrypt, DecryptInput, DecryptOutput};
use crate::core::errors::ResolverError;
use crate::core::state::ServerState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct BatchInput {
    pub signatures: Vec<DecryptInput>,
}

#[derive(Debug, Serialize)]
pub struct BatchItemResult {
    pub player_url: String,
    pub success: bool,
    pub result: Option<DecryptOutput>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize)]
pub struct BatchOutput {
    pub results: Vec<BatchItemResult>,
    pub summary: BatchSummary,
}

/// spec.md §4.5.4. Every item is resolved independently; one item's failure
/// never fails the batch as a whole.
pub async fn batch(state: &Arc<ServerState>, input: BatchInput) -> Result<BatchOutput, ResolverError> {
    let mut results = Vec::with_capacity(input.signatures.len());
    let mut successful = 0usize;
    let mut failed = 0usize;

    for item in input.signatures {
        let player_url = item.player_url.clone();
        match decrypt(state, item).await {
            Ok(output) => {
                successful += 1;
                results.push(BatchItemResult {
                    player_url,
                    success: true,
                    result: Some(output),
                    error: None,
                });
            }
            Err(e) => {
                failed += 1;
                results.push(BatchItemResult {
                    player_url,
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    let total = results.len();
    Ok(BatchOutput {
        results,
        summary: BatchSummary {
            total,
            successful,
            failed,
        },
    })
}
