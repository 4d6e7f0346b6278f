// src/core/resolvers/validate.rs

use crate::core::errors::ResolverError;
use crate::core::state::ServerState;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

static ALLOWED_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/=_-]+$").unwrap());

#[derive(Debug, Deserialize)]
pub struct ValidateInput {
    pub encrypted_signature: String,
    pub player_url: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub is_valid: bool,
    pub signature_type: String,
    pub signature_length: usize,
    pub player_url_valid: bool,
    pub validation_details: String,
}

/// spec.md §4.5.5. A cheap heuristic check — length, character class, and
/// player-url shape — with no solver evaluation involved.
pub async fn validate(_state: &Arc<ServerState>, input: ValidateInput) -> Result<ValidateOutput, ResolverError> {
    let sig = &input.encrypted_signature;
    let signature_length = sig.len();

    let length_ok = (10..=200).contains(&signature_length);
    let chars_ok = ALLOWED_CHARS.is_match(sig);
    let player_url_valid =
        input.player_url.contains("/s/player/") || input.player_url.contains("/yts/jsbin/");

    let (signature_type, validation_details) = if !player_url_valid {
        (
            "invalid_player_url".to_string(),
            "player_url does not match a known player path shape".to_string(),
        )
    } else if !length_ok {
        (
            "invalid".to_string(),
            format!("signature length {signature_length} is outside [10, 200]"),
        )
    } else if !chars_ok {
        ("invalid".to_string(), "signature contains disallowed characters".to_string())
    } else if signature_length <= 50 {
        ("short".to_string(), "signature and player_url are well-formed".to_string())
    } else if signature_length <= 100 {
        ("medium".to_string(), "signature and player_url are well-formed".to_string())
    } else {
        ("long".to_string(), "signature and player_url are well-formed".to_string())
    };

    Ok(ValidateOutput {
        is_valid: length_ok && chars_ok && player_url_valid,
        signature_type,
        signature_length,
        player_url_valid,
        validation_details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn state() -> Arc<ServerState> {
        let (tx, _rx) = tokio::sync::broadcast::channel(1);
        ServerState::initialize(crate::config::Config::default(), &tx).unwrap().state
    }

    #[tokio::test]
    async fn nine_characters_is_invalid() {
        let output = validate(
            &state(),
            ValidateInput {
                encrypted_signature: "a".repeat(9),
                player_url: "https://www.youtube.com/s/player/x/player.js".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(!output.is_valid);
    }

    #[tokio::test]
    async fn ten_alphanumeric_characters_on_a_valid_player_url_is_valid() {
        let output = validate(
            &state(),
            ValidateInput {
                encrypted_signature: "a".repeat(10),
                player_url: "https://www.youtube.com/s/player/x/player.js".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(output.is_valid);
        assert!(output.player_url_valid);
    }
}
