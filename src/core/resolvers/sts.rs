// src/core/resolvers/sts.rs

use super::parse_player_url;
use crate::core::domain::Sts;
use crate::core::errors::ResolverError;
use crate::core::state::ServerState;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};

#[derive(Debug, Deserialize)]
pub struct StsInput {
    pub player_url: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct StsOutput {
    pub sts: String,
    #[serde(skip)]
    pub cache_hit: bool,
}

/// The ordered pattern list from spec.md §4.5.2. Kept as an explicit,
/// ordered `Vec` rather than collapsed into one alternation — a single
/// alternation would not reliably preserve first-match priority across
/// regex engines.
static STS_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?:signatureTimestamp|sts):\s*(\d+)").unwrap(),
        Regex::new(r#""signatureTimestamp":\s*(\d+)"#).unwrap(),
        Regex::new(r"'signatureTimestamp':\s*(\d+)").unwrap(),
        Regex::new(r"signatureTimestamp\s*=\s*(\d+)").unwrap(),
        Regex::new(r"sts\s*=\s*(\d+)").unwrap(),
        Regex::new(r#""sts":\s*(\d+)"#).unwrap(),
        Regex::new(r"'sts':\s*(\d+)").unwrap(),
    ]
});

/// spec.md §4.5.2.
pub async fn sts(state: &Arc<ServerState>, input: StsInput) -> Result<StsOutput, ResolverError> {
    let player_url = parse_player_url(state, &input.player_url)?;
    let fingerprint = player_url.fingerprint();

    if let Some(cached) = state.caches.sts.get(&fingerprint).await {
        return Ok(StsOutput {
            sts: cached.as_decimal_string(),
            cache_hit: true,
        });
    }

    let (_, script) = state.player_store.get_or_fetch(&player_url).await?;
    if script.len() < 1000 {
        return Err(ResolverError::Validation(
            "player script is too short to contain a valid signature timestamp".to_string(),
        ));
    }

    let value = extract_sts(&script).ok_or_else(|| {
        ResolverError::NotFound("no signature timestamp pattern matched in player script".to_string())
    })?;

    let sts = Sts::new(value)?;
    state.caches.sts.put(fingerprint, sts.clone()).await;
    Ok(StsOutput {
        sts: sts.as_decimal_string(),
        cache_hit: false,
    })
}

/// Scans `script` with the ordered pattern list, returning the first match.
fn extract_sts(script: &str) -> Option<i64> {
    for pattern in STS_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(script) {
            if let Ok(value) = caps[1].parse::<i64>() {
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_colon_form() {
        assert_eq!(extract_sts("var x = signatureTimestamp: 19999;"), Some(19999));
    }

    #[test]
    fn matches_json_double_quoted_form() {
        assert_eq!(extract_sts(r#"{"signatureTimestamp": 12345}"#), Some(12345));
    }

    #[test]
    fn matches_json_single_quoted_form() {
        assert_eq!(extract_sts("{'sts': 9999999999}"), Some(9_999_999_999));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(extract_sts("no timestamp here"), None);
    }

    #[test]
    fn sts_boundary_values() {
        assert!(Sts::new(0).is_ok());
        assert!(Sts::new(9_999_999_999).is_ok());
        assert!(Sts::new(-1).is_err());
        assert!(Sts::new(10_000_000_000).is_err());
    }
}
