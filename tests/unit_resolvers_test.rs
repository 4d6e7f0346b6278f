use resolver_core::config::{Config, PlayerStoreConfig};
use resolver_core::core::domain::PlayerUrl;
use resolver_core::core::resolvers::{
    batch, clear_cache, decrypt, resolve, sts, validate, BatchInput, ClearCacheInput, DecryptInput,
    ResolveInput, StsInput, ValidateInput,
};
use resolver_core::core::state::ServerState;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::broadcast;

const PLAYER_URL: &str = "https://www.youtube.com/s/player/test123/player.js";
const REVERSING_SCRIPT: &str = r#"
function sig_abc(a) { return a.split("").reverse().join(""); }
function n_xyz(a) { return a.split("").reverse().join(""); }
"#;

fn seed_state(dir: &tempfile::TempDir) -> Arc<ServerState> {
    let mut config = Config::default();
    config.allowed_player_hosts = vec!["www.youtube.com".to_string()];
    config.player_store = PlayerStoreConfig {
        path: dir.path().to_string_lossy().to_string(),
        retention_days: 14,
    };

    let (shutdown_tx, _rx) = broadcast::channel(1);
    let init = ServerState::initialize(config, &shutdown_tx).unwrap();
    init.state
}

fn seed_player_script(state: &ServerState, body: &str) {
    let hosts = vec!["www.youtube.com".to_string()];
    let player_url = PlayerUrl::parse(PLAYER_URL, &hosts).unwrap();
    let fingerprint = player_url.fingerprint();
    let path = std::path::Path::new(&state.config.player_store.path).join(format!("{}.js", fingerprint.as_str()));
    std::fs::write(path, body).unwrap();
}

#[tokio::test]
async fn decrypt_signature_applies_the_extracted_solver() {
    let dir = tempdir().unwrap();
    let state = seed_state(&dir);
    seed_player_script(&state, REVERSING_SCRIPT);

    let output = decrypt(
        &state,
        DecryptInput {
            player_url: PLAYER_URL.to_string(),
            encrypted_signature: Some("abc".to_string()),
            n_param: Some("xyz".to_string()),
        },
    )
    .await
    .unwrap();

    assert_eq!(output.decrypted_signature, "cba");
    assert_eq!(output.decrypted_n_sig, "zyx");
}

#[tokio::test]
async fn decrypt_signature_leaves_field_empty_when_no_token_supplied() {
    let dir = tempdir().unwrap();
    let state = seed_state(&dir);
    seed_player_script(&state, REVERSING_SCRIPT);

    let output = decrypt(
        &state,
        DecryptInput {
            player_url: PLAYER_URL.to_string(),
            encrypted_signature: None,
            n_param: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(output.decrypted_signature, "");
    assert_eq!(output.decrypted_n_sig, "");
}

#[tokio::test]
async fn get_sts_is_served_from_cache_on_second_call() {
    let dir = tempdir().unwrap();
    let state = seed_state(&dir);
    let script_with_sts = format!("{}{}", "x".repeat(1000), r#"{"signatureTimestamp": 19999}"#);
    seed_player_script(&state, &script_with_sts);

    let first = sts(&state, StsInput { player_url: PLAYER_URL.to_string() }).await.unwrap();
    assert_eq!(first.sts, "19999");
    assert!(!first.cache_hit);

    // Delete the on-disk script; a cache hit should not need to read it again.
    let hosts = vec!["www.youtube.com".to_string()];
    let fingerprint = PlayerUrl::parse(PLAYER_URL, &hosts).unwrap().fingerprint();
    let path = std::path::Path::new(&state.config.player_store.path).join(format!("{}.js", fingerprint.as_str()));
    std::fs::remove_file(path).unwrap();

    let second = sts(&state, StsInput { player_url: PLAYER_URL.to_string() }).await.unwrap();
    assert_eq!(second.sts, "19999");
    assert!(second.cache_hit);
}

#[tokio::test]
async fn resolve_url_rewrites_signature_and_n_param_idempotently() {
    let dir = tempdir().unwrap();
    let state = seed_state(&dir);
    seed_player_script(&state, REVERSING_SCRIPT);

    let input = ResolveInput {
        stream_url: "https://example.com/videoplayback?id=1&s=cba&n=zyx".to_string(),
        player_url: PLAYER_URL.to_string(),
        encrypted_signature: Some("cba".to_string()),
        signature_key: "sig".to_string(),
        n_param: None,
    };
    let first = resolve(&state, input).await.unwrap();
    assert!(first.resolved_url.contains("sig=abc"));
    assert!(first.resolved_url.contains("n=xyz"));

    // resolve_url is a pure function of its input: calling it again with the
    // identical request reproduces exactly the same rewritten URL.
    let input_again = ResolveInput {
        stream_url: "https://example.com/videoplayback?id=1&s=cba&n=zyx".to_string(),
        player_url: PLAYER_URL.to_string(),
        encrypted_signature: Some("cba".to_string()),
        signature_key: "sig".to_string(),
        n_param: None,
    };
    let second = resolve(&state, input_again).await.unwrap();
    assert_eq!(first.resolved_url, second.resolved_url);
}

#[tokio::test]
async fn batch_decrypt_with_zero_items_returns_a_zero_summary() {
    let dir = tempdir().unwrap();
    let state = seed_state(&dir);

    let output = batch(&state, BatchInput { signatures: vec![] }).await.unwrap();
    assert_eq!(output.summary.total, 0);
    assert_eq!(output.summary.successful, 0);
    assert_eq!(output.summary.failed, 0);
    assert!(output.results.is_empty());
}

#[tokio::test]
async fn batch_decrypt_reports_per_item_success_and_failure() {
    let dir = tempdir().unwrap();
    let state = seed_state(&dir);
    seed_player_script(&state, REVERSING_SCRIPT);

    let output = batch(
        &state,
        BatchInput {
            signatures: vec![
                DecryptInput {
                    player_url: PLAYER_URL.to_string(),
                    encrypted_signature: Some("abc".to_string()),
                    n_param: None,
                },
                DecryptInput {
                    player_url: "https://evil.example.com/player/x.js".to_string(),
                    encrypted_signature: Some("abc".to_string()),
                    n_param: None,
                },
            ],
        },
    )
    .await
    .unwrap();

    assert_eq!(output.summary.total, 2);
    assert_eq!(output.summary.successful, 1);
    assert_eq!(output.summary.failed, 1);
    assert!(output.results[1].error.is_some());
}

#[tokio::test]
async fn validate_signature_rejects_out_of_range_lengths() {
    let dir = tempdir().unwrap();
    let state = seed_state(&dir);

    let too_short = validate(
        &state,
        ValidateInput { encrypted_signature: "short".to_string(), player_url: PLAYER_URL.to_string() },
    )
    .await
    .unwrap();
    assert!(!too_short.is_valid);
    assert_eq!(too_short.signature_length, 5);

    let too_long = validate(
        &state,
        ValidateInput { encrypted_signature: "a".repeat(201), player_url: PLAYER_URL.to_string() },
    )
    .await
    .unwrap();
    assert!(!too_long.is_valid);
}

#[tokio::test]
async fn validate_signature_accepts_a_well_formed_token() {
    let dir = tempdir().unwrap();
    let state = seed_state(&dir);

    let output = validate(
        &state,
        ValidateInput { encrypted_signature: "A".repeat(40), player_url: PLAYER_URL.to_string() },
    )
    .await
    .unwrap();
    assert!(output.is_valid);
    assert!(output.player_url_valid);
    assert_eq!(output.signature_type, "short");
}

#[tokio::test]
async fn clear_cache_all_reports_all_four_names_and_empties_every_tier() {
    let dir = tempdir().unwrap();
    let state = seed_state(&dir);
    seed_player_script(&state, REVERSING_SCRIPT);

    // Warm all three in-memory tiers plus the on-disk player store.
    decrypt(
        &state,
        DecryptInput { player_url: PLAYER_URL.to_string(), encrypted_signature: Some("abc".to_string()), n_param: None },
    )
    .await
    .unwrap();

    let output = clear_cache(&state, ClearCacheInput { cache_type: "all".to_string(), clear_all: false })
        .await
        .unwrap();

    assert_eq!(output.cache_count, 4);
    let mut names = output.cleared_caches.clone();
    names.sort();
    assert_eq!(names, vec!["player", "preprocessed", "solver", "sts"]);

    assert_eq!(state.caches.solver.stats().await.size, 0);
    assert_eq!(state.caches.preprocessed.stats().await.size, 0);
}

#[tokio::test]
async fn clear_cache_rejects_an_unknown_cache_type() {
    let dir = tempdir().unwrap();
    let state = seed_state(&dir);

    let result = clear_cache(&state, ClearCacheInput { cache_type: "bogus".to_string(), clear_all: false }).await;
    assert!(result.is_err());
}
