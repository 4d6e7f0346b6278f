use resolver_core::config::PlayerStoreConfig;
use resolver_core::core::domain::PlayerUrl;
use resolver_core::core::player_store::PlayerStore;
use tempfile::tempdir;

fn allowed_hosts() -> Vec<String> {
    vec!["www.youtube.com".to_string()]
}

#[tokio::test]
async fn get_or_fetch_reads_a_preseeded_script_without_network() {
    let dir = tempdir().expect("tempdir");
    let config = PlayerStoreConfig {
        path: dir.path().to_string_lossy().to_string(),
        retention_days: 14,
    };
    let store = PlayerStore::new(&config, allowed_hosts()).unwrap();
    store.ensure_root().await.unwrap();

    let player_url =
        PlayerUrl::parse("https://www.youtube.com/s/player/abc123/player.js", &allowed_hosts()).unwrap();
    let fingerprint = player_url.fingerprint();
    std::fs::write(
        dir.path().join(format!("{}.js", fingerprint.as_str())),
        "function sig_x(a) { return a; }",
    )
    .unwrap();

    let (fp, script) = store.get_or_fetch(&player_url).await.unwrap();
    assert_eq!(fp, fingerprint);
    assert!(script.contains("sig_x"));
}

#[tokio::test]
async fn get_or_fetch_rejects_a_non_allow_listed_host_without_any_network_call() {
    let dir = tempdir().expect("tempdir");
    let config = PlayerStoreConfig {
        path: dir.path().to_string_lossy().to_string(),
        retention_days: 14,
    };
    let store = PlayerStore::new(&config, allowed_hosts()).unwrap();
    store.ensure_root().await.unwrap();

    // PlayerUrl::parse already screens the host, so this variant is rejected
    // before player_store ever needs to resolve DNS or open a connection.
    let result = PlayerUrl::parse("https://evil.example.com/player/x.js", &allowed_hosts());
    assert!(result.is_err());
}

#[tokio::test]
async fn clear_all_removes_every_stored_script() {
    let dir = tempdir().expect("tempdir");
    let config = PlayerStoreConfig {
        path: dir.path().to_string_lossy().to_string(),
        retention_days: 14,
    };
    let store = PlayerStore::new(&config, allowed_hosts()).unwrap();
    store.ensure_root().await.unwrap();

    std::fs::write(dir.path().join("aaaa.js"), "x").unwrap();
    std::fs::write(dir.path().join("bbbb.js"), "y").unwrap();
    std::fs::write(dir.path().join("not-a-script.txt"), "z").unwrap();

    let removed = store.clear_all().await.unwrap();
    assert_eq!(removed, 2);

    let remaining: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(remaining, vec!["not-a-script.txt".to_string()]);
}

#[tokio::test]
async fn sweep_retention_removes_only_scripts_past_the_window() {
    let dir = tempdir().expect("tempdir");
    let config = PlayerStoreConfig {
        path: dir.path().to_string_lossy().to_string(),
        retention_days: 0,
    };
    let store = PlayerStore::new(&config, allowed_hosts()).unwrap();
    store.ensure_root().await.unwrap();

    std::fs::write(dir.path().join("stale.js"), "old").unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let removed = store.sweep_retention().await.unwrap();
    assert_eq!(removed, 1);
    assert!(!dir.path().join("stale.js").exists());
}
