use resolver_core::core::cache::TieredCache;
use resolver_core::core::domain::{PlayerUrl, Sts};
use std::time::Duration;

fn fingerprint_for(raw: &str) -> resolver_core::core::domain::Fingerprint {
    let hosts = vec!["www.youtube.com".to_string()];
    PlayerUrl::parse(raw, &hosts).unwrap().fingerprint()
}

#[tokio::test]
async fn put_then_get_is_a_hit() {
    let cache: TieredCache<Sts> = TieredCache::new("sts", 10, Duration::from_secs(60));
    let key = fingerprint_for("https://www.youtube.com/s/player/abc/player.js");
    cache.put(key.clone(), Sts::new(12345).unwrap()).await;

    let hit = cache.get(&key).await;
    assert_eq!(hit.unwrap().as_decimal_string(), "12345");

    let stats = cache.stats().await;
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 0);
    assert_eq!(stats.size, 1);
}

#[tokio::test]
async fn get_on_missing_key_is_a_miss() {
    let cache: TieredCache<Sts> = TieredCache::new("sts", 10, Duration::from_secs(60));
    let key = fingerprint_for("https://www.youtube.com/s/player/missing/player.js");
    assert!(cache.get(&key).await.is_none());

    let stats = cache.stats().await;
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn expired_entry_is_evicted_on_read() {
    let cache: TieredCache<Sts> = TieredCache::new("sts", 10, Duration::from_millis(10));
    let key = fingerprint_for("https://www.youtube.com/s/player/exp/player.js");
    cache.put(key.clone(), Sts::new(1).unwrap()).await;

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(cache.get(&key).await.is_none());
    assert!(!cache.has(&key).await);
}

#[tokio::test]
async fn capacity_overflow_evicts_least_recently_used() {
    let cache: TieredCache<Sts> = TieredCache::new("solver", 2, Duration::from_secs(60));
    let a = fingerprint_for("https://www.youtube.com/s/player/a/player.js");
    let b = fingerprint_for("https://www.youtube.com/s/player/b/player.js");
    let c = fingerprint_for("https://www.youtube.com/s/player/c/player.js");

    cache.put(a.clone(), Sts::new(1).unwrap()).await;
    cache.put(b.clone(), Sts::new(2).unwrap()).await;
    // Touch `a` so `b` becomes the least-recently-used entry.
    cache.touch(&a).await;
    cache.put(c.clone(), Sts::new(3).unwrap()).await;

    assert!(cache.get(&a).await.is_some());
    assert!(cache.get(&b).await.is_none());
    assert!(cache.get(&c).await.is_some());
}

#[tokio::test]
async fn clear_empties_the_cache() {
    let cache: TieredCache<Sts> = TieredCache::new("preprocessed", 10, Duration::from_secs(60));
    let key = fingerprint_for("https://www.youtube.com/s/player/clr/player.js");
    cache.put(key.clone(), Sts::new(7).unwrap()).await;
    cache.clear().await;

    assert!(cache.get(&key).await.is_none());
    assert_eq!(cache.stats().await.size, 0);
}

#[tokio::test]
async fn sweep_expired_removes_only_stale_entries() {
    let cache: TieredCache<Sts> = TieredCache::new("sts", 10, Duration::from_millis(10));
    let stale = fingerprint_for("https://www.youtube.com/s/player/stale/player.js");
    cache.put(stale.clone(), Sts::new(1).unwrap()).await;

    tokio::time::sleep(Duration::from_millis(30)).await;

    let fresh = fingerprint_for("https://www.youtube.com/s/player/fresh/player.js");
    cache.put(fresh.clone(), Sts::new(2).unwrap()).await;

    let removed = cache.sweep_expired().await;
    assert_eq!(removed, 1);
    assert!(cache.has(&fresh).await);
}
