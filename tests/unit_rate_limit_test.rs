use resolver_core::config::RateLimitConfig;
use resolver_core::core::rate_limit::RateLimiter;
use std::time::Duration;

#[test]
fn requests_within_budget_all_succeed() {
    let limiter = RateLimiter::new(&RateLimitConfig { window_ms: 60_000, max_requests: 3 });
    for _ in 0..3 {
        assert!(limiter.check("1.2.3.4", "/decrypt_signature").is_ok());
    }
}

#[test]
fn the_request_over_budget_is_rejected_with_a_retry_after() {
    let limiter = RateLimiter::new(&RateLimitConfig { window_ms: 60_000, max_requests: 2 });
    assert!(limiter.check("1.2.3.4", "/decrypt_signature").is_ok());
    assert!(limiter.check("1.2.3.4", "/decrypt_signature").is_ok());

    let retry_after = limiter.check("1.2.3.4", "/decrypt_signature").unwrap_err();
    assert!(retry_after <= Duration::from_millis(60_000));
}

#[test]
fn buckets_are_keyed_independently_by_ip_and_path() {
    let limiter = RateLimiter::new(&RateLimitConfig { window_ms: 60_000, max_requests: 1 });
    assert!(limiter.check("1.2.3.4", "/decrypt_signature").is_ok());
    // A different client IP has its own budget.
    assert!(limiter.check("5.6.7.8", "/decrypt_signature").is_ok());
    // The same client IP against a different path also has its own budget.
    assert!(limiter.check("1.2.3.4", "/get_sts").is_ok());
    // But the original (ip, path) pair is now exhausted.
    assert!(limiter.check("1.2.3.4", "/decrypt_signature").is_err());
}

#[tokio::test]
async fn window_resets_after_it_elapses() {
    let limiter = RateLimiter::new(&RateLimitConfig { window_ms: 30, max_requests: 1 });
    assert!(limiter.check("1.2.3.4", "/decrypt_signature").is_ok());
    assert!(limiter.check("1.2.3.4", "/decrypt_signature").is_err());

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(limiter.check("1.2.3.4", "/decrypt_signature").is_ok());
}
