use resolver_core::config::{CachesConfig, WorkerPoolConfig};
use resolver_core::core::analyzer::{Extractor, Preprocessor};
use resolver_core::core::cache::CacheRegistry;
use resolver_core::core::domain::{PlayerUrl, PreprocessedScript, SolversPair};
use resolver_core::core::errors::ResolverError;
use resolver_core::core::solver_registry::SolverRegistry;
use resolver_core::core::worker_pool::WorkerPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Counts how many times preprocessing actually ran, so the test can assert
/// that concurrent callers for the same fingerprint share one build.
#[derive(Default)]
struct CountingAnalyzer {
    preprocess_calls: AtomicUsize,
}

impl Preprocessor for CountingAnalyzer {
    fn preprocess(&self, script: &String) -> Result<PreprocessedScript, ResolverError> {
        self.preprocess_calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(50));
        Ok(PreprocessedScript(script.clone()))
    }
}

impl Extractor for CountingAnalyzer {
    fn extract(&self, script: &PreprocessedScript) -> Result<SolversPair, ResolverError> {
        let _ = script;
        Ok(SolversPair { sig: None, n: None })
    }
}

#[tokio::test]
async fn concurrent_builds_for_the_same_fingerprint_single_flight() {
    let caches = Arc::new(CacheRegistry::new(&CachesConfig::default()));
    let (shutdown_tx, _rx) = broadcast::channel(1);
    let (workers, _handles) = WorkerPool::spawn(&WorkerPoolConfig::default(), || shutdown_tx.subscribe());
    let registry = Arc::new(SolverRegistry::new());
    let analyzer = Arc::new(CountingAnalyzer::default());

    let hosts = vec!["www.youtube.com".to_string()];
    let player_url = PlayerUrl::parse("https://www.youtube.com/s/player/shared/player.js", &hosts).unwrap();
    let fingerprint = player_url.fingerprint();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        let caches = caches.clone();
        let workers = workers.clone();
        let analyzer = analyzer.clone();
        let fingerprint = fingerprint.clone();
        handles.push(tokio::spawn(async move {
            registry
                .get_or_build(
                    fingerprint,
                    "function sig_x(a) { return a; }".to_string(),
                    caches,
                    workers,
                    analyzer.clone() as Arc<dyn Preprocessor>,
                    analyzer as Arc<dyn Extractor>,
                )
                .await
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(analyzer.preprocess_calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.in_flight_count(), 0);
}
