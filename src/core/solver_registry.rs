// src/core/solver_registry.rs

//! C4 — the solver registry: single-flight pipeline from a fingerprint to a
//! built `SolversPair`, grounded directly on the teacher's
//! `CacheFetch::execute_and_stream` stampede-protection pattern (a
//! `DashMap` of `Shared<BoxFuture<...>>` with a leader/follower split on
//! `Entry::Vacant`/`Entry::Occupied`).

use crate::core::analyzer::{Extractor, Preprocessor};
use crate::core::cache::CacheRegistry;
use crate::core::domain::{Fingerprint, PlayerScript, SolversPair};
use crate::core::errors::ResolverError;
use crate::core::metrics;
use crate::core::worker_pool::WorkerPool;
use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tracing::debug;

type SharedBuild = Shared<BoxFuture<'static, Result<SolversPair, Arc<ResolverError>>>>;

/// Builds, caches, and single-flights `SolversPair` construction per
/// fingerprint (spec.md §4.4).
#[derive(Default)]
pub struct SolverRegistry {
    in_flight: DashMap<Fingerprint, SharedBuild>,
}

impl SolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the `SolversPair` for `fingerprint`, consulting the solver
    /// cache first, then single-flighting the preprocess+extract pipeline
    /// through the worker pool on a miss. Concurrent callers for the same
    /// fingerprint share one build; the leader removes the entry from the
    /// in-flight map once the build settles so a failure is never cached.
    pub async fn get_or_build(
        &self,
        fingerprint: Fingerprint,
        script: PlayerScript,
        caches: Arc<CacheRegistry>,
        workers: Arc<WorkerPool>,
        preprocessor: Arc<dyn Preprocessor>,
        extractor: Arc<dyn Extractor>,
    ) -> Result<SolversPair, ResolverError> {
        if let Some(pair) = caches.solver.get(&fingerprint).await {
            return Ok(pair);
        }

        let future_to_await = match self.in_flight.entry(fingerprint.clone()) {
            dashmap::mapref::entry::Entry::Occupied(occupied) => {
                debug!(fingerprint = %fingerprint, "solver build already in progress, awaiting shared result");
                occupied.get().clone()
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                debug!(fingerprint = %fingerprint, "this caller is the solver-build leader");
                let fingerprint_clone = fingerprint.clone();
                let caches = caches.clone();
                let workers = workers.clone();

                let build_future: BoxFuture<'static, Result<SolversPair, Arc<ResolverError>>> = async move {
                    build_pair(fingerprint_clone, script, caches, workers, preprocessor, extractor)
                        .await
                        .map_err(Arc::new)
                }
                .boxed();

                let shared = build_future.shared();
                vacant.insert(shared.clone());
                shared
            }
        };

        let result = future_to_await.await;
        self.in_flight.remove(&fingerprint);

        match result {
            Ok(pair) => {
                caches.solver.put(fingerprint, pair.clone()).await;
                metrics::SOLVER_BUILDS_TOTAL.with_label_values(&["success"]).inc();
                Ok(pair)
            }
            Err(arc_err) => {
                metrics::SOLVER_BUILDS_TOTAL.with_label_values(&["failure"]).inc();
                Err((*arc_err).clone())
            }
        }
    }

    /// Number of fingerprints currently mid-build. Exposed for `/status`.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

/// Runs the preprocess (via the worker pool, cached separately by
/// fingerprint in the "preprocessed" tier) and extract (pure, inline) steps
/// that turn a raw script into a `SolversPair`.
async fn build_pair(
    fingerprint: Fingerprint,
    script: PlayerScript,
    caches: Arc<CacheRegistry>,
    workers: Arc<WorkerPool>,
    preprocessor: Arc<dyn Preprocessor>,
    extractor: Arc<dyn Extractor>,
) -> Result<SolversPair, ResolverError> {
    let preprocessed = if let Some(cached) = caches.preprocessed.get(&fingerprint).await {
        cached
    } else {
        let preprocessed = workers
            .submit(
                move || preprocessor.preprocess(&script),
                |e| matches!(e, ResolverError::Internal(_)),
            )
            .await?;
        caches.preprocessed.put(fingerprint.clone(), preprocessed.clone()).await;
        preprocessed
    };

    extractor.extract(&preprocessed)
}
