// src/core/worker_pool.rs

//! C3 — the preprocessing worker pool.
//!
//! Generalizes the teacher's single-consumer task pattern
//! (`CacheRevalidationWorker`/`LazyFreeManager`, both one `mpsc::Receiver`
//! drained by one spawned task) to a fixed pool of N consumers draining a
//! shared bounded queue.

use crate::config::WorkerPoolConfig;
use crate::core::errors::ResolverError;
use crate::core::metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

/// A unit of work submitted to the pool: a thunk plus the channel the result
/// is delivered back on.
struct Job {
    task: Box<dyn FnOnce() -> Result<Box<dyn std::any::Any + Send>, ResolverError> + Send>,
    reply: oneshot::Sender<Result<Box<dyn std::any::Any + Send>, ResolverError>>,
}

/// Fixed-size pool of tokio tasks draining a bounded queue (spec.md §4.3).
/// Submission above capacity fails fast with `ResourceExhausted` rather than
/// blocking the caller — see `DESIGN.md` for this decision.
pub struct WorkerPool {
    tx: mpsc::Sender<Job>,
    timeout: Duration,
    max_retries: u32,
}

impl WorkerPool {
    /// Spawns `config.count` worker tasks, each draining the shared queue.
    /// Returns the pool handle plus the join handles, so callers can await
    /// clean shutdown alongside other background tasks.
    pub fn spawn(config: &WorkerPoolConfig, mut shutdown_rx_factory: impl FnMut() -> broadcast::Receiver<()>) -> (Arc<Self>, Vec<tokio::task::JoinHandle<()>>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let pool = Arc::new(Self {
            tx,
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
        });

        let mut handles = Vec::with_capacity(config.count);
        for worker_id in 0..config.count {
            let rx = rx.clone();
            let mut shutdown_rx = shutdown_rx_factory();
            handles.push(tokio::spawn(async move {
                debug!(worker_id, "preprocessing worker started");
                loop {
                    let job = {
                        let mut guard = rx.lock().await;
                        tokio::select! {
                            job = guard.recv() => job,
                            _ = shutdown_rx.recv() => None,
                        }
                    };
                    match job {
                        Some(job) => {
                            metrics::WORKER_ACTIVE.inc();
                            let (task, reply) = (job.task, job.reply);
                            let result = tokio::task::spawn_blocking(task)
                                .await
                                .unwrap_or_else(|e| Err(ResolverError::Internal(format!("worker task panicked: {e}"))));
                            metrics::WORKER_ACTIVE.dec();
                            let _ = reply.send(result);
                        }
                        None => {
                            debug!(worker_id, "preprocessing worker shutting down");
                            return;
                        }
                    }
                }
            }));
        }

        (pool, handles)
    }

    /// Submits a CPU-bound thunk to the pool, retrying transient failures up
    /// to `max_retries` times with a timeout per attempt (spec.md §4.3).
    /// `is_retryable` distinguishes transient errors (timeouts, worker
    /// panics) from permanent ones (malformed-script errors), matching the
    /// spec's "retries do not apply to malformed-input failures" rule.
    pub async fn submit<F, T>(&self, f: F, is_retryable: impl Fn(&ResolverError) -> bool) -> Result<T, ResolverError>
    where
        F: Fn() -> Result<T, ResolverError> + Send + Clone + 'static,
        T: Send + 'static,
    {
        let mut attempt = 0u32;
        loop {
            let started = Instant::now();
            let f = f.clone();
            let (reply_tx, reply_rx) = oneshot::channel();
            let job = Job {
                task: Box::new(move || f().map(|v| Box::new(v) as Box<dyn std::any::Any + Send>)),
                reply: reply_tx,
            };

            if self.tx.try_send(job).is_err() {
                metrics::WORKER_TASKS_TOTAL.with_label_values(&["rejected"]).inc();
                return Err(ResolverError::ResourceExhausted(
                    "preprocessing worker queue is full".to_string(),
                ));
            }

            let outcome = tokio::time::timeout(self.timeout, reply_rx).await;
            metrics::WORKER_TASK_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());

            let result = match outcome {
                Ok(Ok(Ok(boxed))) => {
                    let value = *boxed
                        .downcast::<T>()
                        .map_err(|_| ResolverError::Internal("worker result type mismatch".to_string()))?;
                    metrics::WORKER_TASKS_TOTAL.with_label_values(&["success"]).inc();
                    return Ok(value);
                }
                Ok(Ok(Err(e))) => Err(e),
                Ok(Err(_)) => Err(ResolverError::Internal("worker reply channel dropped".to_string())),
                Err(_) => Err(ResolverError::Internal(format!(
                    "preprocessing task exceeded {:?} timeout",
                    self.timeout
                ))),
            };

            let error = result.unwrap_err();
            if attempt >= self.max_retries || !is_retryable(&error) {
                metrics::WORKER_TASKS_TOTAL.with_label_values(&["failed"]).inc();
                return Err(error);
            }
            attempt += 1;
            warn!(attempt, error = %error, "retrying preprocessing task");
        }
    }
}
