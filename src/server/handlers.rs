// src/server/handlers.rs

//! Thin axum handlers: each deserializes a request body, calls into the
//! matching `core::resolvers` function, merges in `{success,
//! processing_time_ms, timestamp}`, and records metrics/health outcome.

use super::errors::ApiError;
use super::middleware::RequestId;
use crate::core::health::HealthStatus;
use crate::core::metrics;
use crate::core::resolvers::{self, CacheHitAware, RequestContext};
use crate::core::state::ServerState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

fn request_id_of(ext: &Option<Extension<RequestId>>) -> String {
    ext.as_ref().map(|e| e.0.0.clone()).unwrap_or_else(|| "unknown".to_string())
}

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    data: T,
    processing_time_ms: u64,
    timestamp: String,
}

fn ok_response<T: Serialize>(data: T, started_at: Instant) -> axum::response::Response {
    let body = Envelope {
        success: true,
        data,
        processing_time_ms: started_at.elapsed().as_millis() as u64,
        timestamp: Utc::now().to_rfc3339(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

macro_rules! resolver_handler {
    ($name:ident, $path:literal, $module:ident, $input:ty) => {
        pub async fn $name(
            State(state): State<Arc<ServerState>>,
            ext: Option<Extension<RequestId>>,
            Json(input): Json<$input>,
        ) -> axum::response::Response {
            let request_id = request_id_of(&ext);
            let ctx = RequestContext::new(request_id.clone());
            metrics::REQUESTS_TOTAL.with_label_values(&[$path]).inc();
            let timer = metrics::REQUEST_LATENCY_SECONDS
                .with_label_values(&[$path])
                .start_timer();

            let result = resolvers::$module(&state, input).await;
            timer.observe_duration();

            match result {
                Ok(output) => {
                    state.health.record(false);
                    metrics::RESPONSES_TOTAL.with_label_values(&[$path, "200"]).inc();
                    let cache_hit = output.cache_hit();
                    let mut response = ok_response(output, ctx.started_at);
                    if let Some(hit) = cache_hit {
                        response.headers_mut().insert(
                            "x-cache-hit",
                            axum::http::HeaderValue::from_static(if hit { "true" } else { "false" }),
                        );
                    }
                    response
                }
                Err(e) => {
                    state.health.record(true);
                    metrics::ERRORS_TOTAL.with_label_values(&[e.kind().label()]).inc();
                    let status = e.kind().http_status().to_string();
                    metrics::RESPONSES_TOTAL.with_label_values(&[$path, status.as_str()]).inc();
                    error!(path = $path, error = %e, request_id = %request_id, "resolver call failed");
                    ApiError::from_resolver_error(e, request_id).into_response()
                }
            }
        }
    };
}

resolver_handler!(decrypt_signature, "/decrypt_signature", decrypt, resolvers::DecryptInput);
resolver_handler!(get_sts, "/get_sts", sts, resolvers::StsInput);
resolver_handler!(resolve_url, "/resolve_url", resolve, resolvers::ResolveInput);
resolver_handler!(batch_decrypt, "/batch_decrypt", batch, resolvers::BatchInput);
resolver_handler!(validate_signature, "/validate_signature", validate, resolvers::ValidateInput);
resolver_handler!(clear_cache, "/clear_cache", clear_cache, resolvers::ClearCacheInput);

pub async fn health(State(state): State<Arc<ServerState>>) -> axum::response::Response {
    let health_status = state.health.status();
    if health_status == HealthStatus::Unhealthy {
        return ApiError::unhealthy(format!(
            "error rate {:.1}% exceeds the unhealthy threshold",
            state.health.error_rate() * 100.0
        ))
        .into_response();
    }
    Json(json!({
        "status": health_status,
        "uptime_seconds": state.uptime_seconds(),
    }))
    .into_response()
}

pub async fn status(State(state): State<Arc<ServerState>>) -> axum::response::Response {
    let health_status = state.health.status();
    let preprocessed = state.caches.preprocessed.stats().await;
    let solver = state.caches.solver.stats().await;
    let sts = state.caches.sts.stats().await;
    let body = json!({
        "status": health_status,
        "uptime_seconds": state.uptime_seconds(),
        "in_flight_solver_builds": state.solvers.in_flight_count(),
        "error_rate": state.health.error_rate(),
        "cache_sizes": {
            "preprocessed": preprocessed.size,
            "solver": solver.size,
            "sts": sts.size,
            "player": metrics::PLAYER_STORE_FILES.get() as usize,
        },
        "cache_hit_rates": {
            "preprocessed": preprocessed.hit_rate(),
            "solver": solver.hit_rate(),
            "sts": sts.hit_rate(),
        },
    });
    let status_code = if health_status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status_code, Json(body)).into_response()
}

pub async fn metrics_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    metrics::UPTIME_SECONDS.set(state.uptime_seconds());
    let body = metrics::gather_metrics();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        body,
    )
}

pub async fn info() -> impl IntoResponse {
    Json(json!({
        "name": "resolver",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/decrypt_signature", "/get_sts", "/resolve_url",
            "/batch_decrypt", "/validate_signature", "/clear_cache",
        ],
    }))
}

pub async fn not_found() -> axum::response::Response {
    ApiError::not_found("no route matches this path".to_string()).into_response()
}
