// src/server/routes.rs

use super::handlers;
use super::middleware::{auth_middleware, rate_limit_middleware, request_id_middleware};
use crate::core::state::ServerState;
use axum::{
    middleware::from_fn,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builds the full axum application, layering request-ID tagging, tracing,
/// CORS, auth, and rate limiting around the six resolver endpoints plus the
/// observability surface (spec.md §6).
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let resolver_routes = Router::new()
        .route("/decrypt_signature", post(handlers::decrypt_signature))
        .route("/get_sts", post(handlers::get_sts))
        .route("/resolve_url", post(handlers::resolve_url))
        .route("/batch_decrypt", post(handlers::batch_decrypt))
        .route("/validate_signature", post(handlers::validate_signature))
        .route("/clear_cache", post(handlers::clear_cache))
        .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(resolver_routes)
        .route("/health", get(handlers::health))
        .route("/status", get(handlers::status))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/info", get(handlers::info))
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
