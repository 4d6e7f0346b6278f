// src/server/middleware.rs

//! Request-ID tagging, auth, and rate-limiting middleware for the resolver
//! HTTP surface (spec.md §4.7, §6).

use crate::core::rate_limit::is_exempt_path;
use crate::core::state::ServerState;
use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Tags every request/response pair with a request ID, generating one when
/// the caller did not supply it.
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Enforces the Bearer/Basic/raw API token check on non-exempt paths
/// (spec.md §4.7).
pub async fn auth_middleware(
    State(state): State<Arc<ServerState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, super::errors::ApiError> {
    let path = request.uri().path();
    if is_exempt_path(path) {
        return Ok(next.run(request).await);
    }
    let request_id = request_id_of(&request);

    if let Some(expected) = &state.config.api_token {
        let header_value = request
            .headers()
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if !crate::core::rate_limit::check_auth(header_value, expected) {
            return Err(super::errors::ApiError::unauthorized(
                "missing or invalid authorization".to_string(),
            )
            .with_request_id(request_id));
        }
    }

    Ok(next.run(request).await)
}

fn request_id_of(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Enforces the sliding-window rate limit keyed by client IP and path
/// (spec.md §4.7).
pub async fn rate_limit_middleware(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, super::errors::ApiError> {
    let path = request.uri().path().to_string();
    if is_exempt_path(&path) {
        return Ok(next.run(request).await);
    }
    let request_id = request_id_of(&request);

    let client_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string());

    if let Err(retry_after) = state.rate_limiter.check(&client_ip, &path) {
        warn!(client_ip = %client_ip, path = %path, "request rejected by rate limiter");
        return Err(super::errors::ApiError::rate_limited(retry_after).with_request_id(request_id));
    }

    Ok(next.run(request).await)
}
