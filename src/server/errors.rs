// src/server/errors.rs

//! The HTTP-facing error envelope (spec.md §6/§7).

use crate::core::errors::ResolverError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: String,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
    pub timestamp: String,
}

/// Every non-2xx response the API can produce, carrying enough to render
/// spec.md §6's error envelope.
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Option<String>,
    request_id: String,
}

impl ApiError {
    pub fn from_resolver_error(e: ResolverError, request_id: String) -> Self {
        let status = StatusCode::from_u16(e.kind().http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            code: e.code(),
            message: e.to_string(),
            details: None,
            request_id,
        }
    }

    pub fn unauthorized(message: String) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "UNAUTHORIZED",
            message,
            details: None,
            request_id: "unknown".to_string(),
        }
    }

    pub fn rate_limited(retry_after: Duration) -> Self {
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            code: "RATE_LIMITED",
            message: "rate limit exceeded".to_string(),
            details: Some(format!("retry after {}ms", retry_after.as_millis())),
            request_id: "unknown".to_string(),
        }
    }

    pub fn unsupported_media_type(message: String) -> Self {
        Self {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            code: "UNSUPPORTED_MEDIA_TYPE",
            message,
            details: None,
            request_id: "unknown".to_string(),
        }
    }

    pub fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NOT_FOUND",
            message,
            details: None,
            request_id: "unknown".to_string(),
        }
    }

    pub fn unhealthy(message: String) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "UNHEALTHY",
            message,
            details: None,
            request_id: "unknown".to_string(),
        }
    }

    pub fn with_request_id(mut self, request_id: String) -> Self {
        self.request_id = request_id;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            success: false,
            error: ErrorBody {
                error: self.message,
                code: self.code.to_string(),
                details: self.details,
                timestamp: Utc::now().to_rfc3339(),
                request_id: self.request_id,
            },
            timestamp: Utc::now().to_rfc3339(),
        };
        (self.status, Json(body)).into_response()
    }
}
