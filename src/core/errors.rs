// src/core/errors.rs

//! Defines the primary error type for the resolver pipeline.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing every failure kind the pipeline can
/// surface to a caller. Using `thiserror` gives clean `Display` impls and
/// automatic `From` conversions for the IO/HTTP errors we wrap.
#[derive(Error, Debug, Clone)]
pub enum ResolverError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream fetch failed with status {status}")]
    FetchFailed { status: u16 },

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(Arc<std::io::Error>),
}

impl ResolverError {
    /// Classifies the error into the four response-facing kinds from spec.md §7,
    /// used to pick an HTTP status code and a stable error `code` string.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolverError::Validation(_) => ErrorKind::Validation,
            ResolverError::NotFound(_) => ErrorKind::NotFound,
            ResolverError::FetchFailed { .. } | ResolverError::Upstream(_) => ErrorKind::Upstream,
            ResolverError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            ResolverError::Internal(_) | ResolverError::Io(_) => ErrorKind::Internal,
        }
    }

    /// A stable, machine-readable code for the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            ResolverError::Validation(_) => "VALIDATION_ERROR",
            ResolverError::NotFound(_) => "NOT_FOUND",
            ResolverError::FetchFailed { .. } => "FETCH_FAILED",
            ResolverError::Upstream(_) => "UPSTREAM_ERROR",
            ResolverError::ResourceExhausted(_) => "RESOURCE_EXHAUSTED",
            ResolverError::Internal(_) => "INTERNAL_ERROR",
            ResolverError::Io(_) => "INTERNAL_ERROR",
        }
    }
}

/// The coarse error category used for HTTP status mapping and metrics labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Upstream,
    ResourceExhausted,
    Internal,
}

impl ErrorKind {
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Upstream => 502,
            ErrorKind::ResourceExhausted => 429,
            ErrorKind::Internal => 500,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Upstream => "upstream",
            ErrorKind::ResourceExhausted => "resource_exhausted",
            ErrorKind::Internal => "internal",
        }
    }
}

impl From<std::io::Error> for ResolverError {
    fn from(e: std::io::Error) -> Self {
        ResolverError::Io(Arc::new(e))
    }
}

impl From<reqwest::Error> for ResolverError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            ResolverError::FetchFailed {
                status: status.as_u16(),
            }
        } else {
            ResolverError::Upstream(e.to_string())
        }
    }
}

impl From<url::ParseError> for ResolverError {
    fn from(e: url::ParseError) -> Self {
        ResolverError::Validation(format!("invalid URL: {e}"))
    }
}
