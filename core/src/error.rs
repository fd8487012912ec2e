//! Error types for request composition and execution.
//!
//! # Design
//! Transport-level failures (`Transport`, `Timeout`) fail every call no matter
//! which tier issued it. `HttpStatus` is only produced by the classified tier
//! and keeps the complete response so callers can inspect headers and body.
//! The remaining variants cover URL input that cannot be composed at all.

use thiserror::Error;

use crate::http::HttpResponse;

#[derive(Debug, Error)]
pub enum PlugError {
    /// The base URL string could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The URL has no path to append segments to (e.g. `mailto:`).
    #[error("url cannot carry path segments: {0}")]
    NotHierarchical(String),

    /// The host passed to `with_host` was rejected.
    #[error("invalid host: {0}")]
    InvalidHost(String),

    /// The network call could not complete.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The configured timeout elapsed before a response arrived.
    #[error("request timed out")]
    Timeout,

    /// The classifier rejected a completed response.
    #[error("HTTP {status}")]
    HttpStatus {
        status: u16,
        response: Box<HttpResponse>,
    },
}

impl PlugError {
    /// Status code of a rejected response, if this is `HttpStatus`.
    pub fn status(&self) -> Option<u16> {
        match self {
            PlugError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The rejected response, if this is `HttpStatus`.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            PlugError::HttpStatus { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }
}
