//! Collector API error types.
//!
//! The delivery worker needs to tell four situations apart:
//!
//! - **Connection** failures (refused, timeout) demote the connectivity state
//!   machine and leave the in-flight item queued.
//! - **BadRequest** (HTTP 400) is a permanent rejection: the item can never
//!   succeed and must not block the queue.
//! - **Server** (HTTP 5xx) is transient on the collector's side: retry the
//!   same item after a short pause.
//! - **Other** failures are treated as non-retryable to guarantee forward
//!   progress.

use std::fmt;
use thiserror::Error;

/// The kind of API error, categorized for delivery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Connection refused, connect timeout, or read timeout.
    Connection,

    /// HTTP 400: the collector permanently rejected the payload.
    BadRequest,

    /// HTTP 5xx: transient collector-side failure.
    Server,

    /// Anything else (unexpected statuses, protocol errors, body decode).
    Other,
}

impl ApiErrorKind {
    /// True if retrying the same request can eventually succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ApiErrorKind::Connection | ApiErrorKind::Server)
    }
}

/// Categorizes a failure from its HTTP status and connection-level flag.
pub(crate) fn classify(status: Option<u16>, is_connection: bool) -> ApiErrorKind {
    if is_connection {
        return ApiErrorKind::Connection;
    }
    match status {
        Some(400) => ApiErrorKind::BadRequest,
        Some(code) if (500..600).contains(&code) => ApiErrorKind::Server,
        _ => ApiErrorKind::Other,
    }
}

/// A collector API error with categorization for delivery decisions.
#[derive(Debug, Error)]
pub struct ApiError {
    /// The kind of error (see [`ApiErrorKind`]).
    pub kind: ApiErrorKind,

    /// The HTTP status code, if the request got far enough to have one.
    pub status_code: Option<u16>,

    /// A human-readable description.
    pub message: String,

    /// The underlying transport error, if any.
    #[source]
    pub source: Option<reqwest::Error>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "collector API error (HTTP {}): {}", code, self.message),
            None => write!(f, "collector API error: {}", self.message),
        }
    }
}

impl ApiError {
    /// Categorizes a reqwest error.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let status_code = err.status().map(|s| s.as_u16());
        let is_connection = err.is_connect() || err.is_timeout();
        ApiError {
            kind: classify(status_code, is_connection),
            status_code,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Creates a connection-level error without a transport source.
    pub fn connection(message: impl Into<String>) -> Self {
        ApiError {
            kind: ApiErrorKind::Connection,
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error for an HTTP status without a transport source.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        ApiError {
            kind: classify(Some(code), false),
            status_code: Some(code),
            message: message.into(),
            source: None,
        }
    }

    /// True for connection refused / timeout failures.
    pub fn is_connection(&self) -> bool {
        self.kind == ApiErrorKind::Connection
    }
}
