//! Transport seam: one HTTP attempt, no retry or breaker logic.

pub mod http;

use crate::config::Timeouts;
use crate::error::RestError;
use crate::request::Verb;
use async_trait::async_trait;
use std::fmt;
use url::Url;

pub use http::ReqwestTransport;

/// A fully resolved request, ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub verb: Verb,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    /// Only sent for verbs that carry a body.
    pub body: Option<String>,
}

/// Raw result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
    /// `Location` header, if present.
    pub location: Option<String>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), location: None }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self { status: 307, body: String::new(), location: Some(location.into()) }
    }
}

/// What went wrong below HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Connect, read or write timed out.
    Timeout,
    /// Connection refused or reset.
    Connect,
    /// Any other I/O failure.
    Io,
    /// The peer answered with something that is not valid HTTP.
    Protocol,
    /// The request could not be built.
    InvalidRequest,
}

/// Failure raised by a transport attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Executes exactly one HTTP attempt.
///
/// Implementations are shared across concurrent calls and must not keep per-call state.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn attempt(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;

    /// Apply new timeouts to subsequent attempts. Transports without timeouts ignore this.
    fn set_timeouts(&self, _timeouts: Timeouts) -> Result<(), RestError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_kind() {
        let err = TransportError::timeout("read timed out after 1000ms");
        assert_eq!(err.to_string(), "Timeout: read timed out after 1000ms");
        assert_eq!(err.kind(), TransportErrorKind::Timeout);
    }

    #[test]
    fn redirect_response_carries_location() {
        let response = TransportResponse::redirect("/elsewhere");
        assert_eq!(response.status, 307);
        assert_eq!(response.location.as_deref(), Some("/elsewhere"));
    }
}
