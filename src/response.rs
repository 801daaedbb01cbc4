//! Response model: the result of one logical request, success or classified failure.

use crate::classify::{self, FailureClass};
use crate::transport::{TransportError, TransportErrorKind, TransportResponse};
use std::fmt;
use std::time::Duration;

/// A successful HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResponse {
    status: u16,
    body: String,
}

impl RestResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response body; for a 307 redirect, the `Location` header value.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

/// Why a request did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// Retrying is futile (see [`classify::PERMANENT_STATUS_CODES`]).
    Permanent,
    /// Likely to go away on its own.
    Transient,
    /// Transient failures persisted through every attempt.
    RetriesExhausted { attempts: usize },
    /// Rejected by the open circuit without touching the network.
    CircuitOpen { remaining: Duration },
}

/// A failed outcome. Returned as data, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: FailureKind,
    message: String,
    status: Option<u16>,
    transport_kind: Option<TransportErrorKind>,
    tripped_breaker: bool,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>, status: Option<u16>) -> Self {
        Self { kind, message: message.into(), status, transport_kind: None, tripped_breaker: false }
    }

    pub fn from_status(status: u16, body: String) -> Self {
        let kind = match classify::classify_status(status) {
            FailureClass::Permanent => FailureKind::Permanent,
            FailureClass::Transient => FailureKind::Transient,
        };
        let message = if body.is_empty() { format!("HTTP {}", status) } else { body };
        Self::new(kind, message, Some(status))
    }

    pub fn from_transport_error(err: &TransportError) -> Self {
        let kind = match classify::classify_transport_error(err) {
            FailureClass::Permanent => FailureKind::Permanent,
            FailureClass::Transient => FailureKind::Transient,
        };
        Self { transport_kind: Some(err.kind()), ..Self::new(kind, err.to_string(), None) }
    }

    pub fn circuit_open(remaining: Duration) -> Self {
        Self::new(
            FailureKind::CircuitOpen { remaining },
            format!(
                "requests are not permitted for another {}ms because the last request failed",
                remaining.as_millis()
            ),
            None,
        )
    }

    /// Tag the last failure of a retry loop.
    pub(crate) fn into_exhausted(self, attempts: usize) -> Self {
        Self {
            kind: FailureKind::RetriesExhausted { attempts },
            message: format!(
                "retrying failed to complete successfully after {} attempts; last failure: {}",
                attempts, self.message
            ),
            ..self
        }
    }

    pub(crate) fn mark_tripped(&mut self) {
        self.tripped_breaker = true;
    }

    pub fn kind(&self) -> &FailureKind {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status of the last HTTP response, if one was received.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// What went wrong below HTTP, when no response was received.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        self.transport_kind
    }

    /// Transient or permanent. Exhausted retries and open-circuit rejections are transient:
    /// the same call may succeed later.
    pub fn classification(&self) -> FailureClass {
        match self.kind {
            FailureKind::Permanent => FailureClass::Permanent,
            _ => FailureClass::Transient,
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.kind == FailureKind::Permanent
    }

    pub fn is_retries_exhausted(&self) -> bool {
        matches!(self.kind, FailureKind::RetriesExhausted { .. })
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self.kind, FailureKind::CircuitOpen { .. })
    }

    /// Time left before the open circuit lets a probe through.
    pub fn remaining_wait(&self) -> Option<Duration> {
        match self.kind {
            FailureKind::CircuitOpen { remaining } => Some(remaining),
            _ => None,
        }
    }

    /// True when this failure moved the breaker from CLOSED to OPEN.
    pub fn tripped_breaker(&self) -> bool {
        self.tripped_breaker
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

/// Outcome of [`RestClient::send`](crate::RestClient::send).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Success(RestResponse),
    Failure(Failure),
}

impl ResponseOutcome {
    /// Build from a status code; a 307 takes its body from `location`.
    pub fn from_status(status: u16, body: String, location: Option<String>) -> Self {
        if !classify::is_success_status(status) {
            return ResponseOutcome::Failure(Failure::from_status(status, body));
        }
        let body = if status == 307 { location.unwrap_or_default() } else { body };
        ResponseOutcome::Success(RestResponse::new(status, body))
    }

    pub fn from_transport(result: Result<TransportResponse, TransportError>) -> Self {
        match result {
            Ok(response) => Self::from_status(response.status, response.body, response.location),
            Err(err) => ResponseOutcome::Failure(Failure::from_transport_error(&err)),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseOutcome::Success(_))
    }

    /// Status code of the last HTTP response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ResponseOutcome::Success(response) => Some(response.status),
            ResponseOutcome::Failure(failure) => failure.status,
        }
    }

    /// Body on success, failure message otherwise.
    pub fn data(&self) -> &str {
        match self {
            ResponseOutcome::Success(response) => &response.body,
            ResponseOutcome::Failure(failure) => &failure.message,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ResponseOutcome::Success(_) => None,
            ResponseOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn into_result(self) -> Result<RestResponse, Failure> {
        match self {
            ResponseOutcome::Success(response) => Ok(response),
            ResponseOutcome::Failure(failure) => Err(failure),
        }
    }
}

impl From<Failure> for ResponseOutcome {
    fn from(failure: Failure) -> Self {
        ResponseOutcome::Failure(failure)
    }
}

impl From<RestResponse> for ResponseOutcome {
    fn from(response: RestResponse) -> Self {
        ResponseOutcome::Success(response)
    }
}
