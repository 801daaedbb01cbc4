//! Failure classification: which outcomes are worth another attempt.
//!
//! The policy biases toward retrying. Only a short, fixed list of status codes is known to
//! be futile to repeat; every other failing status and nearly every transport error is
//! treated as transient.

use crate::response::{FailureKind, ResponseOutcome};
use crate::transport::{TransportError, TransportErrorKind};

/// Status codes the client must not retry. Kept sorted for `binary_search`.
pub const PERMANENT_STATUS_CODES: [u16; 7] = [400, 401, 403, 404, 410, 415, 501];

/// Whether a failure may go away on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    Transient,
    Permanent,
}

/// 2xx, and 307 whose `Location` stands in for the body.
pub fn is_success_status(status: u16) -> bool {
    status / 100 == 2 || status == 307
}

pub fn classify_status(status: u16) -> FailureClass {
    if PERMANENT_STATUS_CODES.binary_search(&status).is_ok() {
        FailureClass::Permanent
    } else {
        FailureClass::Transient
    }
}

/// Only protocol violations and requests the transport refused to build are permanent.
pub fn classify_transport_error(err: &TransportError) -> FailureClass {
    match err.kind() {
        TransportErrorKind::Protocol | TransportErrorKind::InvalidRequest => FailureClass::Permanent,
        TransportErrorKind::Timeout | TransportErrorKind::Connect | TransportErrorKind::Io => {
            FailureClass::Transient
        }
    }
}

/// The single retry predicate used by the retrier.
pub fn is_retryable(outcome: &ResponseOutcome) -> bool {
    matches!(outcome, ResponseOutcome::Failure(f) if f.kind() == &FailureKind::Transient)
}
