//! Error types surfaced by the client facade.
//!
//! HTTP-level outcomes (permanent, transient, retries exhausted, breaker rejection) are data,
//! carried by [`ResponseOutcome`](crate::ResponseOutcome). `RestError` is reserved for
//! contract violations at the call that caused them, plus the convenience operations that
//! must turn a failed outcome into an error.

use crate::breaker::BreakerConfigError;
use crate::response::Failure;

/// Errors returned by [`RestClient`](crate::RestClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    /// The configured server URL could not be used as a base for requests.
    #[error("invalid base url `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The request descriptor is malformed; nothing was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Retry/breaker configuration was rejected.
    #[error(transparent)]
    Config(#[from] BreakerConfigError),

    /// The HTTP transport could not be constructed (trust store, proxy, TLS backend).
    #[error("failed to build HTTP transport: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// A convenience call (`get`, `post`) ended without a usable result.
    #[error("request failed: {0}")]
    Failed(Failure),
}

impl RestError {
    /// The failed outcome behind a [`RestError::Failed`], if any.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn config_error_is_transparent() {
        let err: RestError = BreakerConfigError::InvalidMaxAttempts { provided: 0 }.into();
        assert_eq!(err.to_string(), "max_attempts must be > 0 (got 0)");
        assert!(err.failure().is_none());
    }

    #[test]
    fn failed_exposes_failure() {
        let err = RestError::Failed(Failure::circuit_open(Duration::from_millis(1200)));
        assert!(err.failure().is_some_and(Failure::is_circuit_open));
        assert!(err.to_string().starts_with("request failed: "));
    }

    #[test]
    fn invalid_base_url_display() {
        let err = RestError::InvalidBaseUrl { url: "ftp://x".into(), reason: "bad scheme".into() };
        assert_eq!(err.to_string(), "invalid base url `ftp://x`: bad scheme");
    }
}
