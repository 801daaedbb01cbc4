//! Backoff retrier for one logical request.
//!
//! Semantics:
//! - `max_attempts` counts total attempts (initial try + retries).
//! - An attempt is repeated only while [`classify::is_retryable`] holds for its outcome;
//!   success, permanent failures and breaker rejections return immediately.
//! - The delay before retry `n` is `backoff.delay(n)` with jitter applied; the sleeper
//!   suspends the calling task only.
//! - When every attempt failed transiently, the last failure comes back tagged
//!   [`FailureKind::RetriesExhausted`](crate::FailureKind::RetriesExhausted).
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use restguard::{Backoff, InstantSleeper, ResponseOutcome, Retrier};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let retrier = Retrier::builder()
//!     .max_attempts(3)
//!     .backoff(Backoff::exponential(Duration::from_millis(500)))
//!     .with_sleeper(InstantSleeper)
//!     .build()
//!     .unwrap();
//! let outcome = retrier
//!     .execute(|| async { ResponseOutcome::from_status(503, String::new(), None) })
//!     .await;
//! assert!(outcome.failure().unwrap().is_retries_exhausted());
//! # });
//! ```

use crate::classify;
use crate::response::ResponseOutcome;
use crate::{Backoff, Jitter, Sleeper, TokioSleeper};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Retries an attempt with exponential backoff.
#[derive(Debug, Clone)]
pub struct Retrier {
    max_attempts: usize,
    backoff: Backoff,
    jitter: Jitter,
    sleeper: Arc<dyn Sleeper>,
}

impl Retrier {
    /// See [`RetrierBuilder::new`] for the defaults.
    pub fn builder() -> RetrierBuilder {
        RetrierBuilder::new()
    }

    /// Parts already validated by `BreakerConfig`.
    pub(crate) fn from_parts(
        max_attempts: usize,
        max_delay: Duration,
        jitter: Jitter,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::exponential(max_delay),
            jitter,
            sleeper,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Run `attempt` until it succeeds, fails for good, or attempts run out.
    pub async fn execute<Op, Fut>(&self, mut attempt: Op) -> ResponseOutcome
    where
        Op: FnMut() -> Fut + Send,
        Fut: Future<Output = ResponseOutcome> + Send,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let outcome = attempt().await;
            if !classify::is_retryable(&outcome) {
                return outcome;
            }
            if attempts >= self.max_attempts {
                return match outcome {
                    ResponseOutcome::Failure(failure) => failure.into_exhausted(attempts).into(),
                    success => success,
                };
            }

            // First retry uses delay(1)
            let delay = self.jitter.apply(self.backoff.delay(attempts));
            tracing::warn!(
                attempt = attempts,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                reason = outcome.data(),
                "transient failure, retrying"
            );
            self.sleeper.sleep(delay).await;
        }
    }
}

/// Builder for [`Retrier`].
#[derive(Debug)]
pub struct RetrierBuilder {
    max_attempts: usize,
    backoff: Backoff,
    jitter: Jitter,
    sleeper: Arc<dyn Sleeper>,
}

/// Errors produced while building a retrier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// `max_attempts` must be > 0.
    #[error("max_attempts must be > 0 (got {0})")]
    InvalidMaxAttempts(usize),
}

impl RetrierBuilder {
    /// Three attempts, no jitter, waits capped at one second.
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::exponential(Duration::from_secs(1)),
            jitter: Jitter::None,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Set total attempts (initial + retries). Must be > 0.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the tokio timer, e.g. with [`InstantSleeper`](crate::InstantSleeper) in tests.
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Build the retrier, validating inputs.
    pub fn build(self) -> Result<Retrier, BuildError> {
        if self.max_attempts == 0 {
            return Err(BuildError::InvalidMaxAttempts(0));
        }
        Ok(Retrier {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            jitter: self.jitter,
            sleeper: self.sleeper,
        })
    }
}

impl Default for RetrierBuilder {
    fn default() -> Self {
        Self::new()
    }
}
