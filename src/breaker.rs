//! Retry circuit breaker: decides per logical request whether to attempt once, retry with
//! backoff, or reject.
//!
//! # States
//! - **Off**: every request is a single bare attempt; nothing is ever recorded.
//! - **Closed**: requests go through the [`Retrier`]. Exhausting the retries (or hitting a
//!   permanent transport fault) opens the circuit.
//! - **Open**: requests are rejected without touching the transport until `open_duration`
//!   has elapsed since the circuit opened. Then exactly one bare probe is let through:
//!   success closes the circuit, failure restarts the cooldown.
//!
//! State and the time the circuit opened are read and written together under one lock, so
//! every transition is atomic. The lock is never held across an await; probes are
//! serialized by a separate async gate, and a caller that waited for the gate re-reads the
//! state before doing anything.
//!
//! Enabling or disabling bumps a generation counter. Calls that started under an older
//! generation finish normally but their outcome no longer moves the state.

use crate::clock::{Clock, MonotonicClock};
use crate::response::{FailureKind, ResponseOutcome};
use crate::retry::Retrier;
use crate::transport::TransportErrorKind;
use crate::{Failure, Jitter, Sleeper, TokioSleeper, MAX_BACKOFF};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Upper bound for the open-state cooldown (1 day).
pub const MAX_OPEN_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Current mode of the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Retry and breaker logic disabled.
    Off,
    /// Retrying normally.
    Closed,
    /// Tripped; rejecting until the cooldown elapses.
    Open,
}

/// Validated retry/breaker parameters. Immutable; changing them means enabling again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    max_attempts: usize,
    max_retry_delay: Duration,
    open_duration: Duration,
}

/// Invalid breaker parameters or state change requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BreakerConfigError {
    /// At least one attempt is required.
    #[error("max_attempts must be > 0 (got {provided})")]
    InvalidMaxAttempts { provided: usize },
    #[error("max_retry_delay must not exceed {max:?} (got {provided:?})")]
    RetryDelayTooLarge { provided: Duration, max: Duration },
    #[error("open_duration must not exceed {max:?} (got {provided:?})")]
    OpenDurationTooLarge { provided: Duration, max: Duration },
    /// `disable` was called while the breaker was already off.
    #[error("retry circuit breaker is already disabled")]
    AlreadyDisabled,
}

impl BreakerConfig {
    pub fn new(
        max_attempts: usize,
        max_retry_delay: Duration,
        open_duration: Duration,
    ) -> Result<Self, BreakerConfigError> {
        if max_attempts == 0 {
            return Err(BreakerConfigError::InvalidMaxAttempts { provided: max_attempts });
        }
        if max_retry_delay > MAX_BACKOFF {
            return Err(BreakerConfigError::RetryDelayTooLarge {
                provided: max_retry_delay,
                max: MAX_BACKOFF,
            });
        }
        if open_duration > MAX_OPEN_DURATION {
            return Err(BreakerConfigError::OpenDurationTooLarge {
                provided: open_duration,
                max: MAX_OPEN_DURATION,
            });
        }
        Ok(Self { max_attempts, max_retry_delay, open_duration })
    }

    /// Same as [`BreakerConfig::new`] with millisecond arguments.
    pub fn from_millis(
        max_attempts: usize,
        max_retry_delay_ms: u64,
        open_duration_ms: u64,
    ) -> Result<Self, BreakerConfigError> {
        Self::new(
            max_attempts,
            Duration::from_millis(max_retry_delay_ms),
            Duration::from_millis(open_duration_ms),
        )
    }

    /// Total attempts per request while closed.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Ceiling for the wait between attempts.
    pub fn max_retry_delay(&self) -> Duration {
        self.max_retry_delay
    }

    /// How long the circuit stays open before a probe.
    pub fn open_duration(&self) -> Duration {
        self.open_duration
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    config: Option<BreakerConfig>,
    opened_at_millis: u64,
    generation: u64,
}

#[derive(Debug)]
struct Shared {
    inner: Mutex<BreakerState>,
    probe_gate: tokio::sync::Mutex<()>,
}

/// What to do with the next request.
enum Route {
    Bare,
    Retry { config: BreakerConfig, generation: u64 },
    Reject { remaining: Duration },
    Probe { opened_at: u64, generation: u64 },
}

/// Retry circuit breaker guarding one client.
///
/// Clones share the same state via `Arc`, so all handles observe and affect the same
/// circuit lifecycle.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    jitter: Jitter,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitBreaker {
    /// A breaker in the `Off` state.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(BreakerState {
                    state: CircuitState::Off,
                    config: None,
                    opened_at_millis: 0,
                    generation: 0,
                }),
                probe_gate: tokio::sync::Mutex::new(()),
            }),
            clock: Arc::new(MonotonicClock::default()),
            sleeper: Arc::new(TokioSleeper),
            jitter: Jitter::None,
        }
    }

    /// Override the clock (useful for deterministic tests).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Override how the retrier waits between attempts.
    pub fn with_sleeper<S: Sleeper + 'static>(mut self, sleeper: S) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // Every critical section leaves the state consistent, so a poisoned lock is usable.
        self.shared.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Active configuration, `None` while off.
    pub fn config(&self) -> Option<BreakerConfig> {
        self.lock().config
    }

    /// Switch to `Closed` with `config`, from any state.
    pub fn enable(&self, config: BreakerConfig) {
        let mut inner = self.lock();
        let previous = inner.state;
        inner.state = CircuitState::Closed;
        inner.config = Some(config);
        inner.opened_at_millis = 0;
        inner.generation = inner.generation.wrapping_add(1);
        tracing::info!(
            ?previous,
            max_attempts = config.max_attempts,
            max_retry_delay_ms = config.max_retry_delay.as_millis() as u64,
            open_duration_ms = config.open_duration.as_millis() as u64,
            "Retry circuit breaker → closed"
        );
    }

    /// Switch to `Off`, discarding all bookkeeping. Errors if already off.
    pub fn disable(&self) -> Result<(), BreakerConfigError> {
        let mut inner = self.lock();
        if inner.state == CircuitState::Off {
            return Err(BreakerConfigError::AlreadyDisabled);
        }
        let previous = inner.state;
        inner.state = CircuitState::Off;
        inner.config = None;
        inner.opened_at_millis = 0;
        inner.generation = inner.generation.wrapping_add(1);
        tracing::info!(?previous, "Retry circuit breaker → off");
        Ok(())
    }

    fn route(&self) -> Route {
        let inner = self.lock();
        match (inner.state, inner.config) {
            (CircuitState::Closed, Some(config)) => {
                Route::Retry { config, generation: inner.generation }
            }
            (CircuitState::Open, Some(config)) => {
                let elapsed = self.clock.now_millis().saturating_sub(inner.opened_at_millis);
                let open_for = config.open_duration.as_millis() as u64;
                if elapsed < open_for {
                    Route::Reject { remaining: Duration::from_millis(open_for - elapsed) }
                } else {
                    Route::Probe { opened_at: inner.opened_at_millis, generation: inner.generation }
                }
            }
            _ => Route::Bare,
        }
    }

    /// Still the same open period, and it has run out.
    fn probe_still_due(&self, opened_at: u64, generation: u64) -> bool {
        let inner = self.lock();
        let open_for = inner.config.map(|c| c.open_duration.as_millis() as u64).unwrap_or(0);
        inner.state == CircuitState::Open
            && inner.generation == generation
            && inner.opened_at_millis == opened_at
            && self.clock.now_millis().saturating_sub(opened_at) >= open_for
    }

    /// Run one logical request through the breaker.
    ///
    /// `attempt` performs a single transport attempt; it is called once while off or
    /// probing, up to `max_attempts` times while closed, and never while rejecting.
    ///
    /// A caller that finds the cooldown over while another probe is in flight waits for
    /// that probe to finish (up to its transport timeout) before being routed.
    pub async fn dispatch<Op, Fut>(&self, mut attempt: Op) -> ResponseOutcome
    where
        Op: FnMut() -> Fut + Send,
        Fut: Future<Output = ResponseOutcome> + Send,
    {
        loop {
            match self.route() {
                Route::Bare => return attempt().await,
                Route::Retry { config, generation } => {
                    let retrier = Retrier::from_parts(
                        config.max_attempts,
                        config.max_retry_delay,
                        self.jitter,
                        self.sleeper.clone(),
                    );
                    let outcome = retrier.execute(&mut attempt).await;
                    return self.after_retries(outcome, generation);
                }
                Route::Reject { remaining } => {
                    tracing::debug!(
                        remaining_ms = remaining.as_millis() as u64,
                        "Retry circuit breaker open, request rejected"
                    );
                    return Failure::circuit_open(remaining).into();
                }
                Route::Probe { opened_at, generation } => {
                    let _gate = self.shared.probe_gate.lock().await;
                    if !self.probe_still_due(opened_at, generation) {
                        // Someone else probed or reconfigured while we waited.
                        continue;
                    }
                    tracing::debug!("Retry circuit breaker cooldown elapsed, probing");
                    let outcome = attempt().await;
                    return self.after_probe(outcome, generation);
                }
            }
        }
    }

    fn after_retries(&self, mut outcome: ResponseOutcome, generation: u64) -> ResponseOutcome {
        let mut inner = self.lock();
        if inner.generation != generation || inner.state != CircuitState::Closed {
            return outcome;
        }
        if let ResponseOutcome::Failure(failure) = &mut outcome {
            let trips = match failure.kind() {
                FailureKind::RetriesExhausted { .. } => true,
                // A permanent fault below HTTP; a permanent status is a healthy server's answer
                // and a request the transport refused to build is the caller's mistake.
                FailureKind::Permanent => {
                    failure.status().is_none()
                        && failure.transport_kind() != Some(TransportErrorKind::InvalidRequest)
                }
                _ => false,
            };
            if trips {
                inner.state = CircuitState::Open;
                inner.opened_at_millis = self.clock.now_millis();
                failure.mark_tripped();
                tracing::error!(
                    attempts = inner.config.map(|c| c.max_attempts).unwrap_or_default(),
                    reason = failure.message(),
                    "Retry circuit breaker → open"
                );
            }
        }
        outcome
    }

    fn after_probe(&self, outcome: ResponseOutcome, generation: u64) -> ResponseOutcome {
        let mut inner = self.lock();
        if inner.generation != generation || inner.state != CircuitState::Open {
            return outcome;
        }
        if outcome.is_ok() {
            inner.state = CircuitState::Closed;
            inner.opened_at_millis = 0;
            tracing::info!("Retry circuit breaker probe succeeded → closed");
        } else {
            inner.opened_at_millis = self.clock.now_millis();
            tracing::warn!(reason = outcome.data(), "Retry circuit breaker probe failed → open");
        }
        outcome
    }
}
