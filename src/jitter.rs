//! Optional randomization of retry delays.
//!
//! Retry delays are deterministic unless a client opts in. Spreading the waits helps when
//! many clients lose the same server at once and would otherwise retry in lockstep. A
//! jittered delay never exceeds the backoff delay it came from, so `max_retry_delay` stays
//! an upper bound.

use rand::{rng, Rng};
use std::time::Duration;

/// How a backoff delay is randomized before the retrier sleeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Jitter {
    /// Sleep exactly the backoff delay; successive delays never shrink.
    #[default]
    None,
    /// Anywhere in `[0, delay]`.
    Full,
    /// Anywhere in `[delay / 2, delay]`.
    Equal,
}

impl Jitter {
    pub fn apply(&self, delay: Duration) -> Duration {
        self.apply_with_rng(delay, &mut rng())
    }

    /// Like [`Jitter::apply`] with a caller-supplied RNG, for reproducible delays.
    pub fn apply_with_rng<R: Rng>(&self, delay: Duration, rng: &mut R) -> Duration {
        let ceiling = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        let floor = match self {
            Jitter::None => return delay,
            _ if ceiling == 0 => return Duration::ZERO,
            Jitter::Full => 0,
            Jitter::Equal => ceiling / 2,
        };
        Duration::from_millis(rng.random_range(floor..=ceiling))
    }
}
