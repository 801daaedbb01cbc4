//! Exponential backoff between retry attempts.
//!
//! Attempt semantics: attempt index `0` represents the initial call (no delay), and retries
//! start at `attempt = 1`. The first retry waits the floor ([`DEFAULT_FLOOR`], 100 ms), each
//! following retry doubles the previous delay, and every delay is capped at the configured
//! maximum. A maximum of zero disables waiting altogether.
//!
//! Example
//! ```rust
//! use std::time::Duration;
//! use restguard::Backoff;
//!
//! let backoff = Backoff::exponential(Duration::from_millis(1000));
//! assert_eq!(backoff.delay(0), Duration::ZERO); // initial call
//! assert_eq!(backoff.delay(1), Duration::from_millis(100));
//! assert_eq!(backoff.delay(2), Duration::from_millis(200));
//! assert_eq!(backoff.delay(5), Duration::from_millis(1000)); // capped
//! ```
//!
//! Overflow behavior: computations that would overflow saturate to [`MAX_BACKOFF`] (1 day).

use std::time::Duration;

/// Maximum delay used when calculations overflow (1 day).
pub const MAX_BACKOFF: Duration = Duration::from_secs(24 * 60 * 60);

/// Delay before the first retry.
pub const DEFAULT_FLOOR: Duration = Duration::from_millis(100);

/// Exponential backoff with a fixed floor and a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    floor: Duration,
    max: Duration,
}

impl Backoff {
    /// Exponential backoff starting at [`DEFAULT_FLOOR`], capped at `max`.
    pub fn exponential(max: Duration) -> Self {
        Self::with_floor(DEFAULT_FLOOR, max)
    }

    /// Exponential backoff starting at `floor`, capped at `max`.
    ///
    /// `max` may be smaller than `floor`; the cap always wins.
    pub fn with_floor(floor: Duration, max: Duration) -> Self {
        Self { floor, max: max.min(MAX_BACKOFF) }
    }

    /// The configured ceiling.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Delay to wait before `attempt` (0-based; 0 = initial call, no delay).
    pub fn delay(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(u32::MAX as usize) as u32;
        let multiplier = 2u128.saturating_pow(exponent);
        let nanos = self.floor.as_nanos().saturating_mul(multiplier);
        let delay = Duration::from_nanos(nanos.min(MAX_BACKOFF.as_nanos()) as u64);
        delay.min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_retry_waits_the_floor_then_doubles() {
        let backoff = Backoff::exponential(Duration::from_secs(60));
        let delays: Vec<u128> = (1..=5).map(|n| backoff.delay(n).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1600]);
    }

    #[test]
    fn ceiling_applies_once_reached() {
        let backoff = Backoff::exponential(Duration::from_millis(1000));
        assert_eq!(backoff.delay(4), Duration::from_millis(800));
        assert_eq!(backoff.delay(5), backoff.max());
        assert_eq!(backoff.delay(40), backoff.max());
    }

    #[test]
    fn custom_floor_doubles_too() {
        let backoff = Backoff::with_floor(Duration::from_millis(25), Duration::from_secs(1));
        assert_eq!(backoff.delay(0), Duration::ZERO);
        assert_eq!(backoff.delay(3), Duration::from_millis(100));
    }

    #[test]
    fn cap_below_floor_wins() {
        let backoff = Backoff::exponential(Duration::from_millis(30));
        assert_eq!(backoff.delay(1), Duration::from_millis(30));
        assert_eq!(backoff.delay(3), Duration::from_millis(30));
    }

    #[test]
    fn zero_cap_means_no_wait() {
        let backoff = Backoff::exponential(Duration::ZERO);
        assert_eq!(backoff.delay(1), Duration::ZERO);
        assert_eq!(backoff.delay(7), Duration::ZERO);
    }

    #[test]
    fn delays_are_non_decreasing() {
        let backoff = Backoff::exponential(Duration::from_millis(1500));
        let delays: Vec<_> = (1..20).map(|n| backoff.delay(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn very_large_attempt_saturates() {
        let backoff = Backoff::with_floor(Duration::from_secs(2), Duration::MAX);
        assert_eq!(backoff.max(), MAX_BACKOFF);
        assert_eq!(backoff.delay((u32::MAX as usize) + 10_000), MAX_BACKOFF);
    }
}
