//! The pause between retry attempts.
//!
//! Production code suspends the calling task on the tokio timer. Tests swap in a sleeper
//! that returns at once, optionally recording the requested delays.

use crate::clock::ManualClock;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Suspends the calling task between retry attempts.
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Suspends the task on `tokio::time::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Returns immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    fn sleep(&self, _duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }
}

/// Test sleeper that records every requested delay.
///
/// When linked to a [`ManualClock`], each recorded sleep also advances that clock, so
/// retry delays and breaker cooldowns observe the same virtual time.
#[derive(Debug, Clone, Default)]
pub struct TrackingSleeper {
    calls: Arc<Mutex<Vec<Duration>>>,
    clock: Option<ManualClock>,
}

impl TrackingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `clock` by every recorded delay.
    pub fn linked_to(clock: ManualClock) -> Self {
        Self { calls: Arc::default(), clock: Some(clock) }
    }

    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Sum of all recorded delays.
    pub fn total(&self) -> Duration {
        self.calls().iter().sum()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Sleeper for TrackingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(duration);
        if let Some(clock) = &self.clock {
            clock.advance(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
        }
        Box::pin(async {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;

    #[tokio::test]
    async fn instant_sleeper_returns_at_once() {
        let begin = std::time::Instant::now();
        InstantSleeper.sleep(Duration::from_secs(30)).await;
        assert!(begin.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn tracking_sleeper_keeps_requested_delays() {
        let sleeper = TrackingSleeper::new();
        let shared = sleeper.clone();

        for ms in [100, 200, 400] {
            sleeper.sleep(Duration::from_millis(ms)).await;
        }

        assert_eq!(shared.calls().len(), 3);
        assert_eq!(shared.total(), Duration::from_millis(700));
        shared.clear();
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn linked_sleeper_moves_virtual_time() {
        let clock = ManualClock::new();
        let sleeper = TrackingSleeper::linked_to(clock.clone());

        sleeper.sleep(Duration::from_millis(250)).await;
        sleeper.sleep(Duration::from_millis(500)).await;

        assert_eq!(clock.now_millis(), 750);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_sleeper_waits_on_the_timer() {
        let begin = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(50)).await;
        assert!(begin.elapsed() >= Duration::from_millis(50));
    }
}
