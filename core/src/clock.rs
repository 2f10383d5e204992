//! Monotonic time sources for the frame loop.

use std::time::{Duration, Instant};

/// Monotonic time source driving the loop.
///
/// Production code uses [`MonotonicClock`]; tests substitute a scripted
/// clock so pacing behavior is deterministic.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    ///
    /// Successive readings never decrease.
    fn now(&self) -> Duration;

    /// Block the calling thread for approximately `duration`.
    ///
    /// OS sleeps can overshoot; callers that need precision re-measure
    /// with [`Clock::now`] afterwards.
    fn sleep(&self, duration: Duration);
}

/// System clock backed by [`std::time::Instant`].
///
/// The origin is fixed at construction, so readings start near zero and
/// stay comfortably inside `Duration` for any realistic session.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
