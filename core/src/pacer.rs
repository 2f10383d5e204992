//! Two-phase wait to the frame boundary.
//!
//! The bulk of the remaining frame time goes to a coarse OS sleep, the
//! tail to a spin on the clock. Sleep is a scheduling courtesy and is
//! never trusted: the spin re-samples the clock and enforces the actual
//! deadline, so an overshooting sleep costs accuracy but a short one
//! costs nothing. When the OS timer granularity could not be raised,
//! sleeping at all would overshoot wildly, so the policy drops to pure
//! spinning.

use std::time::Duration;

use crate::clock::Clock;

/// How [`wait_until`] is allowed to block.
#[derive(Debug, Clone, Copy)]
pub struct SleepPolicy {
    /// Scheduler granularity, when it was successfully raised. `None`
    /// means sleeping is unreliable and the wait spins the whole way.
    pub granularity: Option<Duration>,
}

impl Default for SleepPolicy {
    fn default() -> Self {
        Self {
            granularity: Some(Duration::from_millis(1)),
        }
    }
}

impl SleepPolicy {
    /// Never sleep, only spin.
    pub fn spin_only() -> Self {
        Self { granularity: None }
    }
}

/// What one wait actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitReport {
    /// Time spent in the coarse sleep, as measured, not as requested.
    pub slept: Duration,
    /// Time spent spinning after the sleep.
    pub spun: Duration,
    /// Set when the deadline had already passed on entry. The wait does
    /// nothing in that case; the caller records the overrun and moves
    /// on.
    pub overran_by: Option<Duration>,
}

/// Block until `clock` reaches `deadline`.
///
/// Sleeps the remaining whole milliseconds if the policy allows, then
/// spins for the remainder. Returns immediately if the deadline has
/// already passed.
pub fn wait_until<C: Clock>(clock: &C, deadline: Duration, policy: SleepPolicy) -> WaitReport {
    let start = clock.now();
    if start >= deadline {
        return WaitReport {
            slept: Duration::ZERO,
            spun: Duration::ZERO,
            overran_by: Some(start - deadline),
        };
    }

    let mut after_sleep = start;
    if let Some(granule) = policy.granularity {
        let whole_ms = Duration::from_millis((deadline - start).as_millis() as u64);
        if !whole_ms.is_zero() && whole_ms >= granule {
            clock.sleep(whole_ms);
            after_sleep = clock.now();
        }
    }

    let mut end = after_sleep;
    while end < deadline {
        std::hint::spin_loop();
        end = clock.now();
    }

    WaitReport {
        slept: after_sleep - start,
        spun: end - after_sleep,
        overran_by: None,
    }
}
