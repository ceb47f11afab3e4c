//! Time sources consulted by the scheduler.

use std::{cell::Cell, time::Duration, time::Instant};

/// Monotonic time source measured from an arbitrary origin.
pub trait Clock {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Starts a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to.
///
/// Every read can optionally advance the clock by a fixed step, which lets
/// deterministic hosts and tests model ticks that take time.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
    step_per_read: Duration,
}

impl ManualClock {
    /// Creates a clock frozen at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a clock that advances by `step` after every read.
    #[must_use]
    pub fn with_step_per_read(step: Duration) -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
            step_per_read: step,
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let now = self.now.get();
        self.now.set(now + self.step_per_read);
        now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_steps_on_every_read() {
        let clock = ManualClock::with_step_per_read(Duration::from_millis(3));
        assert_eq!(clock.now(), Duration::ZERO);
        assert_eq!(clock.now(), Duration::from_millis(3));
        clock.advance(Duration::from_millis(10));
        assert_eq!(clock.now(), Duration::from_millis(16));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
