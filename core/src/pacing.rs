//! Run pacing parameters and run-length descriptions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default wall-clock interval between visible frames.
pub const DEFAULT_TARGET_FRAME_TIME: Duration = Duration::from_millis(16);
/// Default ceiling on time spent ticking before yielding to the host.
pub const DEFAULT_MAX_UPDATE_TIME: Duration = Duration::from_millis(30);
/// Shortest suspension the scheduler ever requests.
pub const MIN_SUSPEND: Duration = Duration::from_millis(1);

/// Number of ticks executed between change notifications in target runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSize {
    /// At most this many ticks per batch; zero behaves like one.
    Frames(u32),
    /// No tick limit: batches end only on the time ceiling or the target.
    Unbounded,
}

impl BatchSize {
    /// Maximum ticks per batch, or `None` when unbounded.
    #[must_use]
    pub fn limit(self) -> Option<u64> {
        match self {
            Self::Frames(frames) => Some(u64::from(frames.max(1))),
            Self::Unbounded => None,
        }
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::Frames(1)
    }
}

/// Timing knobs shared by every run mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    /// Interval the scheduler aims to leave between notified frames.
    pub target_frame_time: Duration,
    /// Hard ceiling on ticking within a single batch or iteration.
    pub max_update_time: Duration,
    /// Ticks per notification when running to a target.
    pub batch_frame_count: BatchSize,
}

impl Pacing {
    /// Suspension requested after spending `elapsed` on a batch.
    #[must_use]
    pub fn suspend_after(&self, elapsed: Duration) -> Duration {
        self.target_frame_time.saturating_sub(elapsed).max(MIN_SUSPEND)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            target_frame_time: DEFAULT_TARGET_FRAME_TIME,
            max_update_time: DEFAULT_MAX_UPDATE_TIME,
            batch_frame_count: BatchSize::default(),
        }
    }
}

/// Direction and length of a run to a tick target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickTarget {
    reversed: bool,
    limit: Option<u64>,
}

impl TickTarget {
    /// Target of `|ticks|` ticks, run backward when `ticks` is negative.
    #[must_use]
    pub const fn ticks(ticks: i64) -> Self {
        Self {
            reversed: ticks < 0,
            limit: Some(ticks.unsigned_abs()),
        }
    }

    /// Target that is never reached.
    #[must_use]
    pub const fn forever(reversed: bool) -> Self {
        Self {
            reversed,
            limit: None,
        }
    }

    /// Whether the run ticks backward.
    #[must_use]
    pub const fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Number of ticks to run, or `None` for an endless run.
    #[must_use]
    pub const fn limit(&self) -> Option<u64> {
        self.limit
    }

    /// Reports whether `completed` ticks satisfy the target.
    #[must_use]
    pub fn is_reached(&self, completed: u64) -> bool {
        self.limit.is_some_and(|limit| completed >= limit)
    }
}

/// Run-status of the scheduler. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// No run is in progress.
    #[default]
    Stopped,
    /// Ticking toward a fixed (or endless) tick target.
    RunningToTarget,
    /// Playing back an animation.
    RunningAnimation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspension_never_drops_below_one_millisecond() {
        let pacing = Pacing::default();
        assert_eq!(pacing.suspend_after(Duration::ZERO), Duration::from_millis(16));
        assert_eq!(pacing.suspend_after(Duration::from_millis(10)), Duration::from_millis(6));
        assert_eq!(pacing.suspend_after(Duration::from_millis(16)), MIN_SUSPEND);
        assert_eq!(pacing.suspend_after(Duration::from_millis(45)), MIN_SUSPEND);
    }

    #[test]
    fn zero_frame_batches_run_a_single_tick() {
        assert_eq!(BatchSize::Frames(0).limit(), Some(1));
        assert_eq!(BatchSize::Frames(7).limit(), Some(7));
        assert_eq!(BatchSize::Unbounded.limit(), None);
    }

    #[test]
    fn tick_targets_take_direction_from_sign() {
        let backward = TickTarget::ticks(-5);
        assert!(backward.is_reversed());
        assert_eq!(backward.limit(), Some(5));
        assert!(!backward.is_reached(4));
        assert!(backward.is_reached(5));

        let endless = TickTarget::forever(false);
        assert!(!endless.is_reached(u64::MAX));
    }
}
