#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Frame-budgeted run scheduler for the Margolus automaton.
//!
//! The scheduler never sleeps. A host arms a run with [`RunScheduler::run_for_ticks`],
//! [`RunScheduler::run_forever`] or [`RunScheduler::run_animation`], then calls
//! [`RunScheduler::resume`] repeatedly. Each call executes one batch (or one
//! animation iteration), notifies observers once, and reports how long the host
//! should wait before resuming again through [`Yield`].

use std::{rc::Rc, time::Duration};

use margolus_core::{Animation, AnimationStep, Pacing, RunStatus, TickTarget};
use margolus_world::Automaton;
use tracing::{debug, info};

mod clock;
mod observer;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use observer::GridObserver;
pub use session::Session;

use observer::ObserverSet;

/// What the host should do after a call to [`RunScheduler::resume`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Yield {
    /// A run is still active; resume after the given delay.
    Suspend(Duration),
    /// No run is active.
    Stopped,
}

/// Drives repeated ticks of an automaton under a frame-time budget.
#[derive(Debug, Default)]
pub struct RunScheduler {
    pacing: Pacing,
    state: RunState,
    observers: ObserverSet,
}

#[derive(Debug, Default)]
enum RunState {
    #[default]
    Stopped,
    ToTarget(TargetRun),
    Animation(AnimationRun),
}

#[derive(Debug)]
struct TargetRun {
    target: TickTarget,
    completed: u64,
}

#[derive(Debug)]
struct AnimationRun {
    steps: Vec<AnimationStep>,
    index: usize,
    step_ticks: u64,
    step_started: Duration,
}

enum Progress {
    Pending { elapsed: Duration },
    Complete,
}

impl RunScheduler {
    /// Creates a stopped scheduler with the provided pacing.
    #[must_use]
    pub fn new(pacing: Pacing) -> Self {
        Self {
            pacing,
            ..Self::default()
        }
    }

    /// Current run status.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        match self.state {
            RunState::Stopped => RunStatus::Stopped,
            RunState::ToTarget(_) => RunStatus::RunningToTarget,
            RunState::Animation(_) => RunStatus::RunningAnimation,
        }
    }

    /// Reports whether any run is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status() != RunStatus::Stopped
    }

    /// Pacing applied to every run.
    #[must_use]
    pub const fn pacing(&self) -> &Pacing {
        &self.pacing
    }

    /// Replaces the pacing; an active run picks it up on its next resume.
    pub fn set_pacing(&mut self, pacing: Pacing) {
        self.pacing = pacing;
    }

    /// Registers an observer. Adding the same allocation twice is a no-op.
    pub fn add_observer(&mut self, observer: Rc<dyn GridObserver>) -> bool {
        self.observers.add(observer)
    }

    /// Unregisters an observer previously passed to [`Self::add_observer`].
    pub fn remove_observer(&mut self, observer: &Rc<dyn GridObserver>) -> bool {
        self.observers.remove(observer)
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Invokes every observer with the automaton.
    pub fn notify(&self, automaton: &Automaton) {
        self.observers.notify(automaton);
    }

    /// Arms a run of `|ticks|` ticks, backward when `ticks` is negative.
    ///
    /// Returns `false` without changing anything if a run is already active.
    pub fn run_for_ticks(&mut self, automaton: &mut Automaton, ticks: i64) -> bool {
        self.run_to_target(automaton, TickTarget::ticks(ticks))
    }

    /// Arms a run that only ends when stopped.
    pub fn run_forever(&mut self, automaton: &mut Automaton, reversed: bool) -> bool {
        self.run_to_target(automaton, TickTarget::forever(reversed))
    }

    /// Arms a run toward `target`, setting the automaton's direction.
    pub fn run_to_target(&mut self, automaton: &mut Automaton, target: TickTarget) -> bool {
        if self.is_running() {
            return false;
        }
        automaton.set_reversed(target.is_reversed());
        info!(limit = ?target.limit(), reversed = target.is_reversed(), "run to target started");
        self.state = RunState::ToTarget(TargetRun {
            target,
            completed: 0,
        });
        true
    }

    /// Arms playback of `animation`, timing its first step from `clock`.
    ///
    /// Returns `false` if a run is active or the animation has no steps.
    pub fn run_animation<C>(&mut self, animation: &Animation, clock: &C) -> bool
    where
        C: Clock + ?Sized,
    {
        if self.is_running() || animation.is_empty() {
            return false;
        }
        info!(steps = animation.len(), "animation started");
        self.state = RunState::Animation(AnimationRun {
            steps: animation.steps().to_vec(),
            index: 0,
            step_ticks: 0,
            step_started: clock.now(),
        });
        true
    }

    /// Requests that the active run end.
    ///
    /// Takes effect at the next [`Self::resume`]; ticks already executed stay
    /// committed.
    pub fn stop_running(&mut self) {
        if self.is_running() {
            info!("run stopped");
        }
        self.state = RunState::Stopped;
    }

    /// Executes one batch or animation iteration of the active run.
    pub fn resume<C>(&mut self, automaton: &mut Automaton, clock: &C) -> Yield
    where
        C: Clock + ?Sized,
    {
        let pacing = self.pacing;
        let progress = match &mut self.state {
            RunState::Stopped => return Yield::Stopped,
            RunState::ToTarget(run) => run.advance(automaton, clock, &pacing),
            RunState::Animation(run) => run.advance(automaton, clock, &pacing),
        };
        self.observers.notify(automaton);

        match progress {
            Progress::Pending { elapsed } => Yield::Suspend(pacing.suspend_after(elapsed)),
            Progress::Complete => {
                info!(frame = automaton.frame_number(), "run complete");
                self.state = RunState::Stopped;
                Yield::Stopped
            }
        }
    }
}

impl TargetRun {
    fn advance<C>(&mut self, automaton: &mut Automaton, clock: &C, pacing: &Pacing) -> Progress
    where
        C: Clock + ?Sized,
    {
        let max_frames = pacing.batch_frame_count.limit();
        let started = clock.now();
        let mut elapsed = Duration::ZERO;
        let mut batch = 0u64;

        while !self.target.is_reached(self.completed) && max_frames.map_or(true, |max| batch < max)
        {
            automaton.tick();
            self.completed += 1;
            batch += 1;
            elapsed = clock.now().saturating_sub(started);
            if elapsed >= pacing.max_update_time {
                break;
            }
        }
        debug!(batch, completed = self.completed, ?elapsed, "batch finished");

        if self.target.is_reached(self.completed) {
            Progress::Complete
        } else {
            Progress::Pending { elapsed }
        }
    }
}

impl AnimationRun {
    fn advance<C>(&mut self, automaton: &mut Automaton, clock: &C, pacing: &Pacing) -> Progress
    where
        C: Clock + ?Sized,
    {
        let started = clock.now();
        let step = &self.steps[self.index];
        let frame_end = started + pacing.target_frame_time;
        let fraction = step.fraction_done(frame_end.saturating_sub(self.step_started));
        let target_ticks = fraction * step.tick_total() as f64;

        if automaton.rule() != step.rule() {
            automaton.set_rule(step.rule().clone());
        }
        automaton.set_reversed(step.is_reversed());

        let mut elapsed = Duration::ZERO;
        while (self.step_ticks as f64) < target_ticks {
            automaton.tick();
            self.step_ticks += 1;
            elapsed = clock.now().saturating_sub(started);
            if elapsed >= pacing.max_update_time {
                break;
            }
        }

        if self.step_ticks >= step.tick_total() {
            self.index += 1;
            self.step_ticks = 0;
            self.step_started = clock.now();
            if self.index >= self.steps.len() {
                return Progress::Complete;
            }
            let next = &self.steps[self.index];
            let color = next.color();
            let color = format!("#{:02x}{:02x}{:02x}", color.red(), color.green(), color.blue());
            info!(
                index = self.index,
                rule = next.rule().name(),
                ticks = next.tick_count(),
                color = color.as_str(),
                "animation step started"
            );
        }
        Progress::Pending { elapsed }
    }
}
