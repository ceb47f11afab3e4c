//! Scripted multi-step playback.

use std::time::Duration;

use crate::rule::Rule;

/// Display colour associated with an animation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct StepColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl StepColor {
    /// Creates a new step color from byte RGB components.
    #[must_use]
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Red component of the color.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Green component of the color.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Blue component of the color.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }
}

/// One segment of an animation: a rule applied for a number of ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationStep {
    rule: Rule,
    tick_count: i64,
    duration: Duration,
    color: StepColor,
}

impl AnimationStep {
    /// Creates a step. A negative `tick_count` runs the rule backward.
    #[must_use]
    pub fn new(rule: Rule, tick_count: i64, duration: Duration, color: StepColor) -> Self {
        Self {
            rule,
            tick_count,
            duration,
            color,
        }
    }

    /// Rule active while the step runs.
    #[must_use]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Signed tick count; the sign encodes the direction.
    #[must_use]
    pub const fn tick_count(&self) -> i64 {
        self.tick_count
    }

    /// Number of ticks the step executes regardless of direction.
    #[must_use]
    pub const fn tick_total(&self) -> u64 {
        self.tick_count.unsigned_abs()
    }

    /// Whether the step runs the automaton backward.
    #[must_use]
    pub const fn is_reversed(&self) -> bool {
        self.tick_count < 0
    }

    /// Wall-clock time the step's ticks are spread across.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Display colour of the step.
    #[must_use]
    pub const fn color(&self) -> StepColor {
        self.color
    }

    /// Fraction of the step that should be complete `elapsed` after it began.
    ///
    /// Capped at `1.0`; a zero duration counts as already complete.
    #[must_use]
    pub fn fraction_done(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Same step with the direction flipped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            tick_count: self.tick_count.saturating_neg(),
            ..self.clone()
        }
    }
}

/// Ordered list of steps played back by the scheduler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Animation {
    steps: Vec<AnimationStep>,
}

impl Animation {
    /// Creates an animation from the provided steps.
    #[must_use]
    pub fn new(steps: Vec<AnimationStep>) -> Self {
        Self { steps }
    }

    /// Steps in playback order.
    #[must_use]
    pub fn steps(&self) -> &[AnimationStep] {
        &self.steps
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reports whether the animation has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Inserts a step so that it ends up at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert_step(&mut self, index: usize, step: AnimationStep) {
        self.steps.insert(index, step);
    }

    /// Removes and returns the step at `index`, if present.
    pub fn remove_step(&mut self, index: usize) -> Option<AnimationStep> {
        (index < self.steps.len()).then(|| self.steps.remove(index))
    }

    /// Animation that plays this one backward: steps in reverse order, each
    /// with its direction flipped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            steps: self.steps.iter().rev().map(AnimationStep::reversed).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::BuiltinRule;

    fn step(kind: BuiltinRule, ticks: i64, millis: u64) -> AnimationStep {
        AnimationStep::new(
            Rule::builtin(kind),
            ticks,
            Duration::from_millis(millis),
            StepColor::from_rgb(0x20, 0x40, 0x60),
        )
    }

    #[test]
    fn reversed_animation_flips_order_and_direction() {
        let animation = Animation::new(vec![
            step(BuiltinRule::Critters, 10, 1000),
            step(BuiltinRule::Tron, -4, 500),
        ]);

        let reversed = animation.reversed();
        assert_eq!(reversed.len(), 2);
        assert_eq!(reversed.steps()[0].rule().name(), "Tron");
        assert_eq!(reversed.steps()[0].tick_count(), 4);
        assert_eq!(reversed.steps()[1].rule().name(), "Critters");
        assert_eq!(reversed.steps()[1].tick_count(), -10);
        assert_eq!(reversed.reversed(), animation);
    }

    #[test]
    fn steps_can_be_inserted_and_removed_by_index() {
        let mut animation = Animation::new(vec![step(BuiltinRule::Critters, 1, 10)]);
        animation.insert_step(0, step(BuiltinRule::Schaeffer, 2, 10));
        animation.insert_step(2, step(BuiltinRule::Tron, 3, 10));

        let names: Vec<&str> = animation.steps().iter().map(|s| s.rule().name()).collect();
        assert_eq!(names, ["Schaeffer", "Critters", "Tron"]);

        let removed = animation.remove_step(1).expect("step present");
        assert_eq!(removed.rule().name(), "Critters");
        assert!(animation.remove_step(5).is_none());
        assert_eq!(animation.len(), 2);
    }

    #[test]
    fn fraction_done_is_capped_and_handles_zero_duration() {
        let timed = step(BuiltinRule::Tron, 8, 200);
        assert!((timed.fraction_done(Duration::from_millis(50)) - 0.25).abs() < 1e-9);
        assert!((timed.fraction_done(Duration::from_secs(5)) - 1.0).abs() < f64::EPSILON);

        let instant = step(BuiltinRule::Tron, 8, 0);
        assert!((instant.fraction_done(Duration::ZERO) - 1.0).abs() < f64::EPSILON);
    }
}
