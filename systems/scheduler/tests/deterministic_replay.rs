use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use margolus_core::{
    Animation, AnimationStep, BatchSize, BuiltinRule, Command, Pacing, Rule, StepColor,
};
use margolus_system_scheduler::{ManualClock, Session, Yield};
use margolus_world::{self as world, Automaton};

#[test]
fn scheduled_replay_matches_direct_ticks() {
    let first = replay(BatchSize::Frames(3), Duration::ZERO);
    let second = replay(BatchSize::Unbounded, Duration::from_millis(4));
    let direct = direct_ticks();

    assert_eq!(first, second, "replay diverged between pacing settings");
    assert_eq!(first, direct, "scheduler diverged from direct ticks");
    assert_eq!(first.fingerprint(), direct.fingerprint());
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    frame: i64,
    reversed: bool,
    rule: String,
    cells: Vec<bool>,
}

impl ReplayOutcome {
    fn capture(automaton: &Automaton) -> Self {
        Self {
            frame: automaton.frame_number(),
            reversed: automaton.is_reversed(),
            rule: automaton.rule().name().to_owned(),
            cells: automaton.cells().to_vec(),
        }
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn seeded_automaton() -> Automaton {
    let mut automaton = Automaton::new(12, 16).expect("valid dimensions");
    let mut events = Vec::new();
    world::apply(
        &mut automaton,
        Command::FillRandom {
            probability: 0.3,
            seed: 0x0dd_ba11,
        },
        &mut events,
    );
    automaton
}

fn script() -> Animation {
    Animation::new(vec![
        AnimationStep::new(
            Rule::builtin(BuiltinRule::Schaeffer),
            9,
            Duration::from_millis(120),
            StepColor::default(),
        ),
        AnimationStep::new(
            Rule::builtin(BuiltinRule::Highlander),
            -5,
            Duration::from_millis(60),
            StepColor::default(),
        ),
    ])
}

fn replay(batch_frame_count: BatchSize, step_per_read: Duration) -> ReplayOutcome {
    let pacing = Pacing {
        batch_frame_count,
        ..Pacing::default()
    };
    let mut session = Session::new(seeded_automaton(), pacing);
    let clock = ManualClock::with_step_per_read(step_per_read);

    assert!(session.run_for_ticks(14));
    run_to_completion(&mut session, &clock);
    assert!(session.run_animation(&script(), &clock));
    run_to_completion(&mut session, &clock);

    ReplayOutcome::capture(session.automaton())
}

fn direct_ticks() -> ReplayOutcome {
    let mut automaton = seeded_automaton();
    for _ in 0..14 {
        automaton.tick();
    }
    automaton.set_rule(Rule::builtin(BuiltinRule::Schaeffer));
    for _ in 0..9 {
        automaton.tick();
    }
    automaton.set_rule(Rule::builtin(BuiltinRule::Highlander));
    automaton.set_reversed(true);
    for _ in 0..5 {
        automaton.tick();
    }
    ReplayOutcome::capture(&automaton)
}

fn run_to_completion(session: &mut Session, clock: &ManualClock) {
    for _ in 0..10_000 {
        match session.resume(clock) {
            Yield::Suspend(delay) => clock.advance(delay),
            Yield::Stopped => return,
        }
    }
    panic!("run did not finish");
}
