//! Session facade tying the automaton, the scheduler and a rule library together.

use std::rc::Rc;

use margolus_core::{
    ActiveCells, Animation, BuiltinRule, Command, Event, HexError, Pacing, Rule, TransitionTable,
    BUILTIN_RULES,
};
use margolus_world::{self as world, query, Automaton};
use tracing::debug;

use crate::{Clock, GridObserver, RunScheduler, Yield};

/// One interactive simulation: a grid, its runner and the rules it knows.
#[derive(Debug)]
pub struct Session {
    automaton: Automaton,
    scheduler: RunScheduler,
    rules: Vec<Rule>,
}

impl Session {
    /// Wraps an existing automaton with a scheduler using `pacing`.
    ///
    /// The rule library starts with every built-in rule.
    #[must_use]
    pub fn new(automaton: Automaton, pacing: Pacing) -> Self {
        Self {
            automaton,
            scheduler: RunScheduler::new(pacing),
            rules: BUILTIN_RULES.iter().copied().map(Rule::builtin).collect(),
        }
    }

    /// Read-only view of the automaton.
    #[must_use]
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Read-only view of the scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &RunScheduler {
        &self.scheduler
    }

    /// Replaces the pacing used by subsequent batches.
    pub fn set_pacing(&mut self, pacing: Pacing) {
        self.scheduler.set_pacing(pacing);
    }

    /// Applies a command and notifies observers if the grid changed.
    pub fn apply(&mut self, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.automaton, command, &mut events);
        if events.iter().any(Event::changes_grid) {
            self.scheduler.notify(&self.automaton);
        }
        events
    }

    /// Ticks once forward, keeping the forward direction afterwards.
    pub fn step_forward(&mut self) -> Vec<Event> {
        self.step(false)
    }

    /// Ticks once backward, keeping the backward direction afterwards.
    pub fn step_backward(&mut self) -> Vec<Event> {
        self.step(true)
    }

    fn step(&mut self, reversed: bool) -> Vec<Event> {
        let mut events = self.apply(Command::SetReversed { reversed });
        events.extend(self.apply(Command::Tick));
        events
    }

    /// Arms a run of `|ticks|` ticks. See [`RunScheduler::run_for_ticks`].
    pub fn run_for_ticks(&mut self, ticks: i64) -> bool {
        self.scheduler.run_for_ticks(&mut self.automaton, ticks)
    }

    /// Arms an unbounded run. See [`RunScheduler::run_forever`].
    pub fn run_forever(&mut self, reversed: bool) -> bool {
        self.scheduler.run_forever(&mut self.automaton, reversed)
    }

    /// Arms animation playback. See [`RunScheduler::run_animation`].
    pub fn run_animation<C>(&mut self, animation: &Animation, clock: &C) -> bool
    where
        C: Clock + ?Sized,
    {
        self.scheduler.run_animation(animation, clock)
    }

    /// Ends the active run at the next resume.
    pub fn stop_running(&mut self) {
        self.scheduler.stop_running();
    }

    /// Executes one scheduler iteration.
    pub fn resume<C>(&mut self, clock: &C) -> Yield
    where
        C: Clock + ?Sized,
    {
        self.scheduler.resume(&mut self.automaton, clock)
    }

    /// Registers a grid observer.
    pub fn add_observer(&mut self, observer: Rc<dyn GridObserver>) -> bool {
        self.scheduler.add_observer(observer)
    }

    /// Unregisters a grid observer.
    pub fn remove_observer(&mut self, observer: &Rc<dyn GridObserver>) -> bool {
        self.scheduler.remove_observer(observer)
    }

    /// Captures every live cell.
    #[must_use]
    pub fn active_cells(&self) -> ActiveCells {
        query::active_cells(&self.automaton)
    }

    /// Rules known to this session, built-ins first.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Looks up a rule by exact name, falling back to built-in name matching.
    #[must_use]
    pub fn find_rule(&self, name: &str) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|rule| rule.name() == name)
            .or_else(|| {
                let builtin = BuiltinRule::from_name(name)?;
                self.rules.iter().find(|rule| rule.name() == builtin.name())
            })
    }

    /// Parses a rule from hex and adds it to the library.
    ///
    /// Without a name the hex digits themselves name the rule. A rule whose
    /// name already exists replaces the earlier entry.
    pub fn add_rule_from_hex(&mut self, hex: &str, name: Option<&str>) -> Result<Rule, HexError> {
        let table = TransitionTable::from_hex(hex)?;
        let name = match name {
            Some(name) => name.to_owned(),
            None => table.to_hex(),
        };
        let rule = Rule::new(name, table);
        match self.rules.iter_mut().find(|known| known.name() == rule.name()) {
            Some(known) => *known = rule.clone(),
            None => self.rules.push(rule.clone()),
        }
        debug!(name = rule.name(), "rule added");
        Ok(rule)
    }
}
