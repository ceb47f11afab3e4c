//! Grid-change observers.

use std::{fmt, rc::Rc};

use margolus_world::Automaton;

/// Receives the automaton after every notified change.
pub trait GridObserver {
    /// Called once per notified batch, iteration or direct mutation.
    fn grid_changed(&self, automaton: &Automaton);
}

impl<F> GridObserver for F
where
    F: Fn(&Automaton),
{
    fn grid_changed(&self, automaton: &Automaton) {
        self(automaton);
    }
}

/// Set of observers keyed by allocation identity.
#[derive(Default)]
pub(crate) struct ObserverSet {
    observers: Vec<Rc<dyn GridObserver>>,
}

impl ObserverSet {
    /// Adds an observer, returning `false` if the same allocation is present.
    pub(crate) fn add(&mut self, observer: Rc<dyn GridObserver>) -> bool {
        if self.position(&observer).is_some() {
            return false;
        }
        self.observers.push(observer);
        true
    }

    /// Removes an observer, returning `false` if it was never added.
    pub(crate) fn remove(&mut self, observer: &Rc<dyn GridObserver>) -> bool {
        match self.position(observer) {
            Some(index) => {
                let _ = self.observers.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn notify(&self, automaton: &Automaton) {
        for observer in &self.observers {
            observer.grid_changed(automaton);
        }
    }

    fn position(&self, observer: &Rc<dyn GridObserver>) -> Option<usize> {
        let target = Rc::as_ptr(observer).cast::<()>();
        self.observers
            .iter()
            .position(|existing| Rc::as_ptr(existing).cast::<()>() == target)
    }
}

impl fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverSet")
            .field("len", &self.observers.len())
            .finish()
    }
}
