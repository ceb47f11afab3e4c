//! Named rules and the built-in rule catalogue.
//!
//! Built-in rules are declared as symbolic [`BlockAction`]s chosen from the
//! number of live cells in a block and the active partition. Each declaration
//! is compiled once into a [`TransitionTable`], which is the only form the
//! automaton evaluates.

use std::{fmt, sync::Arc};

use crate::table::{TransitionTable, BOTTOM_LEFT, BOTTOM_RIGHT, TOP_LEFT, TOP_RIGHT};

/// Bijective transformation of a single 2×2 block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockAction {
    /// Copies the block through unchanged.
    Noop,
    /// Flips all four cells.
    Invert,
    /// Rotates the block a quarter turn counterclockwise.
    Rotate90,
    /// Rotates the block a half turn.
    Rotate180,
    /// Rotates the block a quarter turn clockwise.
    Rotate270,
}

impl BlockAction {
    /// Applies the action to a packed block state.
    #[must_use]
    pub const fn apply(self, state: u8) -> u8 {
        let top_left = state & TOP_LEFT != 0;
        let top_right = state & TOP_RIGHT != 0;
        let bottom_left = state & BOTTOM_LEFT != 0;
        let bottom_right = state & BOTTOM_RIGHT != 0;
        let [tl, tr, bl, br] = match self {
            Self::Noop => [top_left, top_right, bottom_left, bottom_right],
            Self::Invert => [!top_left, !top_right, !bottom_left, !bottom_right],
            Self::Rotate90 => [top_right, bottom_right, top_left, bottom_left],
            Self::Rotate180 => [bottom_right, bottom_left, top_right, top_left],
            Self::Rotate270 => [bottom_left, top_left, bottom_right, top_right],
        };
        crate::table::pack_block(tl, tr, bl, br)
    }

    /// Action that undoes this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Rotate90 => Self::Rotate270,
            Self::Rotate270 => Self::Rotate90,
            other => other,
        }
    }
}

/// Rules that ship with the simulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinRule {
    /// Critters, in the variant that conserves the live-cell count.
    Critters,
    /// Tron, inverting every block with one to three live cells.
    Tron,
    /// Highlander.
    Highlander,
    /// Margolus' billiard-ball computer.
    BilliardBall,
    /// Schaeffer's gas rule.
    Schaeffer,
}

/// Every built-in rule in catalogue order.
pub const BUILTIN_RULES: [BuiltinRule; 5] = [
    BuiltinRule::Critters,
    BuiltinRule::Tron,
    BuiltinRule::Highlander,
    BuiltinRule::BilliardBall,
    BuiltinRule::Schaeffer,
];

impl BuiltinRule {
    /// Human-readable name shown to users.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Critters => "Critters",
            Self::Tron => "Tron",
            Self::Highlander => "Highlander",
            Self::BilliardBall => "Billiard ball",
            Self::Schaeffer => "Schaeffer",
        }
    }

    /// Looks up a built-in rule by name, ignoring case and word separators.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '_' | '-'))
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        BUILTIN_RULES.into_iter().find(|rule| {
            let candidate: String = rule
                .name()
                .chars()
                .filter(|ch| *ch != ' ')
                .map(|ch| ch.to_ascii_lowercase())
                .collect();
            candidate == normalized
        })
    }

    /// Forward action applied to a block with `state` on the given partition.
    #[must_use]
    pub const fn action(self, state: u8, even_partition: bool) -> BlockAction {
        let alive = state.count_ones();
        match (self, alive) {
            (Self::Critters, 1) if !even_partition => BlockAction::Rotate180,
            (Self::Critters, 2) => BlockAction::Invert,
            (Self::Critters, 3) if even_partition => BlockAction::Rotate180,
            (Self::Tron, 1..=3) => BlockAction::Invert,
            (Self::Highlander, 1) => BlockAction::Rotate90,
            (Self::Highlander, 2) => BlockAction::Invert,
            (Self::Highlander, 3) => BlockAction::Rotate270,
            (Self::BilliardBall, 1) => BlockAction::Rotate180,
            (Self::BilliardBall, 2) if is_diagonal_pair(state) => BlockAction::Invert,
            (Self::Schaeffer, 1 | 2) => BlockAction::Rotate180,
            _ => BlockAction::Noop,
        }
    }

    /// Compiles the symbolic declaration into a transition table.
    #[must_use]
    pub fn table(self) -> TransitionTable {
        TransitionTable::from_fn(|state, even| self.action(state, even).apply(state))
            .expect("built-in block actions are bijective")
    }
}

impl fmt::Display for BuiltinRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const fn is_diagonal_pair(state: u8) -> bool {
    state == TOP_LEFT | BOTTOM_RIGHT || state == TOP_RIGHT | BOTTOM_LEFT
}

/// Named transition rule applied by an automaton.
///
/// Tables are shared behind an [`Arc`], so cloning a rule is cheap and many
/// automata may evaluate the same table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    name: String,
    table: Arc<TransitionTable>,
}

impl Rule {
    /// Creates a rule from a name and a validated table.
    #[must_use]
    pub fn new(name: impl Into<String>, table: TransitionTable) -> Self {
        Self {
            name: name.into(),
            table: Arc::new(table),
        }
    }

    /// Creates the named built-in rule.
    #[must_use]
    pub fn builtin(kind: BuiltinRule) -> Self {
        Self::new(kind.name(), kind.table())
    }

    /// Display name of the rule.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table evaluated for every block.
    #[must_use]
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::builtin(BuiltinRule::Critters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(even: [u8; 16], odd: Option<[u8; 16]>) -> TransitionTable {
        match odd {
            Some(odd) => TransitionTable::from_arrays(even, odd),
            None => TransitionTable::new(&even, None),
        }
        .expect("literal table")
    }

    #[test]
    fn critters_matches_reference_table() {
        let expected = literal(
            [
                0b0000, 0b0001, 0b0010, 0b1100, 0b0100, 0b1010, 0b1001, 0b1110, 0b1000, 0b0110,
                0b0101, 0b1101, 0b0011, 0b1011, 0b0111, 0b1111,
            ],
            Some([
                0b0000, 0b1000, 0b0100, 0b1100, 0b0010, 0b1010, 0b1001, 0b0111, 0b0001, 0b0110,
                0b0101, 0b1011, 0b0011, 0b1101, 0b1110, 0b1111,
            ]),
        );
        assert_eq!(BuiltinRule::Critters.table(), expected);
    }

    #[test]
    fn tron_matches_reference_table() {
        let expected = literal([0, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 15], None);
        assert_eq!(BuiltinRule::Tron.table(), expected);
    }

    #[test]
    fn highlander_matches_reference_table() {
        let expected = literal(
            [
                0b0000, 0b0100, 0b0001, 0b1100, 0b1000, 0b1010, 0b1001, 0b1011, 0b0010, 0b0110,
                0b0101, 0b1110, 0b0011, 0b0111, 0b1101, 0b1111,
            ],
            None,
        );
        assert_eq!(BuiltinRule::Highlander.table(), expected);
    }

    #[test]
    fn billiard_ball_matches_reference_table() {
        let expected = literal(
            [
                0b0000, 0b1000, 0b0100, 0b0011, 0b0010, 0b0101, 0b1001, 0b0111, 0b0001, 0b0110,
                0b1010, 0b1011, 0b1100, 0b1101, 0b1110, 0b1111,
            ],
            None,
        );
        assert_eq!(BuiltinRule::BilliardBall.table(), expected);
    }

    #[test]
    fn schaeffer_matches_reference_table() {
        let expected = literal(
            [
                0b0000, 0b1000, 0b0100, 0b1100, 0b0010, 0b1010, 0b0110, 0b0111, 0b0001, 0b1001,
                0b0101, 0b1011, 0b0011, 0b1101, 0b1110, 0b1111,
            ],
            None,
        );
        assert_eq!(BuiltinRule::Schaeffer.table(), expected);
    }

    #[test]
    fn every_action_is_undone_by_its_inverse() {
        let actions = [
            BlockAction::Noop,
            BlockAction::Invert,
            BlockAction::Rotate90,
            BlockAction::Rotate180,
            BlockAction::Rotate270,
        ];
        for action in actions {
            for state in 0..16u8 {
                assert_eq!(action.inverse().apply(action.apply(state)), state, "{action:?}");
                assert_eq!(action.apply(action.inverse().apply(state)), state, "{action:?}");
            }
        }
    }

    #[test]
    fn builtin_rules_are_bijective_in_both_directions() {
        for rule in BUILTIN_RULES {
            let table = rule.table();
            for even in [true, false] {
                for state in 0..16u8 {
                    let forward = table.states(even, true)[usize::from(state)];
                    assert_eq!(table.states(even, false)[usize::from(forward)], state);
                    let backward = table.states(even, false)[usize::from(state)];
                    assert_eq!(table.states(even, true)[usize::from(backward)], state);
                }
            }
        }
    }

    #[test]
    fn highlander_reverses_quarter_turns_in_the_opposite_sense() {
        let table = BuiltinRule::Highlander.table();

        let single = TOP_LEFT;
        let moved = BuiltinRule::Highlander.action(single, true).apply(single);
        assert_eq!(moved, BOTTOM_LEFT);
        assert_eq!(BlockAction::Rotate270.apply(moved), single);
        assert_eq!(table.states(true, false)[usize::from(moved)], single);

        let triple = TOP_RIGHT | BOTTOM_LEFT | BOTTOM_RIGHT;
        let moved = BuiltinRule::Highlander.action(triple, true).apply(triple);
        assert_eq!(BlockAction::Rotate90.apply(moved), triple);
        assert_eq!(table.states(true, false)[usize::from(moved)], triple);
    }

    #[test]
    fn inverse_actions_agree_with_backward_tables() {
        // Built-in actions keep a block in the live-count class that selected
        // them, so the inverse of the action chosen for `state` undoes it.
        for rule in BUILTIN_RULES {
            let table = rule.table();
            for even in [true, false] {
                for state in 0..16u8 {
                    let backward = table.states(even, false)[usize::from(state)];
                    let undo = rule.action(state, even).inverse();
                    assert_eq!(undo.apply(state), backward, "{rule} state {state}");
                }
            }
        }
    }

    #[test]
    fn names_resolve_case_insensitively() {
        assert_eq!(BuiltinRule::from_name("critters"), Some(BuiltinRule::Critters));
        assert_eq!(BuiltinRule::from_name("billiardball"), Some(BuiltinRule::BilliardBall));
        assert_eq!(BuiltinRule::from_name("Billiard ball"), Some(BuiltinRule::BilliardBall));
        assert_eq!(BuiltinRule::from_name("billiard_ball"), Some(BuiltinRule::BilliardBall));
        assert_eq!(BuiltinRule::from_name("life"), None);
    }

    #[test]
    fn default_rule_is_critters() {
        assert_eq!(Rule::default().name(), "Critters");
        assert_eq!(Rule::default().table(), &BuiltinRule::Critters.table());
    }
}
