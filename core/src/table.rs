//! Bijective 2×2 block transition tables.

use thiserror::Error;

/// Number of distinct states a 2×2 block can take.
pub const BLOCK_STATES: usize = 16;

/// Bit set in a block state when the top-left cell is alive.
pub const TOP_LEFT: u8 = 0b1000;
/// Bit set in a block state when the top-right cell is alive.
pub const TOP_RIGHT: u8 = 0b0100;
/// Bit set in a block state when the bottom-left cell is alive.
pub const BOTTOM_LEFT: u8 = 0b0010;
/// Bit set in a block state when the bottom-right cell is alive.
pub const BOTTOM_RIGHT: u8 = 0b0001;

/// Reasons a supplied state array cannot form a transition table.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum TableError {
    /// The array did not contain exactly sixteen entries.
    #[error("state array must have length of 16, got {len}")]
    WrongLength {
        /// Length of the rejected array.
        len: usize,
    },
    /// An entry fell outside `0..16`.
    #[error("state array has value out of range at index {index}: {value}")]
    OutOfRange {
        /// Position of the offending entry.
        index: usize,
        /// Value found at that position.
        value: u8,
    },
    /// An entry repeated a value seen at an earlier index.
    #[error("state array has duplicate value at index {index}: {value}")]
    Duplicate {
        /// Position of the repeated entry.
        index: usize,
        /// Value that appeared more than once.
        value: u8,
    },
}

/// Reversible update rule for a single 2×2 block of the Margolus neighborhood.
///
/// Block states pack the four cells into a nibble with the top-left cell as the
/// most significant bit, followed by top-right, bottom-left and bottom-right.
/// The forward arrays must be permutations of `0..16`; the backward arrays are
/// their exact inverses, which is what makes every tick undoable.
///
/// A table remembers whether its odd array was declared separately. Two tables
/// with the same arrays compare unequal when only one of them declared an odd
/// array, since they encode differently.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TransitionTable {
    even_forward: [u8; BLOCK_STATES],
    even_backward: [u8; BLOCK_STATES],
    odd_forward: [u8; BLOCK_STATES],
    odd_backward: [u8; BLOCK_STATES],
    odd_declared: bool,
}

impl TransitionTable {
    /// Builds a table from the even-partition array and an optional odd one.
    ///
    /// When `odd_forward` is `None` the odd partition reuses the even array.
    pub fn new(even_forward: &[u8], odd_forward: Option<&[u8]>) -> Result<Self, TableError> {
        let even_forward = to_state_array(even_forward)?;
        match odd_forward {
            Some(odd) => Self::from_arrays(even_forward, to_state_array(odd)?),
            None => Self::build(even_forward, even_forward, false),
        }
    }

    /// Builds a table from fixed-size arrays, validating both permutations.
    ///
    /// The odd array counts as declared even when it equals the even one.
    pub fn from_arrays(
        even_forward: [u8; BLOCK_STATES],
        odd_forward: [u8; BLOCK_STATES],
    ) -> Result<Self, TableError> {
        Self::build(even_forward, odd_forward, true)
    }

    fn build(
        even_forward: [u8; BLOCK_STATES],
        odd_forward: [u8; BLOCK_STATES],
        odd_declared: bool,
    ) -> Result<Self, TableError> {
        Ok(Self {
            even_backward: invert(&even_forward)?,
            odd_backward: invert(&odd_forward)?,
            even_forward,
            odd_forward,
            odd_declared,
        })
    }

    /// Builds a table by evaluating `next` for every state on both partitions.
    ///
    /// The closure receives the current block state and whether the even
    /// partition is active. The odd array is declared only when it differs
    /// from the even one.
    pub fn from_fn(mut next: impl FnMut(u8, bool) -> u8) -> Result<Self, TableError> {
        let mut even_forward = [0; BLOCK_STATES];
        let mut odd_forward = [0; BLOCK_STATES];
        for state in 0..BLOCK_STATES as u8 {
            even_forward[usize::from(state)] = next(state, true);
            odd_forward[usize::from(state)] = next(state, false);
        }
        Self::build(even_forward, odd_forward, even_forward != odd_forward)
    }

    /// Returns the next state of a block given its four cells.
    ///
    /// `use_even_partition` and `is_forward` select one of the four stored
    /// arrays. The returned nibble uses the same bit order as the inputs.
    #[must_use]
    pub fn next_block_state(
        &self,
        use_even_partition: bool,
        is_forward: bool,
        top_left: bool,
        top_right: bool,
        bottom_left: bool,
        bottom_right: bool,
    ) -> u8 {
        let index = pack_block(top_left, top_right, bottom_left, bottom_right);
        self.states(use_even_partition, is_forward)[usize::from(index)]
    }

    /// Array consulted for the given partition and direction.
    #[must_use]
    pub fn states(&self, use_even_partition: bool, is_forward: bool) -> &[u8; BLOCK_STATES] {
        match (use_even_partition, is_forward) {
            (true, true) => &self.even_forward,
            (true, false) => &self.even_backward,
            (false, true) => &self.odd_forward,
            (false, false) => &self.odd_backward,
        }
    }

    /// Forward array applied on even-partition ticks.
    #[must_use]
    pub const fn even_forward(&self) -> &[u8; BLOCK_STATES] {
        &self.even_forward
    }

    /// Forward array applied on odd-partition ticks.
    #[must_use]
    pub const fn odd_forward(&self) -> &[u8; BLOCK_STATES] {
        &self.odd_forward
    }

    /// Reports whether the table was declared with a single array for both
    /// partitions.
    #[must_use]
    pub const fn is_parity_independent(&self) -> bool {
        !self.odd_declared
    }
}

/// Packs four cells into a block state, top-left first.
#[must_use]
pub const fn pack_block(
    top_left: bool,
    top_right: bool,
    bottom_left: bool,
    bottom_right: bool,
) -> u8 {
    (top_left as u8) << 3 | (top_right as u8) << 2 | (bottom_left as u8) << 1 | bottom_right as u8
}

/// Unpacks a block state into `[top_left, top_right, bottom_left, bottom_right]`.
#[must_use]
pub const fn unpack_block(state: u8) -> [bool; 4] {
    [
        state & TOP_LEFT != 0,
        state & TOP_RIGHT != 0,
        state & BOTTOM_LEFT != 0,
        state & BOTTOM_RIGHT != 0,
    ]
}

fn to_state_array(states: &[u8]) -> Result<[u8; BLOCK_STATES], TableError> {
    <[u8; BLOCK_STATES]>::try_from(states).map_err(|_| TableError::WrongLength {
        len: states.len(),
    })
}

fn invert(forward: &[u8; BLOCK_STATES]) -> Result<[u8; BLOCK_STATES], TableError> {
    let mut inverse = [0; BLOCK_STATES];
    let mut seen = [false; BLOCK_STATES];
    for (index, &value) in forward.iter().enumerate() {
        let slot = usize::from(value);
        if slot >= BLOCK_STATES {
            return Err(TableError::OutOfRange { index, value });
        }
        if seen[slot] {
            return Err(TableError::Duplicate { index, value });
        }
        seen[slot] = true;
        inverse[slot] = index as u8;
    }
    Ok(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWAP_PAIRS: [u8; 16] = [1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10, 13, 12, 15, 14];

    #[test]
    fn backward_arrays_invert_forward_arrays() {
        let odd: Vec<u8> = (0..16).rev().collect();
        let table = TransitionTable::new(&SWAP_PAIRS, Some(&odd)).expect("valid table");
        for state in 0..16u8 {
            for even in [true, false] {
                let forward = table.states(even, true)[usize::from(state)];
                assert_eq!(table.states(even, false)[usize::from(forward)], state);
            }
        }
    }

    #[test]
    fn odd_partition_defaults_to_even_array() {
        let table = TransitionTable::new(&SWAP_PAIRS, None).expect("valid table");
        assert_eq!(table.odd_forward(), table.even_forward());
        assert!(table.is_parity_independent());
    }

    #[test]
    fn declared_odd_array_is_kept_even_when_equal() {
        let declared = TransitionTable::new(&SWAP_PAIRS, Some(&SWAP_PAIRS)).expect("valid table");
        let shared = TransitionTable::new(&SWAP_PAIRS, None).expect("valid table");
        assert!(!declared.is_parity_independent());
        assert_eq!(declared.states(false, true), shared.states(false, true));
        assert_ne!(declared, shared);
    }

    #[test]
    fn generated_tables_declare_odd_array_only_when_it_differs() {
        let shared = TransitionTable::from_fn(|state, _| state ^ 0b0001).expect("valid table");
        assert!(shared.is_parity_independent());

        let split = TransitionTable::from_fn(|state, even| if even { state } else { 15 - state })
            .expect("valid table");
        assert!(!split.is_parity_independent());
    }

    #[test]
    fn rejects_wrong_length() {
        let error = TransitionTable::new(&[0, 1, 2], None).unwrap_err();
        assert_eq!(error, TableError::WrongLength { len: 3 });
    }

    #[test]
    fn rejects_out_of_range_value() {
        let mut states = SWAP_PAIRS;
        states[5] = 16;
        let error = TransitionTable::new(&states, None).unwrap_err();
        assert_eq!(error, TableError::OutOfRange { index: 5, value: 16 });
    }

    #[test]
    fn rejects_duplicates_in_odd_array() {
        let mut odd = SWAP_PAIRS;
        odd[9] = odd[2];
        let error = TransitionTable::new(&SWAP_PAIRS, Some(&odd)).unwrap_err();
        assert_eq!(error, TableError::Duplicate { index: 9, value: 3 });
    }

    #[test]
    fn next_block_state_packs_top_left_as_most_significant_bit() {
        let identity: Vec<u8> = (0..16).collect();
        let table = TransitionTable::new(&identity, None).expect("valid table");
        assert_eq!(table.next_block_state(true, true, true, false, false, false), 0b1000);
        assert_eq!(table.next_block_state(true, true, false, false, false, true), 0b0001);
        assert_eq!(table.next_block_state(false, false, false, true, true, false), 0b0110);
        assert_eq!(unpack_block(0b0110), [false, true, true, false]);
    }
}
