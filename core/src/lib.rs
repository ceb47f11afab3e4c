#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Margolus simulator.
//!
//! This crate defines the data that connects adapters, the authoritative
//! automaton, and the run scheduler. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then reports [`Event`] values describing what
//! changed. Rules, tables, animations and pacing knobs live here so every
//! layer agrees on their shape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod animation;
mod hex;
mod pacing;
mod rule;
mod table;

pub use animation::{Animation, AnimationStep, StepColor};
pub use hex::HexError;
pub use pacing::{
    BatchSize, Pacing, RunStatus, TickTarget, DEFAULT_MAX_UPDATE_TIME, DEFAULT_TARGET_FRAME_TIME,
    MIN_SUSPEND,
};
pub use rule::{BlockAction, BuiltinRule, Rule, BUILTIN_RULES};
pub use table::{
    pack_block, unpack_block, TableError, TransitionTable, BLOCK_STATES, BOTTOM_LEFT,
    BOTTOM_RIGHT, TOP_LEFT, TOP_RIGHT,
};

/// Commands that express all permissible automaton mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the automaton by one tick in its current direction.
    Tick,
    /// Replaces the active rule, taking effect from the next tick.
    SetRule {
        /// Rule to apply.
        rule: Rule,
    },
    /// Writes the provided cells.
    SetCells {
        /// Cells to write.
        cells: Vec<CellCoord>,
        /// Whether the cells become alive.
        enabled: bool,
    },
    /// Writes cells addressed by their row-major index.
    SetIndices {
        /// Flat indices to write.
        indices: Vec<usize>,
        /// Whether the cells become alive.
        enabled: bool,
    },
    /// Flips a single cell.
    ToggleCell {
        /// Cell to flip.
        cell: CellCoord,
    },
    /// Clears the grid and restores frame zero and forward direction.
    Reset,
    /// Replaces the grid with one of new dimensions, keeping the overlap.
    Resize {
        /// Row count of the new grid.
        rows: u32,
        /// Column count of the new grid.
        columns: u32,
    },
    /// Toggles the tick direction.
    Reverse,
    /// Sets the tick direction explicitly.
    SetReversed {
        /// Whether ticks run backward.
        reversed: bool,
    },
    /// Overrides the frame counter.
    SetFrameNumber {
        /// New frame number.
        frame: i64,
    },
    /// Resets the automaton and seeds it with random live cells.
    FillRandom {
        /// Probability that any given cell becomes alive.
        probability: f64,
        /// Seed for the deterministic generator.
        seed: u64,
    },
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A tick completed and the frame counter moved.
    FrameAdvanced {
        /// Frame number after the tick.
        frame: i64,
    },
    /// Cell contents changed outside of a tick.
    CellsChanged {
        /// Number of live cells after the change.
        live: usize,
    },
    /// The active rule changed.
    RuleChanged {
        /// Name of the new rule.
        name: String,
    },
    /// The tick direction changed.
    DirectionChanged {
        /// Whether ticks now run backward.
        reversed: bool,
    },
    /// The frame counter was overridden.
    FrameNumberChanged {
        /// New frame number.
        frame: i64,
    },
    /// The automaton was cleared back to frame zero.
    GridReset,
    /// The automaton was replaced by one of new dimensions.
    GridResized {
        /// Row count after resizing.
        rows: u32,
        /// Column count after resizing.
        columns: u32,
    },
    /// A command was rejected and left the automaton untouched.
    CommandRejected {
        /// Specific reason the command failed.
        reason: GridError,
    },
}

impl Event {
    /// Reports whether observers of the grid should be told about the event.
    #[must_use]
    pub const fn changes_grid(&self) -> bool {
        matches!(
            self,
            Self::FrameAdvanced { .. }
                | Self::CellsChanged { .. }
                | Self::GridReset
                | Self::GridResized { .. }
        )
    }
}

/// Reasons the automaton refuses a construction or mutation.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridError {
    /// Dimensions must be positive and even to tile into 2×2 blocks.
    #[error("{rows}x{columns} cannot divide into 2x2 blocks")]
    InvalidDimensions {
        /// Requested row count.
        rows: u32,
        /// Requested column count.
        columns: u32,
    },
    /// A cell coordinate fell outside the grid.
    #[error("cell ({row}, {column}) lies outside the {rows}x{columns} grid")]
    CellOutOfBounds {
        /// Offending row.
        row: u32,
        /// Offending column.
        column: u32,
        /// Row count of the grid.
        rows: u32,
        /// Column count of the grid.
        columns: u32,
    },
    /// A flat index fell outside the grid.
    #[error("cell index {index} lies outside a grid of {len} cells")]
    IndexOutOfBounds {
        /// Offending index.
        index: usize,
        /// Number of cells in the grid.
        len: usize,
    },
}

/// Location of a single grid cell expressed as row and column.
///
/// Serialises as a `[row, column]` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }
}

impl From<[u32; 2]> for CellCoord {
    fn from([row, column]: [u32; 2]) -> Self {
        Self::new(row, column)
    }
}

impl From<CellCoord> for [u32; 2] {
    fn from(cell: CellCoord) -> Self {
        [cell.row, cell.column]
    }
}

/// Snapshot of every live cell, serialised as `[[row, column], ...]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveCells {
    cells: Vec<CellCoord>,
}

impl ActiveCells {
    /// Creates a snapshot from the provided cells.
    #[must_use]
    pub fn new(cells: Vec<CellCoord>) -> Self {
        Self { cells }
    }

    /// Number of live cells captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Consumes the snapshot, yielding the underlying cells.
    #[must_use]
    pub fn into_vec(self) -> Vec<CellCoord> {
        self.cells
    }
}
