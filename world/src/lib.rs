#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative automaton state for the Margolus simulator.

use margolus_core::{unpack_block, CellCoord, Command, Event, GridError, Rule, TransitionTable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

mod partition;

/// Reversible block cellular automaton on a toroidal grid.
///
/// The grid is double buffered: each tick reads `current`, writes every block
/// into `scratch`, then swaps the two buffers, so no block ever observes a
/// partially updated neighbour. Cloning deep-copies the grid along with the
/// frame, direction and rule.
#[derive(Clone, Debug)]
pub struct Automaton {
    rows: u32,
    columns: u32,
    current: Vec<bool>,
    scratch: Vec<bool>,
    frame_number: i64,
    reversed: bool,
    rule: Rule,
}

impl Automaton {
    /// Creates an empty automaton at frame zero running Critters forward.
    ///
    /// Both dimensions must be positive and even.
    pub fn new(rows: u32, columns: u32) -> Result<Self, GridError> {
        if rows == 0 || columns == 0 || rows % 2 != 0 || columns % 2 != 0 {
            return Err(GridError::InvalidDimensions { rows, columns });
        }
        let cells = cell_count(rows, columns);
        Ok(Self {
            rows,
            columns,
            current: vec![false; cells],
            scratch: vec![false; cells],
            frame_number: 0,
            reversed: false,
            rule: Rule::default(),
        })
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.current.len()
    }

    /// Frame counter; decreases while running backward.
    #[must_use]
    pub const fn frame_number(&self) -> i64 {
        self.frame_number
    }

    /// Overrides the frame counter, which also selects the next partition.
    pub fn set_frame_number(&mut self, frame: i64) {
        self.frame_number = frame;
    }

    /// Whether ticks currently run backward.
    #[must_use]
    pub const fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Sets the tick direction.
    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    /// Toggles the tick direction without touching the grid or frame.
    ///
    /// The next tick undoes the previous one.
    pub fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Rule applied on every tick.
    #[must_use]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Replaces the rule applied from the next tick onward.
    pub fn set_rule(&mut self, rule: Rule) {
        self.rule = rule;
    }

    /// Row-major view of the committed grid.
    #[must_use]
    pub fn cells(&self) -> &[bool] {
        &self.current
    }

    /// Number of live cells.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.current.iter().filter(|alive| **alive).count()
    }

    /// Writes every listed cell, or none of them if any lies outside the grid.
    pub fn set_cells(&mut self, cells: &[CellCoord], enabled: bool) -> Result<(), GridError> {
        let indices = cells
            .iter()
            .map(|&cell| {
                self.index_of(cell).ok_or(GridError::CellOutOfBounds {
                    row: cell.row(),
                    column: cell.column(),
                    rows: self.rows,
                    columns: self.columns,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        for index in indices {
            self.current[index] = enabled;
        }
        Ok(())
    }

    /// Writes every listed flat index, or none of them if any is out of range.
    pub fn set_indices(&mut self, indices: &[usize], enabled: bool) -> Result<(), GridError> {
        let len = self.current.len();
        if let Some(&index) = indices.iter().find(|&&index| index >= len) {
            return Err(GridError::IndexOutOfBounds { index, len });
        }
        for &index in indices {
            self.current[index] = enabled;
        }
        Ok(())
    }

    /// Flips one cell.
    pub fn toggle_cell(&mut self, cell: CellCoord) -> Result<(), GridError> {
        let index = self.index_of(cell).ok_or(GridError::CellOutOfBounds {
            row: cell.row(),
            column: cell.column(),
            rows: self.rows,
            columns: self.columns,
        })?;
        self.current[index] = !self.current[index];
        Ok(())
    }

    /// Clears the grid, rewinds to frame zero and runs forward. Keeps the rule.
    pub fn reset(&mut self) {
        self.current = vec![false; self.current.len()];
        self.frame_number = 0;
        self.reversed = false;
    }

    /// Resets, then makes each cell alive with probability `probability`.
    pub fn fill_random(&mut self, probability: f64, seed: u64) {
        self.reset();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for cell in &mut self.current {
            *cell = rng.gen::<f64>() < probability;
        }
    }

    /// Whether the next tick uses the even block partition.
    #[must_use]
    pub fn use_even_partition(&self) -> bool {
        (self.frame_number.rem_euclid(2) == 0) != self.reversed
    }

    /// Advances one frame in the current direction.
    pub fn tick(&mut self) {
        let even = self.use_even_partition();
        let forward = !self.reversed;
        let table: &TransitionTable = self.rule.table();
        let current = &self.current;
        let scratch = &mut self.scratch;

        partition::for_each_block(
            self.rows as usize,
            self.columns as usize,
            even,
            |[top_left, top_right, bottom_left, bottom_right]| {
                let next = table.next_block_state(
                    even,
                    forward,
                    current[top_left],
                    current[top_right],
                    current[bottom_left],
                    current[bottom_right],
                );
                let [tl, tr, bl, br] = unpack_block(next);
                scratch[top_left] = tl;
                scratch[top_right] = tr;
                scratch[bottom_left] = bl;
                scratch[bottom_right] = br;
            },
        );

        std::mem::swap(&mut self.current, &mut self.scratch);
        self.frame_number += if self.reversed { -1 } else { 1 };
    }

    /// Builds an empty automaton of new dimensions with the same rule, copying
    /// every live cell that falls inside both grids.
    pub fn copy_with_size(&self, rows: u32, columns: u32) -> Result<Self, GridError> {
        let mut resized = Self::new(rows, columns)?;
        resized.rule = self.rule.clone();
        let row_limit = self.rows.min(rows);
        let column_limit = self.columns.min(columns);
        for row in 0..row_limit {
            for column in 0..column_limit {
                let from = self.flat_index(row, column);
                if self.current[from] {
                    let to = resized.flat_index(row, column);
                    resized.current[to] = true;
                }
            }
        }
        Ok(resized)
    }

    fn index_of(&self, cell: CellCoord) -> Option<usize> {
        (cell.row() < self.rows && cell.column() < self.columns)
            .then(|| self.flat_index(cell.row(), cell.column()))
    }

    fn flat_index(&self, row: u32, column: u32) -> usize {
        row as usize * self.columns as usize + column as usize
    }
}

fn cell_count(rows: u32, columns: u32) -> usize {
    rows as usize * columns as usize
}

/// Applies the provided command to the automaton, reporting what changed.
///
/// Rejected commands leave the automaton untouched and emit
/// [`Event::CommandRejected`].
pub fn apply(automaton: &mut Automaton, command: Command, out_events: &mut Vec<Event>) {
    let outcome = match command {
        Command::Tick => {
            automaton.tick();
            out_events.push(Event::FrameAdvanced {
                frame: automaton.frame_number(),
            });
            Ok(())
        }
        Command::SetRule { rule } => {
            let name = rule.name().to_owned();
            automaton.set_rule(rule);
            out_events.push(Event::RuleChanged { name });
            Ok(())
        }
        Command::SetCells { cells, enabled } => automaton
            .set_cells(&cells, enabled)
            .map(|()| cells_changed(automaton, out_events)),
        Command::SetIndices { indices, enabled } => automaton
            .set_indices(&indices, enabled)
            .map(|()| cells_changed(automaton, out_events)),
        Command::ToggleCell { cell } => automaton
            .toggle_cell(cell)
            .map(|()| cells_changed(automaton, out_events)),
        Command::Reset => {
            automaton.reset();
            out_events.push(Event::GridReset);
            Ok(())
        }
        Command::Resize { rows, columns } => {
            automaton.copy_with_size(rows, columns).map(|resized| {
                *automaton = resized;
                out_events.push(Event::GridResized { rows, columns });
            })
        }
        Command::Reverse => {
            automaton.reverse();
            out_events.push(Event::DirectionChanged {
                reversed: automaton.is_reversed(),
            });
            Ok(())
        }
        Command::SetReversed { reversed } => {
            if automaton.is_reversed() != reversed {
                automaton.set_reversed(reversed);
                out_events.push(Event::DirectionChanged { reversed });
            }
            Ok(())
        }
        Command::SetFrameNumber { frame } => {
            automaton.set_frame_number(frame);
            out_events.push(Event::FrameNumberChanged { frame });
            Ok(())
        }
        Command::FillRandom { probability, seed } => {
            automaton.fill_random(probability, seed);
            out_events.push(Event::GridReset);
            cells_changed(automaton, out_events);
            Ok(())
        }
    };

    if let Err(reason) = outcome {
        out_events.push(Event::CommandRejected { reason });
    }
}

fn cells_changed(automaton: &Automaton, out_events: &mut Vec<Event>) {
    out_events.push(Event::CellsChanged {
        live: automaton.live_count(),
    });
}

/// Query functions that provide read-only access to the automaton.
pub mod query {
    use margolus_core::{ActiveCells, CellCoord};

    use super::Automaton;

    /// Captures every live cell in row-major order.
    #[must_use]
    pub fn active_cells(automaton: &Automaton) -> ActiveCells {
        let columns = automaton.columns();
        let cells = automaton
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(index, _)| {
                let index = index as u32;
                CellCoord::new(index / columns, index % columns)
            })
            .collect();
        ActiveCells::new(cells)
    }

    /// Renders the grid as text, one line per row.
    #[must_use]
    pub fn render_text(automaton: &Automaton, alive: char, dead: char) -> String {
        let columns = automaton.columns() as usize;
        let mut text = String::with_capacity(automaton.cell_count() + automaton.rows() as usize);
        for row in automaton.cells().chunks(columns) {
            text.extend(row.iter().map(|&cell| if cell { alive } else { dead }));
            text.push('\n');
        }
        text
    }
}
