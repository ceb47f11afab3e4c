//! Margolus block partitions over a toroidal grid.

/// Visits every 2×2 block of one partition, passing the flat indices of its
/// top-left, top-right, bottom-left and bottom-right cells.
///
/// The even partition aligns blocks to `(0, 0)`. The odd partition is offset by
/// one row and one column: interior blocks are visited first, then the blocks
/// wrapping from the last row to the first, from the last column to the first,
/// and finally the single block straddling all four corners. Wrap partners are
/// found by subtracting the dimension rather than by per-cell modulo.
///
/// `rows` and `columns` must be positive and even.
pub(crate) fn for_each_block<F>(rows: usize, columns: usize, even: bool, mut visit: F)
where
    F: FnMut([usize; 4]),
{
    if even {
        for row in (0..rows).step_by(2) {
            let row_offset = row * columns;
            for column in (0..columns).step_by(2) {
                let offset = row_offset + column;
                visit([offset, offset + 1, offset + columns, offset + columns + 1]);
            }
        }
        return;
    }

    for row in (1..rows - 1).step_by(2) {
        let row_offset = row * columns;
        for column in (1..columns - 1).step_by(2) {
            let offset = row_offset + column;
            visit([offset, offset + 1, offset + columns, offset + columns + 1]);
        }
    }

    // Bottom row wrapping to the top.
    let last_row_offset = columns * (rows - 1);
    for column in (1..columns - 1).step_by(2) {
        visit([
            last_row_offset + column,
            last_row_offset + column + 1,
            column,
            column + 1,
        ]);
    }

    // Right edge wrapping to the left.
    for row in (1..rows - 1).step_by(2) {
        let row_offset = row * columns;
        visit([
            row_offset + columns - 1,
            row_offset,
            row_offset + 2 * columns - 1,
            row_offset + columns,
        ]);
    }

    visit([rows * columns - 1, (rows - 1) * columns, columns - 1, 0]);
}
