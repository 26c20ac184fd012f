use crate::grid::Grid;
use crate::types::Cell;

/// Line-of-sight test with a square range gate. Walls and out-of-bounds cells
/// on the Bresenham line (endpoints included) block sight.
pub fn can_see(grid: &Grid, from: Cell, to: Cell, max_range: i32) -> bool {
    if (from.row - to.row).abs() > max_range || (from.col - to.col).abs() > max_range {
        return false;
    }

    // Always trace from the smaller endpoint so a->b and b->a walk the same cells.
    let (start, end) = if from <= to { (from, to) } else { (to, from) };
    line_cells(start, end).all(|cell| grid.is_open(cell))
}

fn line_cells(start: Cell, end: Cell) -> impl Iterator<Item = Cell> {
    let dx = (end.col - start.col).abs();
    let dy = -(end.row - start.row).abs();
    let sx = if start.col < end.col { 1 } else { -1 };
    let sy = if start.row < end.row { 1 } else { -1 };

    let mut cursor = Some(start);
    let mut err = dx + dy;
    std::iter::from_fn(move || {
        let current = cursor?;
        cursor = if current == end {
            None
        } else {
            let mut next = current;
            let doubled = 2 * err;
            if doubled >= dy {
                err += dy;
                next.col += sx;
            }
            if doubled <= dx {
                err += dx;
                next.row += sy;
            }
            Some(next)
        };
        Some(current)
    })
}
