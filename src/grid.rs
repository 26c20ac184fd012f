//! Dense maze cell matrix and its static queries.

use serde::Serialize;

use crate::error::MazeError;
use crate::types::Cell;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Wall,
    Floor,
    Spike,
    Treasure,
    Coin,
    Key,
    Exit,
}

impl CellKind {
    pub fn symbol(self) -> char {
        match self {
            Self::Wall => '#',
            Self::Floor => '.',
            Self::Spike => '^',
            Self::Treasure => 'T',
            Self::Coin => 'c',
            Self::Key => 'k',
            Self::Exit => 'E',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '#' => Some(Self::Wall),
            '.' => Some(Self::Floor),
            '^' => Some(Self::Spike),
            'T' => Some(Self::Treasure),
            'c' => Some(Self::Coin),
            'k' => Some(Self::Key),
            'E' => Some(Self::Exit),
            _ => None,
        }
    }

    /// Terrain an enemy is willing to step onto.
    pub fn is_enemy_passable(self) -> bool {
        matches!(self, Self::Floor | Self::Coin | Self::Spike)
    }
}

/// Row-major matrix of cell kinds. Read-only outside of generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellKind>,
}

impl Grid {
    pub(crate) fn filled(rows: usize, cols: usize, kind: CellKind) -> Self {
        Self {
            rows,
            cols,
            cells: vec![kind; rows * cols],
        }
    }

    /// Builds a grid from ASCII rows (`#` wall, `.` floor, `^` spike, `T` treasure,
    /// `c` coin, `k` key, `E` exit).
    pub fn parse<S: AsRef<str>>(lines: &[S]) -> Result<Self, MazeError> {
        let rows = lines.len();
        let cols = lines.first().map(|line| line.as_ref().chars().count()).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(MazeError::InvalidDimensions { rows, cols });
        }
        let mut cells = Vec::with_capacity(rows * cols);
        for (row, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.chars().count() != cols {
                return Err(MazeError::RaggedGrid);
            }
            for (col, symbol) in line.chars().enumerate() {
                let kind = CellKind::from_symbol(symbol)
                    .ok_or(MazeError::InvalidTile { symbol, row, col })?;
                cells.push(kind);
            }
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row >= 0
            && cell.col >= 0
            && (cell.row as usize) < self.rows
            && (cell.col as usize) < self.cols
    }

    pub fn is_border(&self, cell: Cell) -> bool {
        self.contains(cell)
            && (cell.row == 0
                || cell.col == 0
                || cell.row as usize == self.rows - 1
                || cell.col as usize == self.cols - 1)
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        Some(cell.row as usize * self.cols + cell.col as usize)
    }

    /// Bounds-tolerant lookup; `None` outside the grid.
    pub fn get(&self, cell: Cell) -> Option<CellKind> {
        self.index(cell).map(|idx| self.cells[idx])
    }

    /// Strict lookup; out-of-bounds coordinates are an error.
    pub fn kind(&self, cell: Cell) -> Result<CellKind, MazeError> {
        self.get(cell).ok_or(MazeError::InvalidCell {
            row: cell.row,
            col: cell.col,
            rows: self.rows,
            cols: self.cols,
        })
    }

    pub fn is_wall(&self, cell: Cell) -> Result<bool, MazeError> {
        Ok(self.kind(cell)? == CellKind::Wall)
    }

    /// Anything that is not a wall can be walked by the hero and searched by A*.
    pub fn is_open(&self, cell: Cell) -> bool {
        matches!(self.get(cell), Some(kind) if kind != CellKind::Wall)
    }

    pub fn is_enemy_passable(&self, cell: Cell) -> bool {
        self.get(cell).map(CellKind::is_enemy_passable).unwrap_or(false)
    }

    pub(crate) fn set(&mut self, cell: Cell, kind: CellKind) {
        if let Some(idx) = self.index(cell) {
            self.cells[idx] = kind;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Cell, CellKind)> + '_ {
        let cols = self.cols;
        self.cells.iter().enumerate().map(move |(idx, kind)| {
            (Cell::new((idx / cols) as i32, (idx % cols) as i32), *kind)
        })
    }

    pub fn count_of_kind(&self, kind: CellKind) -> usize {
        self.cells.iter().filter(|cell_kind| **cell_kind == kind).count()
    }

    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|kind| kind.symbol()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_ascii_rows() {
        let rows = ["#####", "#.^c#", "#TkE#", "#####"];
        let grid = Grid::parse(&rows).expect("grid should parse");
        assert_eq!(grid.rows(), 4);
        assert_eq!(grid.cols(), 5);
        assert_eq!(grid.kind(Cell::new(1, 2)), Ok(CellKind::Spike));
        assert_eq!(grid.to_rows(), rows.iter().map(|r| r.to_string()).collect::<Vec<_>>());
    }

    #[test]
    fn parse_rejects_unknown_symbols_and_ragged_rows() {
        assert!(matches!(
            Grid::parse(&["##", "#x"]),
            Err(MazeError::InvalidTile { symbol: 'x', row: 1, col: 1 })
        ));
        assert_eq!(Grid::parse(&["###", "##"]), Err(MazeError::RaggedGrid));
        assert!(matches!(
            Grid::parse::<&str>(&[]),
            Err(MazeError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn out_of_bounds_queries_fail_fast() {
        let grid = Grid::parse(&["###", "#.#", "###"]).expect("grid should parse");
        assert!(matches!(
            grid.kind(Cell::new(-1, 0)),
            Err(MazeError::InvalidCell { row: -1, col: 0, .. })
        ));
        assert!(grid.is_wall(Cell::new(3, 1)).is_err());
        assert_eq!(grid.get(Cell::new(1, 3)), None);
        assert!(!grid.is_open(Cell::new(9, 9)));
        assert!(grid.is_open(Cell::new(1, 1)));
    }

    #[test]
    fn enemy_passability_excludes_items_and_exit() {
        let grid = Grid::parse(&["#####", "#.c^#", "#TkE#", "#####"]).expect("grid should parse");
        assert!(grid.is_enemy_passable(Cell::new(1, 1)));
        assert!(grid.is_enemy_passable(Cell::new(1, 2)));
        assert!(grid.is_enemy_passable(Cell::new(1, 3)));
        assert!(!grid.is_enemy_passable(Cell::new(2, 1)));
        assert!(!grid.is_enemy_passable(Cell::new(2, 2)));
        assert!(!grid.is_enemy_passable(Cell::new(2, 3)));
        assert!(!grid.is_enemy_passable(Cell::new(0, 0)));
    }

    #[test]
    fn border_detection_matches_outer_ring() {
        let grid = Grid::parse(&["###", "#.#", "###"]).expect("grid should parse");
        assert!(grid.is_border(Cell::new(0, 1)));
        assert!(grid.is_border(Cell::new(2, 2)));
        assert!(!grid.is_border(Cell::new(1, 1)));
    }
}
