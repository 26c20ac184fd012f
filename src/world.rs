use crate::constants::{
    coin_count, spike_count, CARVE_STEPS_PER_CELL, COIN_TRAIL_MAX, COIN_TRAIL_MIN, KEY_COUNT,
    MAX_COIN_TRAILS, MAX_PLACEMENT_ATTEMPTS, TREASURE_COUNT,
};
use crate::error::MazeError;
use crate::grid::{CellKind, Grid};
use crate::rng::Rng;
use crate::types::{Cell, CollectibleKind, Direction};

#[derive(Clone, Debug, PartialEq)]
pub struct Collectible {
    pub kind: CollectibleKind,
    pub cell: Cell,
    pub collected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Hazard {
    pub cell: Cell,
}

/// A finished level layout: the grid plus the static entity lists derived from it.
#[derive(Clone, Debug)]
pub struct GeneratedWorld {
    pub grid: Grid,
    pub exit: Cell,
    pub collectibles: Vec<Collectible>,
    pub hazards: Vec<Hazard>,
    pub floor_cells: Vec<Cell>,
}

impl GeneratedWorld {
    /// Derives the entity lists from a finished grid, scanning row-major.
    pub fn from_grid(grid: Grid) -> Result<Self, MazeError> {
        let mut exit = None;
        let mut collectibles = Vec::new();
        let mut hazards = Vec::new();
        let mut floor_cells = Vec::new();

        for (cell, kind) in grid.iter() {
            match kind {
                CellKind::Wall => {}
                CellKind::Floor => floor_cells.push(cell),
                CellKind::Spike => hazards.push(Hazard { cell }),
                CellKind::Coin => collectibles.push(Collectible::new(CollectibleKind::Coin, cell)),
                CellKind::Key => collectibles.push(Collectible::new(CollectibleKind::Key, cell)),
                CellKind::Treasure => {
                    collectibles.push(Collectible::new(CollectibleKind::Treasure, cell))
                }
                CellKind::Exit => {
                    if exit.is_none() {
                        exit = Some(cell);
                    }
                }
            }
        }

        let exit = exit.ok_or(MazeError::MissingExit)?;
        Ok(Self {
            grid,
            exit,
            collectibles,
            hazards,
            floor_cells,
        })
    }
}

impl Collectible {
    fn new(kind: CollectibleKind, cell: Cell) -> Self {
        Self {
            kind,
            cell,
            collected: false,
        }
    }
}

/// Carves a perfect maze over `rows x cols` logical cells and opens one exit
/// in the border. The physical grid is `(2*rows+1) x (2*cols+1)`.
pub fn generate_maze(rows: usize, cols: usize, seed: u32) -> Result<Grid, MazeError> {
    let mut rng = Rng::new(seed);
    carve_maze(rows, cols, &mut rng)
}

/// Maze plus spikes, treasure, key and coin trails.
pub fn generate_world(rows: usize, cols: usize, seed: u32) -> Result<GeneratedWorld, MazeError> {
    let mut rng = Rng::new(seed);
    let mut grid = carve_maze(rows, cols, &mut rng)?;

    for _ in 0..spike_count(rows, cols) {
        place_item_randomly(&mut grid, &mut rng, CellKind::Spike, "spike")?;
    }
    for _ in 0..TREASURE_COUNT {
        place_item_randomly(&mut grid, &mut rng, CellKind::Treasure, "treasure")?;
    }
    for _ in 0..KEY_COUNT {
        place_item_randomly(&mut grid, &mut rng, CellKind::Key, "key")?;
    }
    place_coin_trails(&mut grid, &mut rng, coin_count(rows, cols))?;

    GeneratedWorld::from_grid(grid)
}

struct CarveFrame {
    cell: Cell,
    dirs: [Direction; 4],
    next: usize,
}

impl CarveFrame {
    fn new(cell: Cell, rng: &mut Rng) -> Self {
        let mut dirs = Direction::ALL;
        rng.shuffle(&mut dirs);
        Self { cell, dirs, next: 0 }
    }
}

fn carve_maze(rows: usize, cols: usize, rng: &mut Rng) -> Result<Grid, MazeError> {
    if rows == 0 || cols == 0 {
        return Err(MazeError::InvalidDimensions { rows, cols });
    }
    let mut grid = Grid::filled(rows * 2 + 1, cols * 2 + 1, CellKind::Wall);

    let start = random_logical_cell(rows, cols, rng);
    grid.set(start, CellKind::Floor);
    let mut stack = vec![CarveFrame::new(start, rng)];

    let max_steps = rows * cols * CARVE_STEPS_PER_CELL;
    let mut steps = 0usize;
    while let Some(frame) = stack.last_mut() {
        steps += 1;
        if steps > max_steps {
            return Err(MazeError::GenerationFailure {
                what: "maze",
                attempts: max_steps,
            });
        }

        let Some(&dir) = frame.dirs.get(frame.next) else {
            stack.pop();
            continue;
        };
        frame.next += 1;

        let between = frame.cell.offset(dir);
        let neighbor = between.offset(dir);
        if grid.is_border(neighbor) || grid.get(neighbor) != Some(CellKind::Wall) {
            continue;
        }
        grid.set(between, CellKind::Floor);
        grid.set(neighbor, CellKind::Floor);
        stack.push(CarveFrame::new(neighbor, rng));
    }

    open_exit(&mut grid, rows, cols, rng)?;
    Ok(grid)
}

fn open_exit(grid: &mut Grid, rows: usize, cols: usize, rng: &mut Rng) -> Result<Cell, MazeError> {
    let last_row = grid.rows() as i32 - 1;
    let last_col = grid.cols() as i32 - 1;

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let along_row = rng.int(0, rows as i32 - 1) * 2 + 1;
        let along_col = rng.int(0, cols as i32 - 1) * 2 + 1;
        let (border, inner) = match rng.int(0, 3) {
            0 => (Cell::new(0, along_col), Cell::new(1, along_col)),
            1 => (
                Cell::new(last_row, along_col),
                Cell::new(last_row - 1, along_col),
            ),
            2 => (Cell::new(along_row, 0), Cell::new(along_row, 1)),
            _ => (
                Cell::new(along_row, last_col),
                Cell::new(along_row, last_col - 1),
            ),
        };
        if grid.get(inner) == Some(CellKind::Floor) {
            grid.set(border, CellKind::Exit);
            return Ok(border);
        }
    }

    Err(MazeError::GenerationFailure {
        what: "exit",
        attempts: MAX_PLACEMENT_ATTEMPTS,
    })
}

fn random_logical_cell(rows: usize, cols: usize, rng: &mut Rng) -> Cell {
    let row = rng.int(0, rows as i32 - 1) * 2 + 1;
    let col = rng.int(0, cols as i32 - 1) * 2 + 1;
    Cell::new(row, col)
}

fn logical_dims(grid: &Grid) -> (usize, usize) {
    ((grid.rows() - 1) / 2, (grid.cols() - 1) / 2)
}

fn place_item_randomly(
    grid: &mut Grid,
    rng: &mut Rng,
    kind: CellKind,
    what: &'static str,
) -> Result<Cell, MazeError> {
    let (rows, cols) = logical_dims(grid);
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let cell = random_logical_cell(rows, cols, rng);
        if grid.get(cell) == Some(CellKind::Floor) {
            grid.set(cell, kind);
            return Ok(cell);
        }
    }
    Err(MazeError::GenerationFailure {
        what,
        attempts: MAX_PLACEMENT_ATTEMPTS,
    })
}

/// Lays orthogonal runs of 3..=5 coins until `target` coins are down. A run is
/// cut short by a dead end or by reaching the target.
fn place_coin_trails(
    grid: &mut Grid,
    rng: &mut Rng,
    target: usize,
) -> Result<Vec<Vec<Cell>>, MazeError> {
    let (rows, cols) = logical_dims(grid);
    let mut placed = 0usize;
    let mut trails = Vec::new();
    let mut attempts = 0usize;

    while placed < target {
        if attempts >= MAX_COIN_TRAILS {
            return Err(MazeError::GenerationFailure {
                what: "coin trail",
                attempts: MAX_COIN_TRAILS,
            });
        }
        attempts += 1;

        let mut current = random_logical_cell(rows, cols, rng);
        if grid.get(current) != Some(CellKind::Floor) {
            continue;
        }
        let length = rng.int(COIN_TRAIL_MIN, COIN_TRAIL_MAX);
        let mut trail = Vec::new();
        for _ in 0..length {
            grid.set(current, CellKind::Coin);
            trail.push(current);
            placed += 1;
            if placed >= target {
                break;
            }
            let options: Vec<Cell> = Direction::ALL
                .iter()
                .map(|dir| current.offset(*dir))
                .filter(|next| grid.get(*next) == Some(CellKind::Floor))
                .collect();
            if options.is_empty() {
                break;
            }
            current = options[rng.pick_index(options.len())];
        }
        trails.push(trail);
    }

    Ok(trails)
}
