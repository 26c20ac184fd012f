use crate::constants::{
    CELL_SIZE, ENEMY_RADIUS, HERO_RADIUS, LOST_SIGHT_TICKS, MAX_PLACEMENT_ATTEMPTS, SIGHT_RANGE,
};
use crate::grid::{CellKind, Grid};
use crate::pathfinding::find_path;
use crate::perception::can_see;
use crate::rng::Rng;
use crate::types::{Cell, Direction, EnemyMode, EnemyView, Position};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyState {
    Patrol { target: Cell },
    Chasing { lost_sight_ticks: u32 },
}

impl EnemyState {
    pub fn mode(self) -> EnemyMode {
        match self {
            Self::Patrol { .. } => EnemyMode::Patrol,
            Self::Chasing { .. } => EnemyMode::Chasing,
        }
    }
}

/// What an enemy needs to know about the hero for one update.
#[derive(Clone, Copy, Debug)]
pub struct HeroSighting {
    pub cell: Cell,
    pub center: Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyUpdate {
    Caught,
    Spotted,
    LostTrack,
    Unchanged,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Glide {
    target: Cell,
}

#[derive(Clone, Debug)]
pub struct Enemy {
    x: f64,
    y: f64,
    cell: Cell,
    speed: f64,
    state: EnemyState,
    prev_dir: Option<Direction>,
    glide: Option<Glide>,
    path: Vec<Cell>,
}

impl Enemy {
    pub fn new(cell: Cell, speed: f64, grid: &Grid, rng: &mut Rng) -> Self {
        let origin = cell.origin();
        let target = pick_patrol_target(grid, cell, rng);
        Self {
            x: origin.x,
            y: origin.y,
            cell,
            speed,
            state: EnemyState::Patrol { target },
            prev_dir: None,
            glide: None,
            path: Vec::new(),
        }
    }

    pub fn cell(&self) -> Cell {
        self.cell
    }

    pub fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }

    pub fn center(&self) -> Position {
        Position {
            x: self.x + CELL_SIZE / 2.0,
            y: self.y + CELL_SIZE / 2.0,
        }
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn mode(&self) -> EnemyMode {
        self.state.mode()
    }

    pub fn is_moving(&self) -> bool {
        self.glide.is_some()
    }

    /// Last chase path, empty until the first chase step.
    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    pub fn view(&self, id: usize) -> EnemyView {
        EnemyView {
            id,
            x: self.x,
            y: self.y,
            row: self.cell.row,
            col: self.cell.col,
            mode: self.mode(),
            moving: self.is_moving(),
        }
    }

    pub fn touches(&self, hero_center: Position) -> bool {
        self.center().distance(hero_center) < HERO_RADIUS + ENEMY_RADIUS
    }

    pub fn update(&mut self, hero: &HeroSighting, grid: &Grid, rng: &mut Rng, dt: f64) -> EnemyUpdate {
        if self.touches(hero.center) {
            return EnemyUpdate::Caught;
        }

        let outcome = if can_see(grid, self.cell, hero.cell, SIGHT_RANGE) {
            let spotted = matches!(self.state, EnemyState::Patrol { .. });
            self.state = EnemyState::Chasing { lost_sight_ticks: 0 };
            self.chase_step(hero.cell, grid);
            if spotted {
                EnemyUpdate::Spotted
            } else {
                EnemyUpdate::Unchanged
            }
        } else {
            match self.state {
                EnemyState::Chasing { lost_sight_ticks } => {
                    let lost_sight_ticks = lost_sight_ticks + 1;
                    if lost_sight_ticks >= LOST_SIGHT_TICKS {
                        self.state = EnemyState::Patrol {
                            target: pick_patrol_target(grid, self.cell, rng),
                        };
                        EnemyUpdate::LostTrack
                    } else {
                        self.state = EnemyState::Chasing { lost_sight_ticks };
                        self.chase_step(hero.cell, grid);
                        EnemyUpdate::Unchanged
                    }
                }
                EnemyState::Patrol { .. } => {
                    self.patrol_step(grid, rng);
                    EnemyUpdate::Unchanged
                }
            }
        };

        self.advance_glide(dt);
        outcome
    }

    fn chase_step(&mut self, hero_cell: Cell, grid: &Grid) {
        if self.glide.is_some() {
            return;
        }
        let Some(path) = find_path(grid, self.cell, hero_cell) else {
            return;
        };
        self.path = path;
        if let Some(next) = self.path.get(1).copied() {
            if let Some(dir) = Direction::toward(self.cell, next) {
                self.try_start_move(dir, grid);
            }
        }
    }

    fn patrol_step(&mut self, grid: &Grid, rng: &mut Rng) {
        if self.glide.is_some() {
            return;
        }
        if let EnemyState::Patrol { target } = self.state {
            if target == self.cell {
                self.state = EnemyState::Patrol {
                    target: pick_patrol_target(grid, self.cell, rng),
                };
            }
        }

        let mut options: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|dir| grid.is_enemy_passable(self.cell.offset(*dir)))
            .collect();
        if options.len() > 1 {
            if let Some(prev) = self.prev_dir {
                options.retain(|dir| *dir != prev.reverse());
            }
        }
        if options.is_empty() {
            return;
        }
        let dir = options[rng.pick_index(options.len())];
        self.try_start_move(dir, grid);
    }

    fn try_start_move(&mut self, dir: Direction, grid: &Grid) -> bool {
        if self.glide.is_some() {
            return false;
        }
        let target = self.cell.offset(dir);
        if !grid.is_enemy_passable(target) {
            return false;
        }
        self.glide = Some(Glide { target });
        self.prev_dir = Some(dir);
        true
    }

    fn advance_glide(&mut self, dt: f64) {
        let Some(glide) = self.glide else {
            return;
        };
        let goal = glide.target.origin();
        let dx = goal.x - self.x;
        let dy = goal.y - self.y;
        let remaining = dx.hypot(dy);
        let step = self.speed * dt;

        if step >= remaining {
            self.x = goal.x;
            self.y = goal.y;
            self.cell = glide.target;
            self.glide = None;
        } else {
            self.x += dx / remaining * step;
            self.y += dy / remaining * step;
        }
    }
}

/// Random floor cell other than `current`; falls back to `current` when sampling runs dry.
fn pick_patrol_target(grid: &Grid, current: Cell, rng: &mut Rng) -> Cell {
    let max_row = grid.rows() as i32 - 1;
    let max_col = grid.cols() as i32 - 1;
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let cell = Cell::new(rng.int(0, max_row), rng.int(0, max_col));
        if cell != current && grid.get(cell) == Some(CellKind::Floor) {
            return cell;
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TICK_SECS;
    use crate::world::generate_world;

    fn sighting(cell: Cell) -> HeroSighting {
        HeroSighting {
            cell,
            center: cell.center(),
        }
    }

    #[test]
    fn enemy_in_clear_sight_starts_chasing() {
        let grid = Grid::parse(&["#########", "#.......#", "#########"]).expect("grid should parse");
        let mut rng = Rng::new(3);
        let mut enemy = Enemy::new(Cell::new(1, 1), 100.0, &grid, &mut rng);
        assert_eq!(enemy.mode(), EnemyMode::Patrol);

        let outcome = enemy.update(&sighting(Cell::new(1, 4)), &grid, &mut rng, TICK_SECS);
        assert_eq!(outcome, EnemyUpdate::Spotted);
        assert_eq!(enemy.state(), EnemyState::Chasing { lost_sight_ticks: 0 });
        assert!(enemy.is_moving());
        assert_eq!(enemy.path().len(), 4);
        assert!(enemy.position().x > Cell::new(1, 1).origin().x);
    }

    #[test]
    fn chasing_enemy_gives_up_after_losing_sight() {
        let grid = Grid::parse(&["#######", "#..#..#", "#######"]).expect("grid should parse");
        let mut rng = Rng::new(11);
        let mut enemy = Enemy::new(Cell::new(1, 1), 100.0, &grid, &mut rng);
        enemy.state = EnemyState::Chasing { lost_sight_ticks: 0 };
        let hidden = sighting(Cell::new(1, 5));

        for _ in 1..LOST_SIGHT_TICKS {
            assert_eq!(
                enemy.update(&hidden, &grid, &mut rng, TICK_SECS),
                EnemyUpdate::Unchanged
            );
            assert_eq!(enemy.mode(), EnemyMode::Chasing);
        }
        assert_eq!(
            enemy.update(&hidden, &grid, &mut rng, TICK_SECS),
            EnemyUpdate::LostTrack
        );
        assert_eq!(enemy.mode(), EnemyMode::Patrol);
        // unreachable hero: the enemy never left its cell
        assert_eq!(enemy.cell(), Cell::new(1, 1));
    }

    #[test]
    fn overlapping_hero_is_caught_without_state_change() {
        let grid = Grid::parse(&["#####", "#...#", "#####"]).expect("grid should parse");
        let mut rng = Rng::new(5);
        let mut enemy = Enemy::new(Cell::new(1, 1), 100.0, &grid, &mut rng);
        let hero = HeroSighting {
            cell: Cell::new(1, 1),
            center: Position { x: 70.0, y: 60.0 },
        };
        assert_eq!(enemy.update(&hero, &grid, &mut rng, TICK_SECS), EnemyUpdate::Caught);
        assert_eq!(enemy.mode(), EnemyMode::Patrol);
        assert!(!enemy.is_moving());
    }

    #[test]
    fn patrol_reverses_only_at_dead_ends() {
        let grid = Grid::parse(&["#####", "#...#", "#####"]).expect("grid should parse");
        let mut rng = Rng::new(9);
        let mut enemy = Enemy::new(Cell::new(1, 1), 100.0, &grid, &mut rng);
        let far = sighting(Cell::new(40, 40));

        let mut visited = Vec::new();
        for _ in 0..400 {
            enemy.update(&far, &grid, &mut rng, TICK_SECS);
            if visited.last() != Some(&enemy.cell()) {
                visited.push(enemy.cell());
            }
        }
        assert!(visited.len() > 4);
        for window in visited.windows(3) {
            // a corridor walker only turns back at either end
            if window[0] == window[2] {
                assert!(window[1] == Cell::new(1, 1) || window[1] == Cell::new(1, 3));
            }
        }
    }

    #[test]
    fn patrol_never_steps_onto_items_or_exit() {
        let grid = Grid::parse(&["#######", "#.c^.k#", "#.###T#", "#....E#", "#######"])
            .expect("grid should parse");
        let mut rng = Rng::new(21);
        let mut enemy = Enemy::new(Cell::new(1, 1), 140.0, &grid, &mut rng);
        let far = sighting(Cell::new(40, 40));
        for _ in 0..2_000 {
            enemy.update(&far, &grid, &mut rng, TICK_SECS);
            assert!(grid.is_enemy_passable(enemy.cell()));
        }
    }

    #[test]
    fn same_seed_enemies_move_identically() {
        let world = generate_world(10, 10, 77).expect("world should generate");
        let start = world.floor_cells[0];
        let hero = sighting(world.floor_cells[world.floor_cells.len() - 1]);

        let mut rng_a = Rng::new(1);
        let mut rng_b = Rng::new(1);
        let mut a = Enemy::new(start, 120.0, &world.grid, &mut rng_a);
        let mut b = Enemy::new(start, 120.0, &world.grid, &mut rng_b);
        for _ in 0..600 {
            let out_a = a.update(&hero, &world.grid, &mut rng_a, TICK_SECS);
            let out_b = b.update(&hero, &world.grid, &mut rng_b, TICK_SECS);
            assert_eq!(out_a, out_b);
            assert_eq!(a.position(), b.position());
            assert_eq!(a.state(), b.state());
        }
    }
}
