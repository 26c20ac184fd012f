use crate::constants::{
    get_level_config, LevelConfig, CELL_SIZE, HERO_MAX_HEALTH, HERO_SIZE,
};
use crate::enemy::{Enemy, EnemyUpdate, HeroSighting};
use crate::error::MazeError;
use crate::rng::Rng;
use crate::types::{
    Cell, CollectedItem, FrameEvents, GameOverReason, GameSummary, MoveIntents, Position,
    RuntimeEvent, Terminal, WorldInit,
};
use crate::world::{generate_world, GeneratedWorld};

mod autopilot;
mod movement_system;
mod pickup_system;
mod spawn_system;
mod utils;

use self::utils::{box_center, sanitize_dt};

#[derive(Clone, Debug, Default)]
struct RunStats {
    coins: usize,
    treasures: usize,
    damage_taken: i32,
}

#[derive(Clone, Debug)]
struct HeroInternal {
    x: f64,
    y: f64,
    health: i32,
    has_key: bool,
    invulnerable_until: f64,
}

impl HeroInternal {
    fn spawn_at(cell: Cell) -> Self {
        let origin = cell.origin();
        let inset = (CELL_SIZE - HERO_SIZE) / 2.0;
        Self {
            x: origin.x + inset,
            y: origin.y + inset,
            health: HERO_MAX_HEALTH,
            has_key: false,
            invulnerable_until: 0.0,
        }
    }

    fn center(&self) -> Position {
        box_center(self.x, self.y, HERO_SIZE)
    }

    fn cell(&self) -> Cell {
        Cell::containing(self.center())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationOptions {
    pub level: u32,
    pub enemy_count: usize,
    pub enemy_speed: f64,
}

impl From<LevelConfig> for SimulationOptions {
    fn from(config: LevelConfig) -> Self {
        Self {
            level: config.level,
            enemy_count: config.enemy_count,
            enemy_speed: config.enemy_speed,
        }
    }
}

/// One level in play: the generated world, the hero, the enemies and the score.
#[derive(Clone, Debug)]
pub struct Simulation {
    pub seed: u32,
    pub options: SimulationOptions,
    world: GeneratedWorld,

    rng: Rng,
    hero: HeroInternal,
    enemies: Vec<Enemy>,
    score: i32,
    stats: RunStats,

    elapsed_secs: f64,
    tick_counter: u64,
    on_exit: bool,
    end_reason: Option<GameOverReason>,
}

impl Simulation {
    pub fn new(level: u32, seed: u32) -> Result<Self, MazeError> {
        let config = get_level_config(level);
        Self::with_size(config.rows, config.cols, seed, config.into())
    }

    pub fn with_size(
        rows: usize,
        cols: usize,
        seed: u32,
        options: SimulationOptions,
    ) -> Result<Self, MazeError> {
        let world = generate_world(rows, cols, seed)?;
        let mut rng = Rng::new(seed);
        let hero_cell = spawn_system::pick_hero_spawn(&world, &mut rng)?;
        let enemy_cells =
            spawn_system::pick_enemy_spawns(&world, hero_cell, options.enemy_count, &mut rng);
        Ok(Self::assemble(world, hero_cell, &enemy_cells, options, seed, rng))
    }

    /// Starts a level on a prepared world with explicit spawn cells.
    pub fn from_world(
        world: GeneratedWorld,
        hero_cell: Cell,
        enemy_cells: &[Cell],
        options: SimulationOptions,
        seed: u32,
    ) -> Result<Self, MazeError> {
        let blocked = |cell: Cell| MazeError::BlockedSpawn {
            row: cell.row,
            col: cell.col,
        };
        if world.grid.is_wall(hero_cell)? {
            return Err(blocked(hero_cell));
        }
        // Enemies cannot stand on tiles they are never allowed to enter.
        for &cell in enemy_cells {
            if !world.grid.kind(cell)?.is_enemy_passable() {
                return Err(blocked(cell));
            }
        }
        Ok(Self::assemble(
            world,
            hero_cell,
            enemy_cells,
            options,
            seed,
            Rng::new(seed),
        ))
    }

    fn assemble(
        world: GeneratedWorld,
        hero_cell: Cell,
        enemy_cells: &[Cell],
        options: SimulationOptions,
        seed: u32,
        mut rng: Rng,
    ) -> Self {
        let enemies = enemy_cells
            .iter()
            .map(|cell| Enemy::new(*cell, options.enemy_speed, &world.grid, &mut rng))
            .collect();
        Self {
            seed,
            options,
            world,
            rng,
            hero: HeroInternal::spawn_at(hero_cell),
            enemies,
            score: 0,
            stats: RunStats::default(),
            elapsed_secs: 0.0,
            tick_counter: 0,
            on_exit: false,
            end_reason: None,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.end_reason.is_some()
    }

    pub fn end_reason(&self) -> Option<GameOverReason> {
        self.end_reason
    }

    pub fn terminal(&self) -> Option<Terminal> {
        self.end_reason.map(GameOverReason::terminal)
    }

    pub fn world(&self) -> &GeneratedWorld {
        &self.world
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn hero_position(&self) -> Position {
        Position {
            x: self.hero.x,
            y: self.hero.y,
        }
    }

    pub fn hero_cell(&self) -> Cell {
        self.hero.cell()
    }

    pub fn hero_health(&self) -> i32 {
        self.hero.health
    }

    pub fn has_key(&self) -> bool {
        self.hero.has_key
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn is_invulnerable(&self) -> bool {
        self.elapsed_secs < self.hero.invulnerable_until
    }

    pub fn world_init(&self) -> WorldInit {
        WorldInit {
            rows: self.world.grid.rows(),
            cols: self.world.grid.cols(),
            cell_size: CELL_SIZE,
            tiles: self.world.grid.to_rows(),
            exit: self.world.exit,
        }
    }

    /// Advances the level by `dt` seconds. Once the level has ended this only
    /// re-reports the final state.
    pub fn tick(&mut self, intents: MoveIntents, dt: f64) -> FrameEvents {
        if self.is_ended() {
            return self.build_frame(Vec::new(), false, false, Vec::new());
        }
        let dt = sanitize_dt(dt);
        self.tick_counter += 1;
        self.elapsed_secs += dt;

        let mut events = Vec::new();
        self.move_hero(intents, dt);
        let collected = self.collect_items(&mut events);
        let damaged = self.apply_hazards(&mut events);
        let caught = self.update_enemies(dt, &mut events);

        let at_exit = self.hero.cell() == self.world.exit;
        let need_key = at_exit && !self.hero.has_key;
        if need_key && !self.on_exit {
            events.push(RuntimeEvent::NeedKey);
        }
        self.on_exit = at_exit;

        let reason = if caught {
            Some(GameOverReason::Caught)
        } else if self.hero.health <= 0 {
            Some(GameOverReason::HealthDepleted)
        } else if at_exit && self.hero.has_key {
            Some(GameOverReason::Escaped)
        } else {
            None
        };
        if let Some(reason) = reason {
            self.end_reason = Some(reason);
            events.push(RuntimeEvent::GameOver { reason });
        }

        self.build_frame(collected, damaged, need_key, events)
    }

    fn update_enemies(&mut self, dt: f64, events: &mut Vec<RuntimeEvent>) -> bool {
        let sighting = HeroSighting {
            cell: self.hero.cell(),
            center: self.hero.center(),
        };
        let mut caught = false;
        for (enemy_id, enemy) in self.enemies.iter_mut().enumerate() {
            match enemy.update(&sighting, &self.world.grid, &mut self.rng, dt) {
                EnemyUpdate::Caught => {
                    caught = true;
                    events.push(RuntimeEvent::HeroCaught { enemy_id });
                }
                EnemyUpdate::Spotted => events.push(RuntimeEvent::EnemySpotted { enemy_id }),
                EnemyUpdate::LostTrack => events.push(RuntimeEvent::EnemyLostTrack { enemy_id }),
                EnemyUpdate::Unchanged => {}
            }
        }
        caught
    }

    fn build_frame(
        &self,
        collected_this_tick: Vec<CollectedItem>,
        damaged_this_tick: bool,
        need_key: bool,
        events: Vec<RuntimeEvent>,
    ) -> FrameEvents {
        FrameEvents {
            tick: self.tick_counter,
            elapsed_secs: self.elapsed_secs,
            hero_position: self.hero_position(),
            hero_cell: self.hero.cell(),
            hero_health: self.hero.health,
            has_key: self.hero.has_key,
            invulnerable: self.is_invulnerable(),
            score: self.score,
            enemies: self
                .enemies
                .iter()
                .enumerate()
                .map(|(id, enemy)| enemy.view(id))
                .collect(),
            collected_this_tick,
            damaged_this_tick,
            need_key,
            terminal: self.terminal(),
            events,
        }
    }

    pub fn build_summary(&self) -> GameSummary {
        GameSummary {
            level: self.options.level,
            seed: self.seed,
            outcome: self.terminal(),
            reason: self.end_reason,
            ticks: self.tick_counter,
            duration_secs: self.elapsed_secs,
            score: self.score,
            health: self.hero.health,
            has_key: self.hero.has_key,
            coins_collected: self.stats.coins,
            treasures_collected: self.stats.treasures,
            damage_taken: self.stats.damage_taken,
        }
    }
}
