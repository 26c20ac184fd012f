pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;
pub const TICK_SECS: f64 = 1.0 / TICK_RATE as f64;

pub const CELL_SIZE: f64 = 40.0;
pub const HERO_SIZE: f64 = 32.0;
pub const HERO_SPEED: f64 = 120.0;
pub const MAX_SUBSTEP_SECS: f64 = 0.01;
pub const MAX_TICK_SECS: f64 = 0.25;
pub const CORNER_INSET: f64 = 0.001;

pub const HERO_RADIUS: f64 = CELL_SIZE / 2.0;
pub const ENEMY_RADIUS: f64 = CELL_SIZE / 2.0;
pub const ITEM_RADIUS: f64 = CELL_SIZE / 4.0;

pub const HERO_MAX_HEALTH: i32 = 100;
pub const SPIKE_DAMAGE: i32 = 10;
pub const INVULNERABILITY_SECS: f64 = 1.5;

pub const COIN_SCORE: i32 = 10;
pub const KEY_SCORE: i32 = 50;
pub const TREASURE_SCORE: i32 = 100;

pub const SIGHT_RANGE: i32 = 7;
pub const LOST_SIGHT_TICKS: u32 = 30;
pub const ENEMY_SPAWN_MIN_DISTANCE: i32 = 6;
pub const ENEMY_COUNT: usize = 3;
pub const ENEMY_SPEED: f64 = 100.0;

pub const SPIKE_RATIO: f64 = 0.05;
pub const COIN_RATIO: f64 = 0.20;
pub const TREASURE_COUNT: usize = 2;
pub const KEY_COUNT: usize = 1;
pub const COIN_TRAIL_MIN: i32 = 3;
pub const COIN_TRAIL_MAX: i32 = 5;

pub const MAX_PLACEMENT_ATTEMPTS: usize = 4_096;
pub const MAX_COIN_TRAILS: usize = 2_048;
pub const CARVE_STEPS_PER_CELL: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelConfig {
    pub level: u32,
    pub rows: usize,
    pub cols: usize,
    pub enemy_count: usize,
    pub enemy_speed: f64,
}

pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 3;

pub fn get_level_config(level: u32) -> LevelConfig {
    LevelConfig {
        level: level.clamp(MIN_LEVEL, MAX_LEVEL),
        rows: 20,
        cols: 25,
        enemy_count: ENEMY_COUNT,
        enemy_speed: ENEMY_SPEED,
    }
}

pub fn spike_count(rows: usize, cols: usize) -> usize {
    ((rows * cols) as f64 * SPIKE_RATIO).round() as usize
}

pub fn coin_count(rows: usize, cols: usize) -> usize {
    ((rows * cols) as f64 * COIN_RATIO).round() as usize
}
