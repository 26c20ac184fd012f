use serde::{Deserialize, Serialize};

use crate::constants::CELL_SIZE;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed probe order shared by pathfinding, patrol and trail placement.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Single-axis step from `from` toward `to`; row changes win over column changes.
    pub fn toward(from: Cell, to: Cell) -> Option<Self> {
        if to.row < from.row {
            Some(Self::Up)
        } else if to.row > from.row {
            Some(Self::Down)
        } else if to.col < from.col {
            Some(Self::Left)
        } else if to.col > from.col {
            Some(Self::Right)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
}

impl Cell {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, dir: Direction) -> Self {
        let (dr, dc) = dir.delta();
        Self {
            row: self.row + dr,
            col: self.col + dc,
        }
    }

    pub fn manhattan(self, other: Cell) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }

    /// Top-left corner of the cell in world units.
    pub fn origin(self) -> Position {
        Position {
            x: self.col as f64 * CELL_SIZE,
            y: self.row as f64 * CELL_SIZE,
        }
    }

    pub fn center(self) -> Position {
        Position {
            x: (self.col as f64 + 0.5) * CELL_SIZE,
            y: (self.row as f64 + 0.5) * CELL_SIZE,
        }
    }

    pub fn containing(point: Position) -> Self {
        Self {
            row: (point.y / CELL_SIZE).floor() as i32,
            col: (point.x / CELL_SIZE).floor() as i32,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn distance(self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Held-direction flags supplied by the input layer each tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveIntents {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl MoveIntents {
    pub fn axis_x(self) -> f64 {
        f64::from(u8::from(self.right)) - f64::from(u8::from(self.left))
    }

    pub fn axis_y(self) -> f64 {
        f64::from(u8::from(self.down)) - f64::from(u8::from(self.up))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectibleKind {
    Coin,
    Key,
    Treasure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyMode {
    Patrol,
    Chasing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminal {
    Win,
    Loss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Escaped,
    HealthDepleted,
    Caught,
}

impl GameOverReason {
    pub fn terminal(self) -> Terminal {
        match self {
            Self::Escaped => Terminal::Win,
            Self::HealthDepleted | Self::Caught => Terminal::Loss,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::Escaped => "escaped",
            Self::HealthDepleted => "health_depleted",
            Self::Caught => "caught",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct EnemyView {
    pub id: usize,
    pub x: f64,
    pub y: f64,
    pub row: i32,
    pub col: i32,
    pub mode: EnemyMode,
    pub moving: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CollectedItem {
    pub kind: CollectibleKind,
    pub row: i32,
    pub col: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    ItemCollected {
        kind: CollectibleKind,
        row: i32,
        col: i32,
        score: i32,
    },
    HeroDamaged {
        amount: i32,
        health: i32,
    },
    EnemySpotted {
        #[serde(rename = "enemyId")]
        enemy_id: usize,
    },
    EnemyLostTrack {
        #[serde(rename = "enemyId")]
        enemy_id: usize,
    },
    HeroCaught {
        #[serde(rename = "enemyId")]
        enemy_id: usize,
    },
    NeedKey,
    GameOver {
        reason: GameOverReason,
    },
}

/// Everything the presentation layer needs to draw and sound one tick.
#[derive(Clone, Debug, Serialize)]
pub struct FrameEvents {
    pub tick: u64,
    #[serde(rename = "elapsedSecs")]
    pub elapsed_secs: f64,
    #[serde(rename = "heroPosition")]
    pub hero_position: Position,
    #[serde(rename = "heroCell")]
    pub hero_cell: Cell,
    #[serde(rename = "heroHealth")]
    pub hero_health: i32,
    #[serde(rename = "hasKey")]
    pub has_key: bool,
    pub invulnerable: bool,
    pub score: i32,
    pub enemies: Vec<EnemyView>,
    #[serde(rename = "collectedThisTick")]
    pub collected_this_tick: Vec<CollectedItem>,
    #[serde(rename = "damagedThisTick")]
    pub damaged_this_tick: bool,
    #[serde(rename = "needKey")]
    pub need_key: bool,
    pub terminal: Option<Terminal>,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct WorldInit {
    pub rows: usize,
    pub cols: usize,
    #[serde(rename = "cellSize")]
    pub cell_size: f64,
    pub tiles: Vec<String>,
    pub exit: Cell,
}

#[derive(Clone, Debug, Serialize)]
pub struct GameSummary {
    pub level: u32,
    pub seed: u32,
    pub outcome: Option<Terminal>,
    pub reason: Option<GameOverReason>,
    pub ticks: u64,
    #[serde(rename = "durationSecs")]
    pub duration_secs: f64,
    pub score: i32,
    pub health: i32,
    #[serde(rename = "hasKey")]
    pub has_key: bool,
    #[serde(rename = "coinsCollected")]
    pub coins_collected: usize,
    #[serde(rename = "treasuresCollected")]
    pub treasures_collected: usize,
    #[serde(rename = "damageTaken")]
    pub damage_taken: i32,
}
