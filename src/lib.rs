pub mod constants;
pub mod enemy;
pub mod engine;
pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod perception;
pub mod rng;
pub mod server_protocol;
pub mod server_utils;
pub mod telemetry;
pub mod types;
pub mod world;
