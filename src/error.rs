use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("invalid maze dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    /// A bounded placement or carve loop ran out of attempts.
    #[error("generation failed: could not place {what} after {attempts} attempts")]
    GenerationFailure { what: &'static str, attempts: usize },

    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    InvalidCell {
        row: i32,
        col: i32,
        rows: usize,
        cols: usize,
    },

    #[error("spawn cell ({row}, {col}) is a wall")]
    BlockedSpawn { row: i32, col: i32 },

    #[error("unknown tile symbol {symbol:?} at ({row}, {col})")]
    InvalidTile { symbol: char, row: usize, col: usize },

    #[error("grid rows have inconsistent widths")]
    RaggedGrid,

    #[error("grid has no exit cell")]
    MissingExit,
}
