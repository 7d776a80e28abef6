//! Error types for the engine boundary.
//!
//! Rule and search code is infallible over validated positions; everything
//! here is raised while decoding or checking caller-supplied data.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Grid is not `size x size` for the game it was given to
    #[error("Invalid board size: expected {expected}x{expected}, found {found}")]
    BoardSize { expected: usize, found: String },

    /// Coordinate outside `[0, size)`
    #[error("Coordinate ({row}, {col}) is outside a {size}x{size} board")]
    OutOfBounds { row: usize, col: usize, size: usize },

    #[error("No piece at ({row}, {col})")]
    EmptySquare { row: usize, col: usize },

    #[error("Illegal move: {0}")]
    IllegalMove(String),

    #[error("Unknown difficulty: {0} (expected easy, normal or hard)")]
    UnknownDifficulty(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
