//! Error types for terrain processing.

use powder_common::PowderError;
use thiserror::Error;

/// Errors that can occur while decoding or assembling terrain.
#[derive(Error, Debug)]
pub enum TerrainError {
    /// Tile payload could not be decoded into elevations.
    #[error("failed to decode tile: {0}")]
    Decode(String),

    /// A tile's side length differs from the first tile's.
    #[error("tile at ({col}, {row}) is {found}px, expected {expected}px")]
    TileSizeMismatch {
        col: usize,
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A tile position in the layout was never supplied.
    #[error("missing tile at ({col}, {row})")]
    MissingTile { col: usize, row: usize },

    /// A tile was placed outside the layout or more than once.
    #[error("unexpected tile at ({col}, {row}): {reason}")]
    UnexpectedTile {
        col: usize,
        row: usize,
        reason: &'static str,
    },

    /// No tiles were supplied.
    #[error("no tiles to stitch")]
    EmptyTileSet,

    /// Grid construction failed.
    #[error("grid error: {0}")]
    Grid(#[from] PowderError),
}

impl TerrainError {
    /// Create a Decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

impl From<TerrainError> for PowderError {
    fn from(err: TerrainError) -> Self {
        match err {
            TerrainError::Decode(msg) => PowderError::Decode(msg),
            TerrainError::Grid(inner) => inner,
            other => PowderError::Internal(other.to_string()),
        }
    }
}

/// Result type for terrain operations.
pub type Result<T> = std::result::Result<T, TerrainError>;
