//! Assemble decoded tiles into one contiguous elevation grid.

use powder_common::ElevationGrid;
use tracing::debug;

use crate::{DecodedTile, Result, TerrainError};

/// A decoded tile and its (col, row) offset within the layout.
#[derive(Debug, Clone)]
pub struct PlacedTile {
    pub col: usize,
    pub row: usize,
    pub tile: DecodedTile,
}

impl PlacedTile {
    pub fn new(col: usize, row: usize, tile: DecodedTile) -> Self {
        Self { col, row, tile }
    }
}

/// Stitch a `cols` x `rows` layout of equally sized tiles.
///
/// The tile side is taken from the first tile. Each layout cell must be
/// filled exactly once. The output is `(cols * side) x (rows * side)` with
/// tile (col, row) copied to pixel offset `(row * side, col * side)`.
pub fn stitch(tiles: Vec<PlacedTile>, cols: usize, rows: usize) -> Result<ElevationGrid> {
    let side = tiles
        .first()
        .map(|placed| placed.tile.size())
        .ok_or(TerrainError::EmptyTileSet)?;

    let width = cols * side;
    let height = rows * side;
    let mut values = vec![0.0f32; width * height];
    let mut filled = vec![false; cols * rows];

    for placed in &tiles {
        let (col, row) = (placed.col, placed.row);

        if placed.tile.size() != side {
            return Err(TerrainError::TileSizeMismatch {
                col,
                row,
                expected: side,
                found: placed.tile.size(),
            });
        }
        if col >= cols || row >= rows {
            return Err(TerrainError::UnexpectedTile {
                col,
                row,
                reason: "outside the layout",
            });
        }

        let slot = row * cols + col;
        if filled[slot] {
            return Err(TerrainError::UnexpectedTile {
                col,
                row,
                reason: "placed twice",
            });
        }
        filled[slot] = true;

        for r in 0..side {
            let dst = (row * side + r) * width + col * side;
            values[dst..dst + side].copy_from_slice(placed.tile.row(r));
        }
    }

    if let Some(slot) = filled.iter().position(|f| !f) {
        return Err(TerrainError::MissingTile {
            col: slot % cols,
            row: slot / cols,
        });
    }

    debug!(width, height, tiles = tiles.len(), "Stitched elevation grid");
    Ok(ElevationGrid::new(values, width, height)?)
}
