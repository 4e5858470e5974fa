//! Common types and utilities shared across the powder overlay crates.

pub mod bbox;
pub mod error;
pub mod grid;
pub mod tile;

pub use bbox::{GeoBounds, GridFootprint};
pub use error::{PowderError, PowderResult};
pub use grid::{AspectGrid, ElevationGrid, ScoreGrid};
pub use tile::{TileBounds, TileCoord, TileRange, TileResolution};
