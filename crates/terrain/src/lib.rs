//! Terrain processing: from fetched elevation tiles to an aspect grid.
//!
//! The stages run in order:
//! 1. [`decode`] turns one Terrain-RGB tile payload into elevations
//! 2. [`stitch`] assembles a rectangular set of decoded tiles into one grid
//! 3. [`aspect`] derives the facing direction of every interior pixel

pub mod aspect;
pub mod decode;
pub mod error;
pub mod stitch;

pub use aspect::{aspect_for_tiles, compute_aspect};
pub use decode::{decode_rgb, decode_tile, elevation_from_rgb, encode_elevation, DecodedTile};
pub use error::{Result, TerrainError};
pub use stitch::{stitch, PlacedTile};
