//! Terrain-RGB tile decoding.
//!
//! Each pixel packs a height into its three color channels:
//! `elevation = -10000 + (R * 65536 + G * 256 + B) * 0.1` meters.

use powder_common::TileResolution;
use tracing::debug;

use crate::{Result, TerrainError};

/// Offset of the Terrain-RGB encoding, in meters.
const ELEVATION_OFFSET_M: f64 = -10_000.0;

/// Height step of one encoded unit, in meters.
const ELEVATION_STEP_M: f64 = 0.1;

/// Largest value representable in 24 bits.
const MAX_ENCODED: f64 = 16_777_215.0;

/// One decoded square tile of elevations in meters, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTile {
    values: Vec<f32>,
    size: usize,
}

impl DecodedTile {
    /// Edge length in pixels.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Elevation at (row, col).
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.size + col]
    }

    /// One row of the tile.
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.size;
        &self.values[start..start + self.size]
    }
}

/// Decode a single Terrain-RGB pixel.
#[inline]
pub fn elevation_from_rgb(r: u8, g: u8, b: u8) -> f32 {
    let encoded = (r as u32) * 65_536 + (g as u32) * 256 + b as u32;
    (ELEVATION_OFFSET_M + encoded as f64 * ELEVATION_STEP_M) as f32
}

/// Encode an elevation into Terrain-RGB channels, clamped to the representable range.
pub fn encode_elevation(meters: f64) -> [u8; 3] {
    let encoded = ((meters - ELEVATION_OFFSET_M) / ELEVATION_STEP_M)
        .round()
        .clamp(0.0, MAX_ENCODED) as u32;
    [
        ((encoded >> 16) & 0xff) as u8,
        ((encoded >> 8) & 0xff) as u8,
        (encoded & 0xff) as u8,
    ]
}

/// Decode a raw interleaved RGB8 buffer of a `side` x `side` tile.
pub fn decode_rgb(raw: &[u8], side: usize) -> Result<DecodedTile> {
    let expected = side * side * 3;
    if side == 0 || raw.len() != expected {
        return Err(TerrainError::decode(format!(
            "RGB buffer has {} bytes, expected {} for a {}x{} tile",
            raw.len(),
            expected,
            side,
            side
        )));
    }

    let values = raw
        .chunks_exact(3)
        .map(|px| elevation_from_rgb(px[0], px[1], px[2]))
        .collect();

    Ok(DecodedTile { values, size: side })
}

/// Decode an encoded image payload (PNG, WebP, ...) into elevations.
///
/// The image must be square with the side length implied by `resolution`.
pub fn decode_tile(payload: &[u8], resolution: TileResolution) -> Result<DecodedTile> {
    let img = image::load_from_memory(payload)
        .map_err(|e| TerrainError::decode(format!("unreadable image payload: {}", e)))?;
    let rgb = img.to_rgb8();

    let (width, height) = (rgb.width(), rgb.height());
    let expected = resolution.tile_size();
    if width != height || width != expected {
        return Err(TerrainError::decode(format!(
            "tile is {}x{}, expected {}x{}",
            width, height, expected, expected
        )));
    }

    debug!(size = width, bytes = payload.len(), "Decoded terrain tile");
    decode_rgb(rgb.as_raw(), width as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_pixels() {
        assert_eq!(elevation_from_rgb(0, 0, 0), -10_000.0);
        // 1 unit = 0.1 m
        assert!((elevation_from_rgb(0, 0, 1) - (-9_999.9)).abs() < 1e-3);
        // Sea level: 100000 units = 0x01_86_A0
        assert!(elevation_from_rgb(0x01, 0x86, 0xA0).abs() < 1e-3);
    }

    #[test]
    fn test_encode_inverts_decode() {
        for meters in [-50.0, 0.0, 1234.5, 3048.0, 8848.8] {
            let [r, g, b] = encode_elevation(meters);
            let back = elevation_from_rgb(r, g, b) as f64;
            assert!((back - meters).abs() < 0.06, "{meters} -> {back}");
        }
    }

    #[test]
    fn test_encode_clamps() {
        assert_eq!(encode_elevation(-20_000.0), [0, 0, 0]);
        assert_eq!(encode_elevation(2.0e7), [255, 255, 255]);
    }

    #[test]
    fn test_decode_rgb_layout() {
        let mut raw = Vec::new();
        for meters in [100.0, 200.0, 300.0, 400.0] {
            raw.extend_from_slice(&encode_elevation(meters));
        }
        let tile = decode_rgb(&raw, 2).unwrap();
        assert_eq!(tile.size(), 2);
        assert!((tile.at(0, 1) - 200.0).abs() < 0.06);
        assert!((tile.at(1, 0) - 300.0).abs() < 0.06);
        assert_eq!(tile.row(1).len(), 2);
    }

    #[test]
    fn test_decode_rgb_undersized() {
        assert!(matches!(
            decode_rgb(&[0u8; 11], 2),
            Err(TerrainError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_tile_rejects_garbage() {
        let result = decode_tile(b"not an image", TileResolution::Standard);
        assert!(matches!(result, Err(TerrainError::Decode(_))));
    }
}
