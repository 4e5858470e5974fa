//! Test data generators for synthetic terrain.
//!
//! These generators create predictable, verifiable elevation surfaces and
//! their Terrain-RGB encodings so decoding and aspect results can be checked
//! against known answers.

use std::io::Cursor;

use image::{ImageOutputFormat, RgbImage};
use powder_common::ElevationGrid;

/// Creates an inclined plane in row-major order.
///
/// Each cell value is `base + col * east_step + row * south_step`, so a
/// positive `east_step` rises toward the east and a positive `south_step`
/// rises toward the south (row 0 is north).
///
/// # Example
///
/// ```
/// use test_utils::create_plane;
///
/// let grid = create_plane(4, 3, 100.0, 1.0, 10.0);
/// assert_eq!(grid.len(), 12);
/// assert_eq!(grid[1], 101.0);
/// assert_eq!(grid[4], 110.0);
/// ```
pub fn create_plane(
    width: usize,
    height: usize,
    base: f32,
    east_step: f32,
    south_step: f32,
) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push(base + col as f32 * east_step + row as f32 * south_step);
        }
    }
    data
}

/// Creates a conical peak centered in the grid.
///
/// Height falls off linearly from `peak` at the center by `drop_per_px` per
/// pixel of distance, so every interior pixel except the summit has a slope.
pub fn create_cone(size: usize, peak: f32, drop_per_px: f32) -> Vec<f32> {
    let center = (size as f32 - 1.0) / 2.0;
    let mut data = Vec::with_capacity(size * size);
    for row in 0..size {
        for col in 0..size {
            let dx = col as f32 - center;
            let dy = row as f32 - center;
            data.push(peak - (dx * dx + dy * dy).sqrt() * drop_per_px);
        }
    }
    data
}

/// Creates a grid where every cell has the same elevation.
pub fn create_flat(width: usize, height: usize, meters: f32) -> Vec<f32> {
    vec![meters; width * height]
}

/// Wraps generated values into an [`ElevationGrid`].
///
/// Panics if `values.len() != width * height`.
pub fn elevation_grid(values: Vec<f32>, width: usize, height: usize) -> ElevationGrid {
    ElevationGrid::new(values, width, height).expect("generator produced wrong length")
}

/// Encodes one elevation as Terrain-RGB channels.
///
/// Inverse of `-10000 + (R * 65536 + G * 256 + B) * 0.1`, clamped to 24 bits.
pub fn terrain_rgb_pixel(meters: f32) -> [u8; 3] {
    let encoded = ((meters as f64 + 10_000.0) * 10.0)
        .round()
        .clamp(0.0, 16_777_215.0) as u32;
    [(encoded >> 16) as u8, (encoded >> 8) as u8, encoded as u8]
}

/// Encodes elevations into an interleaved RGB8 buffer.
pub fn terrain_rgb_raw(elevations: &[f32]) -> Vec<u8> {
    elevations
        .iter()
        .flat_map(|&m| terrain_rgb_pixel(m))
        .collect()
}

/// Encodes a square tile of elevations as a Terrain-RGB PNG payload.
///
/// Panics if `elevations.len() != side * side`.
pub fn terrain_rgb_png(elevations: &[f32], side: u32) -> Vec<u8> {
    let img = RgbImage::from_raw(side, side, terrain_rgb_raw(elevations))
        .expect("elevation count must be side * side");

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Png)
        .expect("PNG encoding into memory");
    buf.into_inner()
}

/// A PNG tile of constant elevation.
pub fn flat_tile_png(side: u32, meters: f32) -> Vec<u8> {
    terrain_rgb_png(&create_flat(side as usize, side as usize, meters), side)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_values() {
        let grid = create_plane(3, 2, 0.0, 1.0, 100.0);
        assert_eq!(grid, vec![0.0, 1.0, 2.0, 100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_cone_peak_is_center() {
        let grid = create_cone(5, 1000.0, 10.0);
        let max = grid.iter().cloned().fold(f32::MIN, f32::max);
        assert_eq!(grid[2 * 5 + 2], max);
    }

    #[test]
    fn test_terrain_rgb_sea_level() {
        assert_eq!(terrain_rgb_pixel(0.0), [0x01, 0x86, 0xA0]);
        assert_eq!(terrain_rgb_pixel(-10_000.0), [0, 0, 0]);
    }

    #[test]
    fn test_png_is_decodable() {
        let png = flat_tile_png(8, 1200.0);
        let img = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (8, 8));
        assert_eq!(img.get_pixel(3, 3).0, terrain_rgb_pixel(1200.0));
    }
}
