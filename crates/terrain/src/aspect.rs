//! Slope aspect from an elevation grid using Horn's method.
//!
//! For each interior pixel the 3x3 neighborhood
//!
//! ```text
//!   NW  N  NE
//!   W   .  E
//!   SW  S  SE
//! ```
//!
//! gives the finite-difference gradients
//!
//! ```text
//! dzdx = ((NE + 2E + SE) - (NW + 2W + SW)) / (8 * cell_size)
//! dzdy = ((SW + 2S + SE) - (NW + 2N + NE)) / (8 * cell_size)
//! ```
//!
//! and the bearing `atan2(dzdx, -dzdy)` in degrees, normalized to [0, 360).
//! Row 0 is the northern edge of the grid.
//!
//! Edge pixels and pixels whose gradients are both exactly zero have no
//! defined aspect and are `None`.

use powder_common::tile::cell_size_meters;
use powder_common::{AspectGrid, ElevationGrid, TileResolution};
use rayon::prelude::*;
use tracing::debug;

/// Compute the aspect grid for an elevation grid with square cells of
/// `cell_size` meters.
pub fn compute_aspect(grid: &ElevationGrid, cell_size: f64) -> AspectGrid {
    let (width, height) = (grid.width(), grid.height());
    let mut aspect = AspectGrid::undefined(width, height);

    if width >= 3 && height >= 3 {
        aspect
            .values_mut()
            .par_chunks_mut(width)
            .enumerate()
            .filter(|(row, _)| *row > 0 && *row < height - 1)
            .for_each(|(row, out)| {
                for (col, slot) in out.iter_mut().enumerate().take(width - 1).skip(1) {
                    *slot = aspect_at(grid, row, col, cell_size);
                }
            });
    }

    debug!(width, height, cell_size, "Computed aspect grid");
    aspect
}

/// Compute aspect for a grid stitched from tiles at `zoom`, deriving the cell
/// size at `center_lat` for the given tile resolution.
pub fn aspect_for_tiles(
    grid: &ElevationGrid,
    zoom: u32,
    center_lat: f64,
    resolution: TileResolution,
) -> AspectGrid {
    let cell_size = cell_size_meters(zoom, center_lat, resolution);
    compute_aspect(grid, cell_size)
}

/// Aspect of one interior pixel.
fn aspect_at(grid: &ElevationGrid, row: usize, col: usize, cell_size: f64) -> Option<f32> {
    let z = |r: usize, c: usize| grid.at(r, c) as f64;

    let nw = z(row - 1, col - 1);
    let n = z(row - 1, col);
    let ne = z(row - 1, col + 1);
    let w = z(row, col - 1);
    let e = z(row, col + 1);
    let sw = z(row + 1, col - 1);
    let s = z(row + 1, col);
    let se = z(row + 1, col + 1);

    let dzdx = ((ne + 2.0 * e + se) - (nw + 2.0 * w + sw)) / (8.0 * cell_size);
    let dzdy = ((sw + 2.0 * s + se) - (nw + 2.0 * n + ne)) / (8.0 * cell_size);

    if dzdx == 0.0 && dzdy == 0.0 {
        return None;
    }

    let mut deg = dzdx.atan2(-dzdy).to_degrees();
    if deg < 0.0 {
        deg += 360.0;
    }

    let deg = deg as f32;
    // Rounding can land exactly on 360
    if deg >= 360.0 {
        Some(0.0)
    } else {
        Some(deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(width: usize, height: usize, f: impl Fn(usize, usize) -> f32) -> ElevationGrid {
        let values = (0..height)
            .flat_map(|r| (0..width).map(move |c| (r, c)))
            .map(|(r, c)| f(r, c))
            .collect();
        ElevationGrid::new(values, width, height).unwrap()
    }

    #[test]
    fn test_edges_undefined() {
        let grid = plane(5, 4, |r, c| (r * 7 + c * 3) as f32);
        let aspect = compute_aspect(&grid, 10.0);

        for c in 0..5 {
            assert!(aspect.at(0, c).is_none());
            assert!(aspect.at(3, c).is_none());
        }
        for r in 0..4 {
            assert!(aspect.at(r, 0).is_none());
            assert!(aspect.at(r, 4).is_none());
        }
        assert_eq!(aspect.defined_count(), 3 * 2);
    }

    #[test]
    fn test_flat_undefined() {
        let grid = plane(6, 6, |_, _| 1500.0);
        assert_eq!(compute_aspect(&grid, 30.0).defined_count(), 0);
    }

    #[test]
    fn test_cardinal_planes() {
        // Rising eastward: dzdx > 0, dzdy = 0
        let east = plane(5, 5, |_, c| c as f32 * 10.0);
        assert!((compute_aspect(&east, 10.0).at(2, 2).unwrap() - 90.0).abs() < 1e-4);

        // Rising southward: dzdy > 0, dzdx = 0
        let south = plane(5, 5, |r, _| r as f32 * 10.0);
        assert!((compute_aspect(&south, 10.0).at(2, 2).unwrap() - 180.0).abs() < 1e-4);

        // Rising westward
        let west = plane(5, 5, |_, c| (10 - c) as f32 * 10.0);
        assert!((compute_aspect(&west, 10.0).at(2, 2).unwrap() - 270.0).abs() < 1e-4);

        // Rising northward folds to 0
        let north = plane(5, 5, |r, _| (10 - r) as f32 * 10.0);
        assert_eq!(compute_aspect(&north, 10.0).at(2, 2), Some(0.0));
    }

    #[test]
    fn test_tiny_grid_all_undefined() {
        let grid = plane(2, 2, |r, c| (r + c) as f32);
        let aspect = compute_aspect(&grid, 1.0);
        assert_eq!(aspect.width(), 2);
        assert_eq!(aspect.defined_count(), 0);
    }

    #[test]
    fn test_cell_size_does_not_change_direction() {
        let grid = plane(5, 5, |r, c| (r as f32) * 3.0 + (c as f32) * 2.0);
        let coarse = compute_aspect(&grid, 100.0).at(2, 2).unwrap();
        let fine = aspect_for_tiles(&grid, 14, 45.0, TileResolution::Retina)
            .at(2, 2)
            .unwrap();
        assert!((coarse - fine).abs() < 1e-3);
    }
}
