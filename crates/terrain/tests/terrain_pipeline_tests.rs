//! Decode → stitch → aspect over synthetic Terrain-RGB tiles.

use powder_common::TileResolution;
use terrain::{aspect_for_tiles, compute_aspect, decode_tile, stitch, PlacedTile, TerrainError};
use test_utils::{
    assert_approx_eq, create_cone, create_plane, elevation_grid, flat_tile_png, terrain_rgb_png,
};

// ============================================================================
// Decoding
// ============================================================================

#[test]
fn test_decode_png_tile() {
    let values = create_plane(256, 256, 1500.0, 0.5, 0.25);
    let png = terrain_rgb_png(&values, 256);

    let tile = decode_tile(&png, TileResolution::Standard).unwrap();
    assert_eq!(tile.size(), 256);
    assert_approx_eq!(tile.at(0, 0), 1500.0, 0.06);
    assert_approx_eq!(tile.at(10, 20), 1500.0 + 10.0 + 2.5, 0.06);
}

#[test]
fn test_decode_rejects_wrong_resolution() {
    let png = flat_tile_png(256, 100.0);
    let result = decode_tile(&png, TileResolution::Retina);
    assert!(matches!(result, Err(TerrainError::Decode(_))));
}

#[test]
fn test_decode_rejects_truncated_payload() {
    let png = flat_tile_png(256, 100.0);
    let result = decode_tile(&png[..png.len() / 2], TileResolution::Standard);
    assert!(matches!(result, Err(TerrainError::Decode(_))));
}

// ============================================================================
// Stitching
// ============================================================================

#[test]
fn test_stitch_two_by_two_retina() {
    // Distinct constant elevation per quadrant
    let heights = [[1000.0, 2000.0], [3000.0, 4000.0]];
    let mut tiles = Vec::new();
    for (row, row_heights) in heights.iter().enumerate() {
        for (col, &h) in row_heights.iter().enumerate() {
            let png = flat_tile_png(512, h);
            let tile = decode_tile(&png, TileResolution::Retina).unwrap();
            tiles.push(PlacedTile::new(col, row, tile));
        }
    }

    let grid = stitch(tiles, 2, 2).unwrap();
    assert_eq!(grid.width(), 1024);
    assert_eq!(grid.height(), 1024);

    assert_approx_eq!(grid.at(0, 0), 1000.0, 0.06);
    assert_approx_eq!(grid.at(511, 511), 1000.0, 0.06);
    assert_approx_eq!(grid.at(0, 512), 2000.0, 0.06);
    assert_approx_eq!(grid.at(511, 1023), 2000.0, 0.06);
    assert_approx_eq!(grid.at(512, 0), 3000.0, 0.06);
    assert_approx_eq!(grid.at(1023, 511), 3000.0, 0.06);
    assert_approx_eq!(grid.at(512, 512), 4000.0, 0.06);
    assert_approx_eq!(grid.at(1023, 1023), 4000.0, 0.06);
}

#[test]
fn test_stitch_missing_tile() {
    let tile = decode_tile(&flat_tile_png(256, 0.0), TileResolution::Standard).unwrap();
    let tiles = vec![
        PlacedTile::new(0, 0, tile.clone()),
        PlacedTile::new(1, 0, tile.clone()),
        PlacedTile::new(0, 1, tile),
    ];

    assert!(matches!(
        stitch(tiles, 2, 2),
        Err(TerrainError::MissingTile { col: 1, row: 1 })
    ));
}

#[test]
fn test_stitch_preserves_seam_continuity() {
    // One plane split across two tiles should stitch back seamlessly
    let full = create_plane(512, 256, 2000.0, 1.0, 0.0);
    let left: Vec<f32> = full.chunks(512).flat_map(|r| r[..256].to_vec()).collect();
    let right: Vec<f32> = full.chunks(512).flat_map(|r| r[256..].to_vec()).collect();

    let tiles = vec![
        PlacedTile::new(0, 0, decode_tile(&terrain_rgb_png(&left, 256), TileResolution::Standard).unwrap()),
        PlacedTile::new(1, 0, decode_tile(&terrain_rgb_png(&right, 256), TileResolution::Standard).unwrap()),
    ];
    let grid = stitch(tiles, 2, 1).unwrap();

    assert_approx_eq!(grid.at(100, 256) - grid.at(100, 255), 1.0, 0.15);
}

// ============================================================================
// Aspect
// ============================================================================

#[test]
fn test_aspect_range_on_cone() {
    let size = 64;
    let grid = elevation_grid(create_cone(size, 3000.0, 5.0), size, size);
    let aspect = aspect_for_tiles(&grid, 13, 40.6, TileResolution::Retina);

    assert!(aspect.matches(&grid));
    for value in aspect.values().iter().flatten() {
        assert!((0.0..360.0).contains(value), "aspect {value} out of range");
    }
    // Border is undefined, interior of a cone always slopes
    assert!(aspect.defined_count() >= (size - 2) * (size - 2) - 1);
}

#[test]
fn test_aspect_on_decoded_plane() {
    let values = create_plane(256, 256, 1000.0, 0.0, 3.0);
    let tile = decode_tile(&terrain_rgb_png(&values, 256), TileResolution::Standard).unwrap();
    let grid = stitch(vec![PlacedTile::new(0, 0, tile)], 1, 1).unwrap();

    let aspect = compute_aspect(&grid, 30.0);
    let center = aspect.at(128, 128).unwrap();
    assert_approx_eq!(center, 180.0, 0.5);
}
