//! Ramp and overlay properties, and PNG output readable by a real decoder.

use powder_common::{GridFootprint, ScoreGrid};
use renderer::{encode_rgba, rasterize, ColorRamp, ColorStop, MAX_OVERLAY_DIM, POWDER_RAMP};

fn footprint() -> GridFootprint {
    GridFootprint {
        north: 40.647,
        south: 40.513,
        east: -111.533,
        west: -111.709,
    }
}

#[test]
fn test_ramp_is_continuous() {
    // Neighboring scores never jump by more than a couple of units per channel
    let steps = 10_000;
    let mut prev = POWDER_RAMP.color_at(0.0).to_array();
    for i in 1..=steps {
        let color = POWDER_RAMP.color_at(i as f32 / steps as f32).to_array();
        for c in 0..4 {
            let jump = (color[c] as i32 - prev[c] as i32).abs();
            assert!(jump <= 2, "jump of {jump} at step {i}");
        }
        prev = color;
    }
}

#[test]
fn test_ramp_alpha_zero_through_threshold() {
    for i in 0..=350 {
        let score = i as f32 / 1000.0;
        assert_eq!(POWDER_RAMP.color_at(score).a, 0, "score {score}");
    }
}

#[test]
fn test_custom_ramp_interpolates() {
    let stops = [
        ColorStop::new(0.0, 0, 0, 0, 0),
        ColorStop::new(1.0, 200, 100, 50, 250),
    ];
    let ramp = ColorRamp::new(&stops);
    let c = ramp.color_at(0.5);
    assert_eq!((c.r, c.g, c.b, c.a), (100, 50, 25, 125));
}

#[test]
fn test_overlay_placement_and_size() {
    let scores = ScoreGrid::new(vec![0.9; 1536 * 1536], 1536, 1536).unwrap();
    let img = rasterize(&scores, footprint(), MAX_OVERLAY_DIM);

    assert_eq!((img.width, img.height), (1024, 1024));
    assert_eq!(img.placement, footprint());
    assert_eq!(img.visible_pixels(), 1024 * 1024);
}

#[test]
fn test_png_roundtrips_through_image_decoder() {
    let values: Vec<f32> = (0..64 * 32).map(|i| (i % 64) as f32 / 63.0).collect();
    let scores = ScoreGrid::new(values, 64, 32).unwrap();
    let img = rasterize(&scores, footprint(), MAX_OVERLAY_DIM);

    let png = encode_rgba(&img.pixels, img.width, img.height).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();

    assert_eq!(decoded.dimensions(), (64, 32));
    assert_eq!(decoded.as_raw(), &img.pixels);
}
