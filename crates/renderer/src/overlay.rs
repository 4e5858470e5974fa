//! Score grid → RGBA overlay.
//!
//! Large grids are reduced with nearest-neighbor sampling so the longest
//! side does not exceed [`MAX_OVERLAY_DIM`]. The overlay is registered
//! against the stitched grid's footprint, not the requested bounds.

use powder_common::{GridFootprint, ScoreGrid};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::ramp::POWDER_RAMP;

/// Longest side of a rendered overlay, in pixels.
pub const MAX_OVERLAY_DIM: usize = 1024;

/// A rendered overlay ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayImage {
    /// RGBA, 4 bytes per pixel, row-major from the north-west corner.
    #[serde(skip)]
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Geographic placement of the image.
    pub placement: GridFootprint,
}

impl OverlayImage {
    /// RGBA of one pixel.
    pub fn pixel(&self, row: usize, col: usize) -> [u8; 4] {
        let i = (row * self.width + col) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Number of pixels with non-zero alpha.
    pub fn visible_pixels(&self) -> usize {
        self.pixels.chunks_exact(4).filter(|px| px[3] > 0).count()
    }
}

/// Output dimensions for a `width` x `height` grid capped at `max_dim`.
///
/// Unchanged when the longest side fits; otherwise both sides scale by
/// `max_dim / longest`, floored, and never drop below 1.
pub fn output_size(width: usize, height: usize, max_dim: usize) -> (usize, usize) {
    let longest = width.max(height);
    if longest <= max_dim {
        return (width, height);
    }

    let scale = max_dim as f64 / longest as f64;
    let scaled = |dim: usize| ((dim as f64 * scale).floor() as usize).max(1);
    (scaled(width), scaled(height))
}

/// Nearest source index for an output index.
#[inline]
fn source_index(out: usize, src_dim: usize, out_dim: usize) -> usize {
    let ratio = src_dim as f64 / out_dim as f64;
    ((out as f64 * ratio).floor() as usize).min(src_dim - 1)
}

/// Render a score grid with [`POWDER_RAMP`].
pub fn rasterize(scores: &ScoreGrid, placement: GridFootprint, max_dim: usize) -> OverlayImage {
    let (src_w, src_h) = (scores.width(), scores.height());
    let (width, height) = output_size(src_w, src_h, max_dim);

    let mut pixels = vec![0u8; width * height * 4];
    if width > 0 && height > 0 {
        let cols: Vec<usize> = (0..width).map(|x| source_index(x, src_w, width)).collect();

        pixels
            .par_chunks_mut(width * 4)
            .enumerate()
            .for_each(|(y, row)| {
                let src_row = source_index(y, src_h, height);
                for (px, &src_col) in row.chunks_exact_mut(4).zip(&cols) {
                    let color = POWDER_RAMP.color_at(scores.at(src_row, src_col));
                    px.copy_from_slice(&color.to_array());
                }
            });
    }

    debug!(src_w, src_h, width, height, "Rasterized overlay");

    OverlayImage {
        pixels,
        width,
        height,
        placement,
    }
}
