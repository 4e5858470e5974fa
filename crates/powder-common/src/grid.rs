//! Row-major raster grids produced by the pipeline stages.
//!
//! All grids share the same addressing: index `row * width + col`, with the
//! origin at the north-west (minimum tile, minimum pixel) corner.

use serde::{Deserialize, Serialize};

use crate::{PowderError, PowderResult};

fn check_len(kind: &str, len: usize, width: usize, height: usize) -> PowderResult<()> {
    if len != width * height {
        return Err(PowderError::Internal(format!(
            "{kind} grid has {len} values, expected {width}x{height} = {}",
            width * height
        )));
    }
    Ok(())
}

/// Elevation in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElevationGrid {
    values: Vec<f32>,
    width: usize,
    height: usize,
}

impl ElevationGrid {
    pub fn new(values: Vec<f32>, width: usize, height: usize) -> PowderResult<Self> {
        check_len("elevation", values.len(), width, height)?;
        Ok(Self {
            values,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Elevation at (row, col). Panics when out of range.
    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.width + col]
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

/// Downslope compass bearing per pixel; `None` marks edge or flat pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectGrid {
    values: Vec<Option<f32>>,
    width: usize,
    height: usize,
}

impl AspectGrid {
    pub fn new(values: Vec<Option<f32>>, width: usize, height: usize) -> PowderResult<Self> {
        check_len("aspect", values.len(), width, height)?;
        Ok(Self {
            values,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// A grid of the given shape with every pixel undefined.
    pub fn undefined(width: usize, height: usize) -> Self {
        Self {
            values: vec![None; width * height],
            width,
            height,
        }
    }

    pub fn values(&self) -> &[Option<f32>] {
        &self.values
    }

    /// Mutable access to the pixels; the shape stays fixed.
    pub fn values_mut(&mut self) -> &mut [Option<f32>] {
        &mut self.values
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> Option<f32> {
        self.values[row * self.width + col]
    }

    /// Number of pixels with a defined bearing.
    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Whether this grid has the same shape as an elevation grid.
    pub fn matches(&self, elevation: &ElevationGrid) -> bool {
        self.width == elevation.width() && self.height == elevation.height()
    }
}

/// Powder score per pixel, each in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreGrid {
    values: Vec<f32>,
    width: usize,
    height: usize,
}

impl ScoreGrid {
    pub fn new(values: Vec<f32>, width: usize, height: usize) -> PowderResult<Self> {
        check_len("score", values.len(), width, height)?;
        Ok(Self {
            values,
            width,
            height,
        })
    }

    /// An all-zero grid of the given shape.
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            values: vec![0.0; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.width + col]
    }
}
