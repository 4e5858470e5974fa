//! Cached terrain entries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use powder_common::{AspectGrid, ElevationGrid, GridFootprint, TileRange, TileResolution};

/// How the cached grid was assembled from tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileLayout {
    pub range: TileRange,
    /// Edge length of one decoded tile in pixels.
    pub tile_size: u32,
}

impl TileLayout {
    pub fn cols(&self) -> usize {
        self.range.cols()
    }

    pub fn rows(&self) -> usize {
        self.range.rows()
    }
}

/// Everything needed to reuse a cached grid without recomputing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainMetadata {
    pub zoom: u32,
    pub resolution: TileResolution,
    /// Ground size of one grid cell in meters at the region's center latitude.
    pub cell_size_m: f64,
    pub layout: TileLayout,
    /// True geographic bounds of the stitched grid.
    pub footprint: GridFootprint,
    pub created_at: DateTime<Utc>,
}

/// Elevation and aspect for one region. Written once, replaced wholesale.
///
/// The grids are shared read-only; cloning an entry is cheap.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub elevation: Arc<ElevationGrid>,
    pub aspect: Arc<AspectGrid>,
    pub metadata: TerrainMetadata,
}

impl CacheEntry {
    pub fn new(elevation: ElevationGrid, aspect: AspectGrid, metadata: TerrainMetadata) -> Self {
        Self {
            elevation: Arc::new(elevation),
            aspect: Arc::new(aspect),
            metadata,
        }
    }

    pub fn width(&self) -> usize {
        self.elevation.width()
    }

    pub fn height(&self) -> usize {
        self.elevation.height()
    }
}
