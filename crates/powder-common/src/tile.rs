//! Slippy-map tile geodesy.
//!
//! Implements the standard Web Mercator (z/x/y, top-left origin) tiling used by
//! elevation tile providers:
//! - `x` is the column, 0 at 180°W, increasing eastward
//! - `y` is the row, 0 at ~85.05°N, increasing southward
//!
//! Tiles may be served at a higher pixel density than the nominal 256 px tile
//! (e.g. `@2x` tiles at 512 px). That density is carried explicitly as a
//! [`TileResolution`] rather than baked into cell-size call sites.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{GeoBounds, GridFootprint, PowderError};

/// Earth's mean circumference in meters.
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_016.686;

/// Nominal tile edge length in pixels at 1x resolution.
pub const BASE_TILE_SIZE: u32 = 256;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Geographic footprint of this tile.
    pub fn bounds(&self) -> TileBounds {
        tile_to_bounds(self.x, self.y, self.z)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Pixel density of fetched tiles relative to the nominal 256 px tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileResolution {
    /// 256 px tiles.
    Standard,
    /// 512 px ("@2x") tiles.
    #[default]
    Retina,
}

impl TileResolution {
    /// Pixel density multiplier (1 or 2).
    pub fn multiplier(&self) -> u32 {
        match self {
            TileResolution::Standard => 1,
            TileResolution::Retina => 2,
        }
    }

    /// Edge length in pixels of one decoded tile.
    pub fn tile_size(&self) -> u32 {
        BASE_TILE_SIZE * self.multiplier()
    }

    /// URL suffix conventionally used by tile providers.
    pub fn url_suffix(&self) -> &'static str {
        match self {
            TileResolution::Standard => "",
            TileResolution::Retina => "@2x",
        }
    }
}

impl FromStr for TileResolution {
    type Err = PowderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1x" | "1" | "standard" => Ok(TileResolution::Standard),
            "2x" | "2" | "retina" => Ok(TileResolution::Retina),
            other => Err(PowderError::Config(format!(
                "unknown tile resolution '{other}' (expected 1x or 2x)"
            ))),
        }
    }
}

/// Geographic footprint of a single tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub lon_min: f64,
    pub lon_max: f64,
    pub lat_min: f64,
    pub lat_max: f64,
}

impl TileBounds {
    /// Check if a point lies within the tile (edges inclusive).
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        lon >= self.lon_min && lon <= self.lon_max && lat >= self.lat_min && lat <= self.lat_max
    }
}

/// Fractional tile position of a lon/lat at a zoom level.
///
/// No domain checks: longitudes outside [-180, 180] or latitudes at or beyond
/// the poles yield out-of-range or NaN values, which propagate unchanged.
pub fn tile_fraction(lon: f64, lat: f64, zoom: u32) -> (f64, f64) {
    let n = 2f64.powi(zoom as i32);
    let lat_rad = lat.to_radians();

    let x = (lon + 180.0) / 360.0 * n;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

    (x, y)
}

/// Convert longitude/latitude to the tile containing it.
///
/// `x = floor((lon + 180) / 360 * 2^z)`,
/// `y = floor((1 - ln(tan(lat) + sec(lat)) / π) / 2 * 2^z)`.
///
/// The floor is cast with Rust's saturating float-to-int conversion, so a NaN
/// position lands on index 0 rather than being rejected.
pub fn lon_lat_to_tile(lon: f64, lat: f64, zoom: u32) -> TileCoord {
    let (x, y) = tile_fraction(lon, lat, zoom);
    TileCoord {
        z: zoom,
        x: x.floor() as u32,
        y: y.floor() as u32,
    }
}

/// Convert a tile index to its geographic footprint (inverse Mercator).
pub fn tile_to_bounds(x: u32, y: u32, zoom: u32) -> TileBounds {
    let n = 2f64.powi(zoom as i32);

    let lon_min = x as f64 / n * 360.0 - 180.0;
    let lon_max = (x as f64 + 1.0) / n * 360.0 - 180.0;

    let lat_max = (PI * (1.0 - 2.0 * y as f64 / n)).sinh().atan().to_degrees();
    let lat_min = (PI * (1.0 - 2.0 * (y as f64 + 1.0) / n))
        .sinh()
        .atan()
        .to_degrees();

    TileBounds {
        lon_min,
        lon_max,
        lat_min,
        lat_max,
    }
}

/// Ground distance covered by one decoded pixel, in meters.
///
/// `C · cos(lat) / (256 · 2^z)` at 1x, divided by the resolution multiplier
/// because denser tiles pack more pixels into the same footprint.
pub fn cell_size_meters(zoom: u32, lat: f64, resolution: TileResolution) -> f64 {
    let nominal =
        EARTH_CIRCUMFERENCE_M * lat.to_radians().cos() / (BASE_TILE_SIZE as f64 * 2f64.powi(zoom as i32));
    nominal / resolution.multiplier() as f64
}

/// True footprint of the stitched tile grid covering `bounds`.
pub fn grid_bounds(bounds: &GeoBounds, zoom: u32) -> GridFootprint {
    TileRange::covering(bounds, zoom).footprint()
}

/// An inclusive rectangular range of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRange {
    pub zoom: u32,
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    /// The tiles spanning from the north-west to the south-east corner of `bounds`.
    pub fn covering(bounds: &GeoBounds, zoom: u32) -> Self {
        let nw = lon_lat_to_tile(bounds.west(), bounds.north(), zoom);
        let se = lon_lat_to_tile(bounds.east(), bounds.south(), zoom);

        Self {
            zoom,
            x_min: nw.x.min(se.x),
            x_max: nw.x.max(se.x),
            y_min: nw.y.min(se.y),
            y_max: nw.y.max(se.y),
        }
    }

    /// Number of tile columns.
    pub fn cols(&self) -> usize {
        (self.x_max - self.x_min) as usize + 1
    }

    /// Number of tile rows.
    pub fn rows(&self) -> usize {
        (self.y_max - self.y_min) as usize + 1
    }

    /// Total number of tiles in the range.
    pub fn len(&self) -> usize {
        self.cols() * self.rows()
    }

    /// A range always holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Every tile with its (col, row) offset inside the range, row-major.
    pub fn tiles(&self) -> impl Iterator<Item = (TileCoord, usize, usize)> + '_ {
        (self.y_min..=self.y_max).flat_map(move |y| {
            (self.x_min..=self.x_max).map(move |x| {
                (
                    TileCoord::new(self.zoom, x, y),
                    (x - self.x_min) as usize,
                    (y - self.y_min) as usize,
                )
            })
        })
    }

    /// Geographic footprint of the whole range.
    pub fn footprint(&self) -> GridFootprint {
        let nw = tile_to_bounds(self.x_min, self.y_min, self.zoom);
        let se = tile_to_bounds(self.x_max, self.y_max, self.zoom);

        GridFootprint {
            north: nw.lat_max,
            south: se.lat_min,
            east: se.lon_max,
            west: nw.lon_min,
        }
    }
}
