//! Geographic bounding boxes.

use serde::{Deserialize, Serialize};

use crate::{PowderError, PowderResult};

/// A requested geographic region in WGS84 degrees.
///
/// Constructed through [`GeoBounds::new`], which enforces that the south-west
/// corner lies strictly south and west of the north-east corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBounds")]
pub struct GeoBounds {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

#[derive(Deserialize)]
struct RawBounds {
    south: f64,
    west: f64,
    north: f64,
    east: f64,
}

impl TryFrom<RawBounds> for GeoBounds {
    type Error = PowderError;

    fn try_from(raw: RawBounds) -> PowderResult<Self> {
        GeoBounds::new(raw.south, raw.west, raw.north, raw.east)
    }
}

impl GeoBounds {
    /// Create bounds from the south-west and north-east corners.
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> PowderResult<Self> {
        if !(south < north) || !(west < east) {
            return Err(PowderError::InvalidBounds(format!(
                "south-west ({south}, {west}) must be strictly south and west of north-east ({north}, {east})"
            )));
        }
        Ok(Self {
            south,
            west,
            north,
            east,
        })
    }

    /// Parse a "south,west,north,east" string.
    pub fn from_csv(s: &str) -> PowderResult<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(PowderError::InvalidBounds(format!(
                "expected 'south,west,north,east', got '{s}'"
            )));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| PowderError::InvalidBounds(format!("invalid number: {part}")))?;
        }

        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    /// Latitude of the box center, used for cell-size estimation.
    pub fn center_lat(&self) -> f64 {
        (self.south + self.north) / 2.0
    }

    /// Check if a point is contained within these bounds (edges inclusive).
    pub fn contains_point(&self, lon: f64, lat: f64) -> bool {
        lon >= self.west && lon <= self.east && lat >= self.south && lat <= self.north
    }

    /// Cache key fragment, quantized to avoid floating point noise.
    pub fn cache_key(&self) -> String {
        format!(
            "{:.6}_{:.6}_{:.6}_{:.6}",
            self.south, self.west, self.north, self.east
        )
    }
}

/// The true geographic footprint of a stitched tile grid.
///
/// Always covers at least the requested [`GeoBounds`] since tiles are whole
/// units; this is the rectangle an overlay is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridFootprint {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GridFootprint {
    /// Whether this footprint fully covers the given bounds.
    pub fn covers(&self, bounds: &GeoBounds) -> bool {
        self.north >= bounds.north()
            && self.south <= bounds.south()
            && self.east >= bounds.east()
            && self.west <= bounds.west()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_inverted_corners() {
        assert!(GeoBounds::new(40.0, -111.0, 41.0, -110.0).is_ok());
        assert!(GeoBounds::new(41.0, -111.0, 40.0, -110.0).is_err());
        assert!(GeoBounds::new(40.0, -110.0, 41.0, -111.0).is_err());
        assert!(GeoBounds::new(40.0, -111.0, 40.0, -110.0).is_err());
    }

    #[test]
    fn test_new_rejects_nan() {
        assert!(GeoBounds::new(f64::NAN, -111.0, 41.0, -110.0).is_err());
    }

    #[test]
    fn test_from_csv() {
        let b = GeoBounds::from_csv("40.55, -111.70, 40.62, -111.60").unwrap();
        assert_eq!(b.south(), 40.55);
        assert_eq!(b.west(), -111.70);
        assert_eq!(b.north(), 40.62);
        assert_eq!(b.east(), -111.60);

        assert!(GeoBounds::from_csv("1,2,3").is_err());
        assert!(GeoBounds::from_csv("a,b,c,d").is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<GeoBounds, _> =
            serde_json::from_str(r#"{"south":1.0,"west":2.0,"north":3.0,"east":4.0}"#);
        assert!(ok.is_ok());

        let bad: Result<GeoBounds, _> =
            serde_json::from_str(r#"{"south":3.0,"west":2.0,"north":1.0,"east":4.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_cache_key_is_quantized() {
        let a = GeoBounds::new(40.0, -111.0, 41.0, -110.0).unwrap();
        let b = GeoBounds::new(40.000_000_01, -111.0, 41.0, -110.0).unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
    }
}
