//! Common test fixtures for powder overlay tests.
//!
//! This module provides pre-defined regions, wind series and weather
//! payloads that represent common scenarios.

use powder_common::GeoBounds;

/// Common regions as (south, west, north, east).
pub mod regions {
    /// Alta / Little Cottonwood Canyon, UT
    pub const ALTA: (f64, f64, f64, f64) = (40.560, -111.680, 40.610, -111.600);

    /// Mount Baker backcountry, WA
    pub const BAKER: (f64, f64, f64, f64) = (48.820, -121.720, 48.880, -121.620);

    /// Chamonix valley
    pub const CHAMONIX: (f64, f64, f64, f64) = (45.880, 6.820, 45.960, 6.940);

    /// Inverted corners (south above north)
    pub const INVERTED: (f64, f64, f64, f64) = (41.0, -111.0, 40.0, -110.0);
}

/// Build validated bounds from a region tuple.
pub fn bounds(region: (f64, f64, f64, f64)) -> GeoBounds {
    GeoBounds::new(region.0, region.1, region.2, region.3).expect("fixture bounds are valid")
}

/// Hourly wind series as parallel arrays.
#[derive(Debug, Clone, Default)]
pub struct WindFixture {
    pub speed_mph: Vec<Option<f64>>,
    pub direction_deg: Vec<Option<f64>>,
    pub gust_mph: Vec<Option<f64>>,
    pub precip_in: Vec<Option<f64>>,
}

impl WindFixture {
    pub fn len(&self) -> usize {
        self.speed_mph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speed_mph.is_empty()
    }
}

/// `hours` of constant wind with no precipitation.
pub fn steady_wind(hours: usize, speed_mph: f64, direction_deg: f64) -> WindFixture {
    WindFixture {
        speed_mph: vec![Some(speed_mph); hours],
        direction_deg: vec![Some(direction_deg); hours],
        gust_mph: vec![Some(speed_mph * 1.5); hours],
        precip_in: vec![Some(0.0); hours],
    }
}

/// A storm: dry westerly hours followed by snowy north-westerly hours.
///
/// The snowy hours dominate the weighted direction.
pub fn storm_wind() -> WindFixture {
    let mut fx = WindFixture::default();
    for _ in 0..6 {
        fx.speed_mph.push(Some(20.0));
        fx.direction_deg.push(Some(270.0));
        fx.gust_mph.push(Some(28.0));
        fx.precip_in.push(Some(0.0));
    }
    for _ in 0..6 {
        fx.speed_mph.push(Some(20.0));
        fx.direction_deg.push(Some(315.0));
        fx.gust_mph.push(Some(41.0));
        fx.precip_in.push(Some(0.2));
    }
    fx
}

/// SNOTEL-style hourly report: 24 h, snow depth rising from 40 to 46 in.
pub const STATION_CSV: &str = "\
#------------------------------------------------- WARNING ------------------------------------------
# Provisional data, subject to revision.
#
Date,Snow Depth (in) Start of Hour Values,Precipitation Accumulation (in) Start of Hour Values
2024-01-10 00:00,40,20.1
2024-01-10 06:00,41,20.2
2024-01-10 12:00,43,20.4
2024-01-10 18:00,45,20.6
2024-01-11 00:00,46,20.7
";

/// Station report with a single usable record.
pub const STATION_CSV_SPARSE: &str = "\
Date,Snow Depth (in) Start of Hour Values,Precipitation Accumulation (in) Start of Hour Values
2024-01-10 00:00,40,20.1
2024-01-10 06:00,,
";

/// Open-Meteo-style hourly forecast, 4 hours of westerly wind.
pub const MODEL_JSON: &str = r#"{
  "latitude": 40.58,
  "longitude": -111.64,
  "hourly_units": {
    "snowfall": "inch",
    "precipitation": "inch",
    "wind_speed_10m": "mp/h"
  },
  "hourly": {
    "time": ["2024-01-10T00:00", "2024-01-10T01:00", "2024-01-10T02:00", "2024-01-10T03:00"],
    "snowfall": [0.5, 1.0, 1.5, null],
    "precipitation": [0.05, 0.10, 0.15, 0.0],
    "wind_speed_10m": [20.0, 25.0, null, 30.0],
    "wind_direction_10m": [270.0, 270.0, 260.0, 270.0],
    "wind_gusts_10m": [30.0, 38.0, 41.0, null]
  }
}"#;
