//! Per-pixel powder score.
//!
//! For a pixel with aspect `a`:
//!
//! ```text
//! snow_factor = clamp(snowfall / FULL_SNOW_INCHES, 0, 1)
//! leeward     = (wind_from + 180) mod 360
//! transport   = clamp(avg_wind / FULL_TRANSPORT_MPH, MIN_TRANSPORT, 1)
//! lee         = (cos(angle_difference(a, leeward)) + 1) / 2
//! score       = snow_factor * (NEUTRAL + (lee - NEUTRAL) * transport)
//! ```
//!
//! Pixels without a defined aspect score `snow_factor * NEUTRAL`.

use powder_common::{AspectGrid, ScoreGrid};
use rayon::prelude::*;
use tracing::debug;

/// Snowfall that saturates the snow factor, in inches.
pub const FULL_SNOW_INCHES: f64 = 6.0;

/// Average wind that saturates snow transport, in mph.
pub const FULL_TRANSPORT_MPH: f64 = 30.0;

/// Transport floor: even calm air shifts the score a little.
pub const MIN_TRANSPORT: f64 = 0.2;

/// Score for a pixel neither favored nor penalized by the wind.
pub const NEUTRAL: f64 = 0.5;

/// Weather inputs for one scoring run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    /// Direction the wind blows from, degrees.
    pub wind_from_deg: f64,
    pub snowfall_in: f64,
    /// Carried for reporting; not part of the formula.
    pub precip_in: f64,
    pub avg_wind_mph: f64,
}

/// Smallest absolute difference between two bearings, in [0, 180].
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Score every pixel of an aspect grid.
pub fn score_grid(aspect: &AspectGrid, inputs: &ScoreInputs) -> ScoreGrid {
    let (width, height) = (aspect.width(), aspect.height());

    let snowfall = if inputs.snowfall_in.is_finite() {
        inputs.snowfall_in
    } else {
        0.0
    };
    let snow_factor = (snowfall / FULL_SNOW_INCHES).clamp(0.0, 1.0);
    if snow_factor == 0.0 {
        debug!(width, height, "No new snow, zero score grid");
        return ScoreGrid::zeros(width, height);
    }

    let leeward = (inputs.wind_from_deg + 180.0).rem_euclid(360.0);
    let transport = (inputs.avg_wind_mph / FULL_TRANSPORT_MPH).clamp(MIN_TRANSPORT, 1.0);
    let undefined_score = (snow_factor * NEUTRAL) as f32;

    let mut scores = ScoreGrid::zeros(width, height);
    if width > 0 {
        scores
            .values_mut()
            .par_chunks_mut(width)
            .zip(aspect.values().par_chunks(width))
            .for_each(|(out, row)| {
                for (slot, value) in out.iter_mut().zip(row) {
                    *slot = match value {
                        None => undefined_score,
                        Some(a) => {
                            let diff = angle_difference(*a as f64, leeward);
                            let lee = (diff.to_radians().cos() + 1.0) / 2.0;
                            let score = snow_factor * (NEUTRAL + (lee - NEUTRAL) * transport);
                            score.clamp(0.0, 1.0) as f32
                        }
                    };
                }
            });
    }

    debug!(
        width,
        height,
        snow_factor,
        leeward,
        transport,
        "Scored aspect grid"
    );
    scores
}
