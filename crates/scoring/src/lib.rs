//! Powder scoring.
//!
//! - [`wind`] reduces an hourly wind series to one dominant wind
//! - [`score`] combines an aspect grid with snowfall and wind into a
//!   per-pixel score in [0, 1]

pub mod score;
pub mod wind;

pub use score::{
    angle_difference, score_grid, ScoreInputs, FULL_SNOW_INCHES, FULL_TRANSPORT_MPH,
    MIN_TRANSPORT, NEUTRAL,
};
pub use wind::{aggregate_wind, DominantWind, WindError, WindSample, WindSeries};
