//! Dominant wind from an hourly series.
//!
//! Direction is a circular mean weighted toward snowy hours: each sample
//! with both speed and direction contributes `speed * (1 + 10 * precip)`.
//! The reported average speed is the plain mean over the same samples,
//! without the weighting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use powder_common::PowderError;

/// Extra weight per inch of precipitation in an hour.
const PRECIP_WEIGHT: f64 = 10.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindError {
    #[error("no wind signal: no samples with both speed and direction, or zero total weight")]
    NoSignal,

    #[error("wind series arrays differ in length: {0}")]
    LengthMismatch(String),
}

impl From<WindError> for PowderError {
    fn from(err: WindError) -> Self {
        match err {
            WindError::NoSignal => PowderError::NoWindSignal,
            WindError::LengthMismatch(msg) => PowderError::Decode(msg),
        }
    }
}

/// One hourly observation. Any field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    pub speed_mph: Option<f64>,
    /// Direction the wind blows from, degrees clockwise from north.
    pub direction_deg: Option<f64>,
    pub gust_mph: Option<f64>,
    pub precip_in: Option<f64>,
}

impl WindSample {
    pub fn new(speed_mph: f64, direction_deg: f64) -> Self {
        Self {
            speed_mph: Some(speed_mph),
            direction_deg: Some(direction_deg),
            ..Default::default()
        }
    }
}

/// An hourly wind series as parallel arrays, in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindSeries {
    pub speed_mph: Vec<Option<f64>>,
    pub direction_deg: Vec<Option<f64>>,
    pub gust_mph: Vec<Option<f64>>,
    pub precip_in: Vec<Option<f64>>,
}

impl WindSeries {
    pub fn len(&self) -> usize {
        self.speed_mph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speed_mph.is_empty()
    }

    /// Zip the arrays into samples. All arrays must have the same length.
    pub fn samples(&self) -> Result<Vec<WindSample>, WindError> {
        let n = self.speed_mph.len();
        let lengths = [
            self.direction_deg.len(),
            self.gust_mph.len(),
            self.precip_in.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(WindError::LengthMismatch(format!(
                "speed {}, direction {}, gust {}, precip {}",
                n, lengths[0], lengths[1], lengths[2]
            )));
        }

        Ok((0..n)
            .map(|i| WindSample {
                speed_mph: self.speed_mph[i],
                direction_deg: self.direction_deg[i],
                gust_mph: self.gust_mph[i],
                precip_in: self.precip_in[i],
            })
            .collect())
    }
}

/// Reduced wind over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DominantWind {
    /// Weighted circular mean of the from-direction, in [0, 360).
    pub direction_deg: f64,
    /// Unweighted mean speed over samples with speed and direction.
    pub avg_speed_mph: f64,
    /// Largest gust among samples with speed and direction, 0 if none report one.
    pub max_gust_mph: f64,
}

/// Aggregate samples into a [`DominantWind`].
pub fn aggregate_wind(samples: &[WindSample]) -> Result<DominantWind, WindError> {
    let mut sum_sin = 0.0;
    let mut sum_cos = 0.0;
    let mut total_weight = 0.0;
    let mut sum_speed = 0.0;
    let mut count = 0usize;
    let mut max_gust = 0.0f64;

    for sample in samples {
        let (Some(speed), Some(dir)) = (sample.speed_mph, sample.direction_deg) else {
            continue;
        };

        if let Some(gust) = sample.gust_mph {
            max_gust = max_gust.max(gust);
        }

        let weight = speed * (1.0 + sample.precip_in.unwrap_or(0.0) * PRECIP_WEIGHT);
        let rad = dir.to_radians();
        sum_sin += weight * rad.sin();
        sum_cos += weight * rad.cos();
        total_weight += weight;
        sum_speed += speed;
        count += 1;
    }

    if count == 0 || total_weight == 0.0 {
        return Err(WindError::NoSignal);
    }

    let mut direction = sum_sin.atan2(sum_cos).to_degrees();
    if direction < 0.0 {
        direction += 360.0;
    }
    if direction >= 360.0 {
        direction = 0.0;
    }

    Ok(DominantWind {
        direction_deg: direction,
        avg_speed_mph: sum_speed / count as f64,
        max_gust_mph: max_gust,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_sample_reproduced() {
        let sample = WindSample {
            speed_mph: Some(17.0),
            direction_deg: Some(225.0),
            gust_mph: Some(31.0),
            precip_in: Some(0.1),
        };
        let wind = aggregate_wind(&[sample]).unwrap();
        assert!((wind.direction_deg - 225.0).abs() < 1e-9);
        assert!((wind.avg_speed_mph - 17.0).abs() < 1e-12);
        assert_eq!(wind.max_gust_mph, 31.0);
    }

    #[test]
    fn test_circular_mean_across_north() {
        let wind = aggregate_wind(&[WindSample::new(10.0, 350.0), WindSample::new(10.0, 10.0)])
            .unwrap();
        assert!(wind.direction_deg < 1e-9 || wind.direction_deg > 360.0 - 1e-9);
    }

    #[test]
    fn test_precip_pulls_direction() {
        let dry = WindSample::new(10.0, 270.0);
        let snowy = WindSample {
            precip_in: Some(0.5),
            ..WindSample::new(10.0, 0.0)
        };
        let wind = aggregate_wind(&[dry, snowy]).unwrap();
        // Snowy hour weighs 6x: direction close to north, on the west side
        assert!(wind.direction_deg > 270.0 && wind.direction_deg < 360.0);
        assert!(wind.direction_deg > 340.0);
        // Average speed stays unweighted
        assert_eq!(wind.avg_speed_mph, 10.0);
    }

    #[test]
    fn test_gust_ignored_on_incomplete_samples() {
        let reported = WindSample {
            gust_mph: Some(12.0),
            ..WindSample::new(5.0, 90.0)
        };
        let gust_only = WindSample {
            gust_mph: Some(55.0),
            ..Default::default()
        };
        let wind = aggregate_wind(&[reported, gust_only]).unwrap();
        assert_eq!(wind.max_gust_mph, 12.0);
        assert_eq!(wind.avg_speed_mph, 5.0);
    }

    #[test]
    fn test_no_signal() {
        assert_eq!(aggregate_wind(&[]), Err(WindError::NoSignal));

        let missing_dir = WindSample {
            speed_mph: Some(10.0),
            ..Default::default()
        };
        assert_eq!(aggregate_wind(&[missing_dir]), Err(WindError::NoSignal));

        // Calm air: valid samples but zero weight
        assert_eq!(
            aggregate_wind(&[WindSample::new(0.0, 180.0)]),
            Err(WindError::NoSignal)
        );
    }

    #[test]
    fn test_series_length_mismatch() {
        let series = WindSeries {
            speed_mph: vec![Some(1.0), Some(2.0)],
            direction_deg: vec![Some(0.0)],
            gust_mph: vec![None, None],
            precip_in: vec![None, None],
        };
        assert!(matches!(series.samples(), Err(WindError::LengthMismatch(_))));
    }
}
