//! Piecewise-linear color ramps.

use serde::{Deserialize, Serialize};

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A color pinned at a score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub score: f32,
    pub color: Color,
}

impl ColorStop {
    pub const fn new(score: f32, r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            score,
            color: Color::new(r, g, b, a),
        }
    }
}

const POWDER_STOPS: [ColorStop; 6] = [
    ColorStop::new(0.00, 0, 0, 0, 0),
    ColorStop::new(0.35, 0, 0, 0, 0),
    ColorStop::new(0.50, 80, 160, 255, 110),
    ColorStop::new(0.65, 40, 200, 120, 150),
    ColorStop::new(0.80, 250, 210, 40, 180),
    ColorStop::new(1.00, 235, 40, 120, 210),
];

/// Powder overlay ramp. Scores at or below 0.35 are fully transparent.
pub const POWDER_RAMP: ColorRamp<'static> = ColorRamp::new(&POWDER_STOPS);

/// Ordered color stops, linearly interpolated in RGBA.
///
/// Scores below the first stop take its color; above the last, the last one's.
#[derive(Debug, Clone, Copy)]
pub struct ColorRamp<'a> {
    stops: &'a [ColorStop],
}

impl<'a> ColorRamp<'a> {
    /// Stops must be sorted by ascending score.
    pub const fn new(stops: &'a [ColorStop]) -> Self {
        Self { stops }
    }

    pub fn stops(&self) -> &[ColorStop] {
        self.stops
    }

    /// Color for a score.
    pub fn color_at(&self, score: f32) -> Color {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Color::transparent(),
        };

        if score.is_nan() || score <= first.score {
            return first.color;
        }
        if score >= last.score {
            return last.color;
        }

        for pair in self.stops.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if score <= hi.score {
                let span = hi.score - lo.score;
                let t = if span > 0.0 { (score - lo.score) / span } else { 1.0 };
                return interpolate_color(lo.color, hi.color, t);
            }
        }

        last.color
    }
}

fn interpolate_color(from: Color, to: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;

    Color::new(
        lerp(from.r, to.r),
        lerp(from.g, to.g),
        lerp(from.b, to.b),
        lerp(from.a, to.a),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_stops() {
        for stop in POWDER_RAMP.stops() {
            assert_eq!(POWDER_RAMP.color_at(stop.score), stop.color);
        }
    }

    #[test]
    fn test_low_scores_transparent() {
        for score in [-1.0, 0.0, 0.1, 0.2, 0.35] {
            assert_eq!(POWDER_RAMP.color_at(score).a, 0, "score {score}");
        }
        assert!(POWDER_RAMP.color_at(0.36).a > 0);
    }

    #[test]
    fn test_midpoint_interpolation() {
        // Halfway between 0.50 and 0.65
        let c = POWDER_RAMP.color_at(0.575);
        assert_eq!((c.r, c.g, c.a), (60, 180, 130));
        assert!((187..=188).contains(&c.b));
    }

    #[test]
    fn test_clamps_above_one() {
        assert_eq!(POWDER_RAMP.color_at(7.0), Color::new(235, 40, 120, 210));
    }

    #[test]
    fn test_empty_ramp() {
        assert_eq!(ColorRamp::new(&[]).color_at(0.5), Color::transparent());
    }
}
