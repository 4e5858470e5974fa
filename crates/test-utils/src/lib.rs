//! Shared test utilities for the powder overlay workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic elevation surfaces and Terrain-RGB tile payloads
//! - Wind and weather fixtures
//! - Temporary cache directories
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Approximate equality of two compass bearings, treating 0 and 360 as equal.
#[macro_export]
macro_rules! assert_bearing_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let mut diff = (left - right).rem_euclid(360.0);
        if diff > 180.0 {
            diff = 360.0 - diff;
        }
        if diff > $epsilon as f64 {
            panic!(
                "assertion failed: bearings differ\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`",
                left, right, diff
            );
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_bearing_eq_wraps() {
        assert_bearing_eq!(359.9, 0.1, 0.5);
        assert_bearing_eq!(0.0, 360.0, 1e-9);
    }

    #[test]
    #[should_panic(expected = "bearings differ")]
    fn test_assert_bearing_eq_fails() {
        assert_bearing_eq!(90.0, 270.0, 1.0);
    }
}
