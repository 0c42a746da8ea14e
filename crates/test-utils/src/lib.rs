//! Shared test utilities for the rastertiler workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Approximate equality macros for coordinates and bounds
//! - Synthetic raster generators
//! - Georeferencing fixtures
//! - Temporary output paths
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures, gradient_u8};
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
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
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro for approximate equality of coordinate pairs.
///
/// ```ignore
/// assert_coords_approx_eq!((1.0001, 2.0001), (1.0, 2.0), 0.001);
/// ```
#[macro_export]
macro_rules! assert_coords_approx_eq {
    (($x1:expr, $y1:expr), ($x2:expr, $y2:expr), $epsilon:expr) => {{
        $crate::assert_approx_eq!($x1, $x2, $epsilon);
        $crate::assert_approx_eq!($y1, $y2, $epsilon);
    }};
}

/// Approximate equality for anything with `min_x`, `min_y`, `max_x`, `max_y`
/// fields against a `(min_x, min_y, max_x, max_y)` tuple.
///
/// ```ignore
/// assert_bounds_approx_eq!(tile.geo_bounds(), (-180.0, -85.05, 180.0, 85.05), 0.01);
/// ```
#[macro_export]
macro_rules! assert_bounds_approx_eq {
    ($bounds:expr, ($x0:expr, $y0:expr, $x1:expr, $y1:expr), $epsilon:expr) => {{
        let bounds = $bounds;
        $crate::assert_approx_eq!(bounds.min_x, $x0, $epsilon);
        $crate::assert_approx_eq!(bounds.min_y, $y0, $epsilon);
        $crate::assert_approx_eq!(bounds.max_x, $x1, $epsilon);
        $crate::assert_approx_eq!(bounds.max_y, $y1, $epsilon);
    }};
}

#[cfg(test)]
mod tests {
    struct B {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    }

    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 1.0, 0.001);
    }

    #[test]
    fn test_assert_coords_approx_eq_passes() {
        assert_coords_approx_eq!((1.0001, 2.0001), (1.0, 2.0), 0.001);
    }

    #[test]
    fn test_assert_bounds_approx_eq_passes() {
        let b = B {
            min_x: -1.0,
            min_y: -2.0,
            max_x: 3.00001,
            max_y: 4.0,
        };
        assert_bounds_approx_eq!(b, (-1.0, -2.0, 3.0, 4.0), 0.001);
    }
}
