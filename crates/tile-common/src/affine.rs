//! Two-dimensional affine transforms.
//!
//! Coefficients follow the usual raster georeferencing layout:
//!
//! ```text
//! | x' |   | a  b  c |   | x |
//! | y' | = | d  e  f | * | y |
//! | 1  |   | 0  0  1 |   | 1 |
//! ```
//!
//! `a` and `e` are pixel width and height (height is negative for north-up
//! rasters), `c` and `f` locate the upper-left corner of the grid.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An immutable 2-D affine transform.
///
/// Every operation returns a new value. `invert` requires a non-degenerate
/// transform; callers guarantee `a*e - b*d != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    pub fn translation(x: f64, y: f64) -> Self {
        Self::new(1.0, 0.0, x, 0.0, 1.0, y)
    }

    /// Build from a GDAL geotransform `[c, a, b, f, d, e]`.
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(gt[1], gt[2], gt[0], gt[4], gt[5], gt[3])
    }

    /// Inverse of [`Affine::from_gdal`].
    pub fn to_gdal(&self) -> [f64; 6] {
        [self.c, self.a, self.b, self.f, self.d, self.e]
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// True when the linear part collapses the plane and cannot be inverted.
    pub fn is_degenerate(&self) -> bool {
        let det = self.determinant();
        det == 0.0 || !det.is_finite()
    }

    /// Closed-form inverse of the transform.
    pub fn invert(&self) -> Affine {
        let inv_det = 1.0 / self.determinant();

        let a = self.e * inv_det;
        let b = -self.b * inv_det;
        let d = -self.d * inv_det;
        let e = self.a * inv_det;

        Affine {
            a,
            b,
            c: -self.c * a - self.f * b,
            d,
            e,
            f: -self.c * d - self.f * e,
        }
    }

    /// Apply the transform to a point.
    #[inline]
    pub fn multiply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.a + y * self.b + self.c,
            x * self.d + y * self.e + self.f,
        )
    }

    /// Scale the pixel size, leaving the translation untouched.
    pub fn scale(&self, sx: f64, sy: f64) -> Affine {
        Affine {
            a: self.a * sx,
            e: self.e * sy,
            ..*self
        }
    }

    /// Matrix product `self * other`: apply `other` first, then `self`.
    pub fn compose(&self, other: &Affine) -> Affine {
        Affine {
            a: self.a * other.a + self.b * other.d,
            b: self.a * other.b + self.b * other.e,
            c: self.a * other.c + self.b * other.f + self.c,
            d: self.d * other.a + self.e * other.d,
            e: self.d * other.b + self.e * other.e,
            f: self.d * other.c + self.e * other.f + self.f,
        }
    }

    /// Pixel size magnitudes `(|a|, |e|)`.
    pub fn resolution(&self) -> (f64, f64) {
        (self.a.abs(), self.e.abs())
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for Affine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "| {:.6}, {:.6}, {:.6} |", self.a, self.b, self.c)?;
        write!(f, "| {:.6}, {:.6}, {:.6} |", self.d, self.e, self.f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_invert_known_values() {
        let t = Affine::new(30.0, 0.0, 1000.0, 0.0, -30.0, 2000.0);
        let inv = t.invert();
        assert!(approx(inv.a, 1.0 / 30.0));
        assert!(approx(inv.e, -1.0 / 30.0));
        assert!(approx(inv.c, -1000.0 / 30.0));
        assert!(approx(inv.f, 2000.0 / 30.0));
    }

    #[test]
    fn test_round_trip_with_rotation() {
        let t = Affine::new(2.0, 0.5, -10.0, -0.25, -3.0, 40.0);
        let inv = t.invert();
        for &(x, y) in &[(0.0, 0.0), (12.5, -7.0), (1e4, 3e3)] {
            let (mx, my) = t.multiply(x, y);
            let (px, py) = inv.multiply(mx, my);
            assert!((px - x).abs() < 1e-6, "x: {} vs {}", px, x);
            assert!((py - y).abs() < 1e-6, "y: {} vs {}", py, y);
        }
    }

    #[test]
    fn test_scale_keeps_translation() {
        let t = Affine::new(10.0, 0.0, 5.0, 0.0, -10.0, 7.0);
        let s = t.scale(0.5, 2.0);
        assert_eq!(s, Affine::new(5.0, 0.0, 5.0, 0.0, -20.0, 7.0));
        assert_eq!(s.resolution(), (5.0, 20.0));
    }

    #[test]
    fn test_compose_with_inverse_is_identity() {
        let t = Affine::new(3.0, 1.0, 4.0, 1.0, -5.0, 9.0);
        let id = t.compose(&t.invert());
        assert!(approx(id.a, 1.0) && approx(id.b, 0.0) && approx(id.c, 0.0));
        assert!(approx(id.d, 0.0) && approx(id.e, 1.0) && approx(id.f, 0.0));
    }

    #[test]
    fn test_gdal_order() {
        let gt = [100.0, 2.0, 0.0, 500.0, 0.0, -2.0];
        let t = Affine::from_gdal(gt);
        assert_eq!(t, Affine::new(2.0, 0.0, 100.0, 0.0, -2.0, 500.0));
        assert_eq!(t.to_gdal(), gt);
    }

    #[test]
    fn test_degenerate() {
        assert!(Affine::new(1.0, 2.0, 0.0, 2.0, 4.0, 0.0).is_degenerate());
        assert!(!Affine::identity().is_degenerate());
    }
}
