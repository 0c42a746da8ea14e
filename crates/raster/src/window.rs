//! Pixel windows.

use std::fmt;

use tile_common::{Affine, Bounds};

/// A fractional rectangle in a raster's own pixel grid.
///
/// Windows may start before pixel 0 or run past the last pixel; readers
/// clip them against the raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub x_off: f64,
    pub y_off: f64,
    pub width: f64,
    pub height: f64,
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "window(x: {:.3}, y: {:.3}, {:.3}x{:.3})",
            self.x_off, self.y_off, self.width, self.height
        )
    }
}

/// Pixel window of `bounds` in the grid described by `transform`.
///
/// All four corners go through the inverse transform so rotated grids get
/// an enclosing window.
pub fn window_from_bounds(transform: &Affine, bounds: &Bounds) -> Window {
    let inverse = transform.invert();
    let corners = bounds.corners().map(|(x, y)| inverse.multiply(x, y));

    let mut col_min = f64::INFINITY;
    let mut col_max = f64::NEG_INFINITY;
    let mut row_min = f64::INFINITY;
    let mut row_max = f64::NEG_INFINITY;
    for (col, row) in corners {
        col_min = col_min.min(col);
        col_max = col_max.max(col);
        row_min = row_min.min(row);
        row_max = row_max.max(row);
    }

    Window {
        x_off: col_min,
        y_off: row_min,
        width: col_max - col_min,
        height: row_max - row_min,
    }
}

/// Transform whose origin sits at the window's upper-left pixel.
pub fn window_transform(window: &Window, transform: &Affine) -> Affine {
    let (x, y) = transform.multiply(window.x_off, window.y_off);
    Affine {
        c: x,
        f: y,
        ..*transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_from_bounds() {
        let t = Affine::new(30.0, 0.0, 1000.0, 0.0, -30.0, 2000.0);
        let w = window_from_bounds(&t, &Bounds::new(0.0, 10.0, 100.0, 200.0));
        assert!((w.x_off - (-33.333333)).abs() < 1e-5);
        assert!((w.y_off - 60.0).abs() < 1e-9);
        assert!((w.width - 3.333333).abs() < 1e-5);
        assert!((w.height - 6.333333).abs() < 1e-5);
    }

    #[test]
    fn test_window_from_rotated_grid_encloses_all_corners() {
        // 90 degree rotation: columns run south, rows run east.
        let t = Affine::new(0.0, 1.0, 0.0, -1.0, 0.0, 0.0);
        let w = window_from_bounds(&t, &Bounds::new(0.0, -4.0, 2.0, 0.0));
        assert!((w.x_off - 0.0).abs() < 1e-12);
        assert!((w.y_off - 0.0).abs() < 1e-12);
        assert!((w.width - 4.0).abs() < 1e-12);
        assert!((w.height - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_window_transform_translates_only() {
        let t = Affine::new(30.0, 0.0, 1000.0, 0.0, -30.0, 2000.0);
        let w = Window {
            x_off: 10.0,
            y_off: 5.0,
            width: 3.0,
            height: 3.0,
        };
        let wt = window_transform(&w, &t);
        assert_eq!(wt, Affine::new(30.0, 0.0, 1300.0, 0.0, -30.0, 1850.0));
    }
}
