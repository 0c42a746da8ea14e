//! Common georeferencing fixtures.
//!
//! Values are plain tuples so every crate in the workspace can use them
//! without depending on each other.

/// Geographic extents as `(min_lon, min_lat, max_lon, max_lat)`.
pub mod extent {
    /// The whole Web Mercator world in degrees.
    pub const WORLD: (f64, f64, f64, f64) = (-180.0, -85.051129, 180.0, 85.051129);

    /// A one degree square that sits inside tile 3/4/3.
    pub const SMALL: (f64, f64, f64, f64) = (10.0, 30.0, 11.0, 31.0);
}

/// Geotransforms in `(a, b, c, d, e, f)` order.
pub mod transform {
    /// 30 m pixels with the upper-left corner at (1000, 2000).
    pub const THIRTY_METER: (f64, f64, f64, f64, f64, f64) =
        (30.0, 0.0, 1000.0, 0.0, -30.0, 2000.0);
}

/// Colormap strings in the `--colormap` format.
pub mod colormaps {
    pub const THREE_CLASSES: &str = "1:#FF0000,2:#00FF00,3:#0000FF";

    pub const SHORT_HEX: &str = "10:#F00, 20:#0F0";

    pub const MALFORMED: &str = "1:#FF0000,2";
}
