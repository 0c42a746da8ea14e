//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::tile::{geo_to_mercator, WORLD_MERCATOR_BOUNDS};

/// An axis-aligned rectangle.
///
/// For geographic coordinates (EPSG:4326) values are degrees, for Web
/// Mercator (EPSG:3857) they are meters. `new` always normalizes so that
/// `min_x <= max_x` and `min_y <= max_y`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Create bounds from two corners, in any order.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
        }
    }

    /// Smallest bounds enclosing every point.
    pub fn enclosing(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut iter = points.into_iter();
        let (x, y) = iter.next()?;
        let mut bounds = Self::new(x, y, x, y);
        for (x, y) in iter {
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// The four corners, clockwise from the upper-left.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_x, self.max_y),
            (self.max_x, self.max_y),
            (self.max_x, self.min_y),
            (self.min_x, self.min_y),
        ]
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Compute the intersection of two bounding boxes.
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        if !self.intersects(other) {
            return None;
        }

        Some(Bounds {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }

    /// Project geographic bounds to Web Mercator, clamped to the world extent.
    pub fn geo_to_mercator(&self) -> Bounds {
        let (x0, y0) = geo_to_mercator(self.min_x, self.min_y);
        let (x1, y1) = geo_to_mercator(self.max_x, self.max_y);
        let projected = Bounds::new(x0, y0, x1, y1);
        Bounds {
            min_x: projected.min_x.max(WORLD_MERCATOR_BOUNDS.min_x),
            min_y: projected.min_y.max(WORLD_MERCATOR_BOUNDS.min_y),
            max_x: projected.max_x.min(WORLD_MERCATOR_BOUNDS.max_x),
            max_y: projected.max_y.min(WORLD_MERCATOR_BOUNDS.max_y),
        }
    }

    /// `"minx,miny,maxx,maxy"` with five decimals, as stored in MBTiles metadata.
    pub fn to_metadata_string(&self) -> String {
        format!(
            "{:.5},{:.5},{:.5},{:.5}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
