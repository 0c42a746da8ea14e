//! Web Mercator tile identities and geodesy.
//!
//! Tiles are numbered from the upper-left of the pyramid: `x` grows east,
//! `y` grows south. Each zoom level splits the world into `2^zoom` tiles per
//! side.

use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Bounds, TileError, TileResult};

/// WGS84 semi-major axis in meters.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Half of the Mercator world extent.
pub const ORIGIN: f64 = EARTH_RADIUS * PI;

/// Circumference of the Mercator world.
pub const CE: f64 = 2.0 * ORIGIN;

/// Latitude limit of the square Mercator world.
pub const MAX_LATITUDE: f64 = 85.051129;

/// Deepest zoom level accepted by the tiler.
pub const MAX_ZOOM: u8 = 24;

pub const WORLD_MERCATOR_BOUNDS: Bounds = Bounds {
    min_x: -ORIGIN,
    min_y: -ORIGIN,
    max_x: ORIGIN,
    max_y: ORIGIN,
};

const TILE_EPSILON: f64 = 1e-14;
const RANGE_EPSILON: f64 = 1e-11;

/// A tile coordinate (zoom/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }

    /// Build a tile, rejecting coordinates outside the zoom level's grid.
    pub fn checked(zoom: u8, x: u32, y: u32) -> TileResult<Self> {
        if zoom > MAX_ZOOM {
            return Err(TileError::ZoomOutOfRange(zoom));
        }
        let tile = Self { zoom, x, y };
        if !tile.is_valid() {
            return Err(TileError::InvalidTile {
                zoom,
                x,
                y,
                n: tiles_per_side(zoom),
            });
        }
        Ok(tile)
    }

    pub fn is_valid(&self) -> bool {
        let n = tiles_per_side(self.zoom);
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Geographic bounds in degrees.
    pub fn geo_bounds(&self) -> Bounds {
        let n = tiles_per_side(self.zoom) as f64;
        let x = self.x as f64;
        let y = self.y as f64;

        let lat = |row: f64| (PI * (1.0 - 2.0 * row / n)).sinh().atan().to_degrees();

        Bounds {
            min_x: x / n * 360.0 - 180.0,
            min_y: lat(y + 1.0),
            max_x: (x + 1.0) / n * 360.0 - 180.0,
            max_y: lat(y),
        }
    }

    /// Web Mercator bounds in meters.
    pub fn mercator_bounds(&self) -> Bounds {
        let tile_span = CE / tiles_per_side(self.zoom) as f64;
        let min_x = self.x as f64 * tile_span - CE / 2.0;
        let max_y = CE / 2.0 - self.y as f64 * tile_span;

        Bounds {
            min_x,
            min_y: max_y - tile_span,
            max_x: min_x + tile_span,
            max_y,
        }
    }

    /// Row number with the bottom-left origin used by TMS and MBTiles.
    pub fn flipped_y(&self) -> u32 {
        (tiles_per_side(self.zoom) - 1 - self.y as u64) as u32
    }

    pub fn parent(&self) -> Option<TileId> {
        if self.zoom == 0 {
            return None;
        }
        Some(TileId {
            zoom: self.zoom - 1,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    pub fn children(&self) -> [TileId; 4] {
        let x = self.x * 2;
        let y = self.y * 2;
        let zoom = self.zoom + 1;
        [
            TileId { zoom, x, y },
            TileId { zoom, x: x + 1, y },
            TileId { zoom, x, y: y + 1 },
            TileId {
                zoom,
                x: x + 1,
                y: y + 1,
            },
        ]
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one side of the grid at `zoom`.
fn tiles_per_side(zoom: u8) -> u64 {
    1u64 << zoom
}

/// Project longitude/latitude degrees to Web Mercator meters.
///
/// Inputs are clamped to the valid Mercator range first.
pub fn geo_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lon = lon.clamp(-180.0, 180.0);
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * ORIGIN / 180.0;
    let y = EARTH_RADIUS * (PI / 4.0 + 0.5 * lat.to_radians()).tan().ln();
    (x, y)
}

/// Inverse of [`geo_to_mercator`].
pub fn mercator_to_geo(x: f64, y: f64) -> (f64, f64) {
    let lon = x * 180.0 / ORIGIN;
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
    (lon, lat)
}

/// The tile at `zoom` containing a geographic point.
///
/// Points on the east or south edge of the world fall on the last tile.
pub fn geo_to_tile(lon: f64, lat: f64, zoom: u8) -> TileId {
    let z2 = tiles_per_side(zoom) as f64;
    let last = z2 - 1.0;

    let x = (lon / 360.0 + 0.5).max(0.0);
    let tile_x = if x >= 1.0 {
        last
    } else {
        ((x + TILE_EPSILON) * z2).floor().min(last)
    };

    let sin_lat = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / PI;
    let tile_y = if y >= 1.0 {
        last
    } else {
        ((y + TILE_EPSILON) * z2).floor().clamp(0.0, last)
    };

    TileId::new(zoom, tile_x as u32, tile_y as u32)
}

/// Inclusive tile range covering Mercator `bounds` at `zoom`.
///
/// Returns `(min_tile, max_tile)` where `min_tile` is the upper-left tile.
/// Tile rows grow downward, so the top row comes from `bounds.max_y`.
pub fn tile_range(zoom: u8, bounds: &Bounds) -> (TileId, TileId) {
    let z2 = tiles_per_side(zoom) as f64;
    let last = z2 - 1.0;
    let clamp = |v: f64| v.clamp(0.0, last) as u32;

    let xmin = clamp(((bounds.min_x + ORIGIN) / CE * z2).floor());
    let xmax = clamp((((bounds.max_x + ORIGIN) / CE - RANGE_EPSILON) * z2).floor());
    let ymin = clamp(((1.0 - ((bounds.min_y + ORIGIN) / CE + RANGE_EPSILON)) * z2).floor());
    let ymax = clamp(((1.0 - (bounds.max_y + ORIGIN) / CE) * z2).floor());

    (TileId::new(zoom, xmin, ymax), TileId::new(zoom, xmax, ymin))
}

/// Every tile between `min` and `max` inclusive, column by column.
pub fn tiles_in_range(min: TileId, max: TileId) -> impl Iterator<Item = TileId> {
    let zoom = min.zoom;
    (min.x..=max.x).flat_map(move |x| (min.y..=max.y).map(move |y| TileId::new(zoom, x, y)))
}

/// Number of tiles yielded by [`tiles_in_range`].
pub fn tile_count(min: TileId, max: TileId) -> u64 {
    if max.x < min.x || max.y < min.y {
        return 0;
    }
    (max.x - min.x + 1) as u64 * (max.y - min.y + 1) as u64
}
