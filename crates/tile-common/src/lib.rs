//! Common types shared across the rastertiler crates.
//!
//! - [`Affine`]: pixel <-> map coordinate transforms
//! - [`Bounds`]: axis-aligned rectangles in geographic or projected units
//! - [`TileId`]: Web Mercator tile identities and the geodesy around them

pub mod affine;
pub mod bbox;
pub mod error;
pub mod tile;

pub use affine::Affine;
pub use bbox::Bounds;
pub use error::{TileError, TileResult};
pub use tile::{
    geo_to_mercator, geo_to_tile, mercator_to_geo, tile_count, tile_range, tiles_in_range,
    TileId, CE, EARTH_RADIUS, MAX_LATITUDE, MAX_ZOOM, ORIGIN, WORLD_MERCATOR_BOUNDS,
};
