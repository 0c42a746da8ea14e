//! Raster access and tile cropping.
//!
//! This crate turns a single-band raster into tile-sized pixel blocks:
//!
//! ```text
//! GeoTIFF ──► MemoryRaster<T> ──► MercatorSource<T> ──open_view()──► MercatorWarp<T>
//!                                                                        │
//!                         TileId ──► window_from_bounds ──► TileReader::read
//!                                                                        │
//!                                                                 PixelBuffer<T>
//! ```
//!
//! - [`pixel`]: the scalar types a raster may hold
//! - [`buffer`]: row-major pixel blocks with fill, nodata checks and paste
//! - [`window`]: fractional pixel windows derived from map bounds
//! - [`crop`]: the tile read algorithm, clipping tiles against raster edges
//! - [`view`]: the traits the pipeline reads through
//! - [`memory`], [`warp`], [`geotiff`]: the concrete rasters

pub mod buffer;
pub mod crop;
pub mod error;
pub mod geotiff;
pub mod memory;
pub mod pixel;
pub mod view;
pub mod warp;
pub mod window;

pub use buffer::PixelBuffer;
pub use crop::{read_tile, Coverage, EdgeTilePolicy, TileRead, TileReader};
pub use error::{RasterError, Result};
pub use geotiff::{open_geotiff, AnyRaster};
pub use memory::MemoryRaster;
pub use pixel::{DataType, Pixel};
pub use view::{Crs, RasterInfo, RasterSource, RasterView, ReadWindow};
pub use warp::{MercatorSource, MercatorWarp};
pub use window::{window_from_bounds, window_transform, Window};
