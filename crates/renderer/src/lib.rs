//! PNG encoding for raster tiles.
//!
//! - [`png`]: the PNG writer for grayscale, paletted and truecolor layouts
//! - [`colormap`]: `<value>:<hex>` colormaps for 8-bit rasters
//! - [`encoder`]: picks a layout from the raster's pixel type and encodes tiles

pub mod colormap;
pub mod encoder;
pub mod error;
pub mod png;

pub use colormap::{parse_hex, Colormap};
pub use encoder::TileEncoder;
pub use error::{RenderError, Result};
pub use png::{PixelFormat, Rgba};
