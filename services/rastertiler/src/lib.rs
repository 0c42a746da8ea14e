//! Tile a single-band raster into a Web Mercator PNG pyramid stored as
//! MBTiles.
//!
//! ```ignore
//! let config = TilerConfig { maxzoom: 8, ..TilerConfig::new("dem.tif", "dem.mbtiles") };
//! let summary = Tiler::new(config)?.run().await?;
//! ```

pub mod config;
pub mod pipeline;
pub mod progress;

pub use config::{ConfigError, TilerConfig, MAX_TILE_SIZE};
pub use pipeline::{Tiler, TilingSummary, ZoomSummary};
pub use progress::TileProgress;
