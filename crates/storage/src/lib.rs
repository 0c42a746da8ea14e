//! Tile storage for rastertiler.
//!
//! Provides the MBTiles writer the tiling pipeline stores PNG tiles in:
//! - [`TileStore`]: creates the file, writes metadata, finalizes and closes
//! - [`TileConnection`]: one pooled connection per worker for tile writes

pub mod error;
pub mod mbtiles;
pub mod metadata;

pub use error::{Result, StorageError};
pub use mbtiles::{remove_store_files, tile_hash, TileConnection, TileEntry, TileStore, EXTENSION};
pub use metadata::Metadata;
