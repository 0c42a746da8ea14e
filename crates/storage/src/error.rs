//! Error types for the tile store.

use std::path::PathBuf;

use thiserror::Error;
use tile_common::TileError;

/// Errors that can occur while creating or writing a tile store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The output path is not a usable MBTiles path.
    #[error("invalid tile store path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Writing one tile failed; the transaction was rolled back.
    #[error("could not write tile {zoom}/{x}/{y}: {source}")]
    TileWrite {
        zoom: u8,
        x: u32,
        y: u32,
        source: sqlx::Error,
    },

    /// A `map` row whose coordinates do not fit a tile identity.
    #[error("malformed map row {zoom}/{column}/{row}")]
    MalformedRow { zoom: i64, column: i64, row: i64 },

    /// A `map` row outside the grid of its zoom level.
    #[error("invalid tile in map table: {0}")]
    InvalidTile(#[from] TileError),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using StorageError.
pub type Result<T> = std::result::Result<T, StorageError>;
