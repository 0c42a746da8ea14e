//! Error types for tile math.

use thiserror::Error;

/// Result type alias using TileError.
pub type TileResult<T> = Result<T, TileError>;

/// Errors raised when building tile identities from untrusted input.
#[derive(Debug, Error)]
pub enum TileError {
    #[error("zoom level {0} exceeds the maximum of {max}", max = crate::MAX_ZOOM)]
    ZoomOutOfRange(u8),

    #[error("tile {zoom}/{x}/{y} is outside the {n}x{n} grid of its zoom level")]
    InvalidTile { zoom: u8, x: u32, y: u32, n: u64 },
}
