//! Error types for raster access.

use thiserror::Error;

use crate::view::ReadWindow;

/// Errors that can occur while opening or reading a raster.
#[derive(Error, Debug)]
pub enum RasterError {
    /// Failed to open the raster.
    #[error("failed to open raster: {0}")]
    OpenFailed(String),

    /// A read fell outside the raster or into a wrongly sized buffer.
    #[error("failed to read {window}: {message}")]
    ReadFailed { window: ReadWindow, message: String },

    /// The raster holds samples this tool does not tile.
    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    /// The raster is in a CRS the warp cannot handle.
    #[error("unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// Missing or unusable georeferencing.
    #[error("invalid georeference: {0}")]
    InvalidGeoreference(String),

    /// The nodata value cannot be stored in the raster's pixel type.
    #[error("nodata value {value} does not fit in {data_type}")]
    NodataOutOfRange { value: f64, data_type: String },

    /// A buffer's length disagrees with its dimensions.
    #[error("buffer of {len} pixels cannot hold {width}x{height}")]
    BufferSize { width: usize, height: usize, len: usize },

    /// Paste would write outside the target buffer.
    #[error("cannot paste {src_width}x{src_height} at row {row}, col {col} into {dst_width}x{dst_height}")]
    PasteOutOfBounds {
        row: i64,
        col: i64,
        src_width: usize,
        src_height: usize,
        dst_width: usize,
        dst_height: usize,
    },

    /// TIFF decoding error.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RasterError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(window: ReadWindow, msg: impl Into<String>) -> Self {
        Self::ReadFailed {
            window,
            message: msg.into(),
        }
    }

    /// Create an InvalidGeoreference error.
    pub fn invalid_georeference(msg: impl Into<String>) -> Self {
        Self::InvalidGeoreference(msg.into())
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
