//! Error types for tile encoding.

use raster::DataType;
use thiserror::Error;

use crate::PixelFormat;

/// Errors that can occur while parsing colormaps or encoding tiles.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A colormap string could not be parsed.
    #[error("invalid colormap: {0}")]
    InvalidColormap(String),

    /// A colormap maps the same value twice.
    #[error("colormap value {0} is mapped more than once")]
    DuplicateColormapValue(u8),

    /// A colormap has more entries than a PNG palette can hold.
    #[error("colormap has {0} entries, at most 255 are allowed")]
    TooManyColormapEntries(usize),

    /// A color in a colormap is not `#RGB`, `#RRGGBB` or `#RRGGBBAA`.
    #[error("invalid hex color {0:?}")]
    InvalidColor(String),

    /// The encoder cannot produce this format from these pixels.
    #[error("cannot encode {data_type} pixels as {format}")]
    UnsupportedFormat {
        data_type: DataType,
        format: PixelFormat,
    },

    /// Pixel count disagrees with the image dimensions.
    #[error("expected {expected} pixels for the image, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// Compression failed.
    #[error("IDAT compression failed: {0}")]
    Compression(#[from] std::io::Error),
}

impl RenderError {
    /// Create an InvalidColormap error.
    pub fn invalid_colormap(msg: impl Into<String>) -> Self {
        Self::InvalidColormap(msg.into())
    }
}

/// Result type alias using RenderError.
pub type Result<T> = std::result::Result<T, RenderError>;
