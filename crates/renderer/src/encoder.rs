//! Tile encoder chosen once per run from the raster's pixel type.

use num_traits::ToPrimitive;
use raster::{DataType, Pixel, PixelBuffer};
use tracing::debug;

use crate::png::{
    create_png_gray16, create_png_gray8, create_png_indexed, create_png_rgb, create_png_rgba,
};
use crate::{Colormap, PixelFormat, RenderError, Result};

/// Encodes pixel buffers of one data type to PNG.
///
/// Each worker owns a clone so the conversion buffers are never shared.
#[derive(Debug, Clone)]
pub struct TileEncoder {
    format: PixelFormat,
    data_type: DataType,
    colormap: Option<Colormap>,
    bytes: Vec<u8>,
    words: Vec<u16>,
    packed: Vec<u32>,
}

impl TileEncoder {
    /// Pick the natural format for `data_type`.
    ///
    /// u8 becomes grayscale, or paletted when a colormap is given; u16 becomes
    /// 16-bit grayscale; u32 is read as packed `0x00RRGGBB` RGB.
    pub fn new(data_type: DataType, colormap: Option<Colormap>, nodata: f64) -> Result<Self> {
        let format = match (data_type, colormap.is_some()) {
            (DataType::UInt8, true) => PixelFormat::Paletted8,
            (DataType::UInt8, false) => PixelFormat::Gray8,
            (DataType::UInt16, _) => PixelFormat::Gray16,
            (DataType::UInt32, _) => PixelFormat::Rgb24,
        };
        Self::with_format(format, data_type, colormap, nodata)
    }

    /// Use an explicit format, checking it against the pixel type.
    ///
    /// In paletted output the nodata value always maps to the transparent
    /// palette entry.
    pub fn with_format(
        format: PixelFormat,
        data_type: DataType,
        colormap: Option<Colormap>,
        nodata: f64,
    ) -> Result<Self> {
        let compatible = matches!(
            (format, data_type),
            (PixelFormat::Gray8 | PixelFormat::Paletted8, DataType::UInt8)
                | (PixelFormat::Gray16, DataType::UInt16)
                | (PixelFormat::Rgb24 | PixelFormat::Rgba32, DataType::UInt32)
        );
        if !compatible {
            return Err(RenderError::UnsupportedFormat { data_type, format });
        }

        let colormap = match (format, colormap) {
            (PixelFormat::Paletted8, Some(mut cmap)) => {
                if let Some(value) = nodata.to_u8().filter(|v| *v as f64 == nodata) {
                    cmap.make_transparent(value);
                }
                Some(cmap)
            }
            (PixelFormat::Paletted8, None) => {
                return Err(RenderError::invalid_colormap(
                    "paletted output needs a colormap",
                ))
            }
            (_, Some(_)) => {
                return Err(RenderError::UnsupportedFormat {
                    data_type,
                    format: PixelFormat::Paletted8,
                })
            }
            (_, None) => None,
        };

        debug!(%format, %data_type, "Tile encoder ready");

        Ok(Self {
            format,
            data_type,
            colormap,
            bytes: Vec::new(),
            words: Vec::new(),
            packed: Vec::new(),
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn colormap(&self) -> Option<&Colormap> {
        self.colormap.as_ref()
    }

    /// Encode a tile to PNG bytes.
    pub fn encode<T: Pixel>(&mut self, tile: &PixelBuffer<T>) -> Result<Vec<u8>> {
        if T::DATA_TYPE != self.data_type {
            return Err(RenderError::UnsupportedFormat {
                data_type: T::DATA_TYPE,
                format: self.format,
            });
        }

        let (width, height) = (tile.width(), tile.height());
        let pixels = tile.as_slice();

        match self.format {
            PixelFormat::Gray8 => {
                refill(&mut self.bytes, pixels, |v| v.to_u8().unwrap_or_default());
                create_png_gray8(&self.bytes, width, height)
            }
            PixelFormat::Paletted8 => {
                let Some(cmap) = self.colormap.as_ref() else {
                    return Err(RenderError::invalid_colormap(
                        "paletted output needs a colormap",
                    ));
                };
                refill(&mut self.bytes, pixels, |v| {
                    cmap.index(v.to_u8().unwrap_or_default())
                });
                create_png_indexed(&self.bytes, width, height, cmap.palette())
            }
            PixelFormat::Gray16 => {
                refill(&mut self.words, pixels, |v| v.to_u16().unwrap_or_default());
                create_png_gray16(&self.words, width, height)
            }
            PixelFormat::Rgb24 => {
                refill(&mut self.packed, pixels, |v| v.to_u32().unwrap_or_default());
                create_png_rgb(&self.packed, width, height)
            }
            PixelFormat::Rgba32 => {
                refill(&mut self.packed, pixels, |v| v.to_u32().unwrap_or_default());
                create_png_rgba(&self.packed, width, height)
            }
        }
    }
}

fn refill<T: Copy, U>(dst: &mut Vec<U>, src: &[T], convert: impl Fn(T) -> U) {
    dst.clear();
    dst.extend(src.iter().map(|&v| convert(v)));
}
