//! PNG encoding for tile pixel data.
//!
//! Supports five layouts:
//! - **Gray8 / Gray16 (color type 0)**: one sample per pixel, 16-bit samples
//!   stored big-endian.
//! - **Paletted8 (color type 3)**: one palette index per pixel, with a `tRNS`
//!   chunk when any palette entry is not opaque.
//! - **Rgb24 (color type 2)**: packed `0x00RRGGBB` values.
//! - **Rgba32 (color type 6)**: packed `0xAARRGGBB` values.
//!
//! Scanlines are written unfiltered and compressed with fast zlib, which is
//! the best trade for tiles that are encoded once and stored.

use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::{RenderError, Result};

/// PNG file signature
const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// An RGBA palette entry.
pub type Rgba = (u8, u8, u8, u8);

/// Pixel layout of an encoded tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    Gray8,
    Gray16,
    Paletted8,
    Rgb24,
    Rgba32,
}

impl PixelFormat {
    /// PNG color type written to IHDR.
    fn color_type(self) -> u8 {
        match self {
            PixelFormat::Gray8 | PixelFormat::Gray16 => 0,
            PixelFormat::Rgb24 => 2,
            PixelFormat::Paletted8 => 3,
            PixelFormat::Rgba32 => 6,
        }
    }

    fn bit_depth(self) -> u8 {
        match self {
            PixelFormat::Gray16 => 16,
            _ => 8,
        }
    }

    /// Bytes per pixel in a scanline.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 | PixelFormat::Paletted8 => 1,
            PixelFormat::Gray16 => 2,
            PixelFormat::Rgb24 => 3,
            PixelFormat::Rgba32 => 4,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PixelFormat::Gray8 => "8-bit grayscale",
            PixelFormat::Gray16 => "16-bit grayscale",
            PixelFormat::Paletted8 => "8-bit paletted",
            PixelFormat::Rgb24 => "24-bit RGB",
            PixelFormat::Rgba32 => "32-bit RGBA",
        };
        f.write_str(name)
    }
}

/// Create an 8-bit grayscale PNG.
pub fn create_png_gray8(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    check_len(pixels.len(), width, height)?;
    encode(PixelFormat::Gray8, width, height, None, |row, out| {
        out.extend_from_slice(&pixels[row * width..(row + 1) * width]);
    })
}

/// Create a 16-bit grayscale PNG.
pub fn create_png_gray16(pixels: &[u16], width: usize, height: usize) -> Result<Vec<u8>> {
    check_len(pixels.len(), width, height)?;
    encode(PixelFormat::Gray16, width, height, None, |row, out| {
        for v in &pixels[row * width..(row + 1) * width] {
            out.extend_from_slice(&v.to_be_bytes());
        }
    })
}

/// Create a 24-bit RGB PNG from packed `0x00RRGGBB` values.
pub fn create_png_rgb(pixels: &[u32], width: usize, height: usize) -> Result<Vec<u8>> {
    check_len(pixels.len(), width, height)?;
    encode(PixelFormat::Rgb24, width, height, None, |row, out| {
        for &v in &pixels[row * width..(row + 1) * width] {
            out.extend_from_slice(&[(v >> 16) as u8, (v >> 8) as u8, v as u8]);
        }
    })
}

/// Create a 32-bit RGBA PNG from packed `0xAARRGGBB` values.
pub fn create_png_rgba(pixels: &[u32], width: usize, height: usize) -> Result<Vec<u8>> {
    check_len(pixels.len(), width, height)?;
    encode(PixelFormat::Rgba32, width, height, None, |row, out| {
        for &v in &pixels[row * width..(row + 1) * width] {
            out.extend_from_slice(&[(v >> 16) as u8, (v >> 8) as u8, v as u8, (v >> 24) as u8]);
        }
    })
}

/// Create an indexed PNG (color type 3) from palette and indices.
pub fn create_png_indexed(
    indices: &[u8],
    width: usize,
    height: usize,
    palette: &[Rgba],
) -> Result<Vec<u8>> {
    check_len(indices.len(), width, height)?;
    if palette.is_empty() || palette.len() > 256 {
        return Err(RenderError::invalid_colormap(format!(
            "palette must have 1 to 256 entries, got {}",
            palette.len()
        )));
    }
    encode(PixelFormat::Paletted8, width, height, Some(palette), |row, out| {
        out.extend_from_slice(&indices[row * width..(row + 1) * width]);
    })
}

fn check_len(actual: usize, width: usize, height: usize) -> Result<()> {
    let expected = width * height;
    if actual != expected {
        return Err(RenderError::BufferSize { expected, actual });
    }
    Ok(())
}

/// Assemble a PNG, with `scanline` appending the bytes of one row.
fn encode<F>(
    format: PixelFormat,
    width: usize,
    height: usize,
    palette: Option<&[Rgba]>,
    mut scanline: F,
) -> Result<Vec<u8>>
where
    F: FnMut(usize, &mut Vec<u8>),
{
    let mut png = Vec::with_capacity(width * height * format.bytes_per_pixel() / 2 + 128);
    png.extend_from_slice(&SIGNATURE);

    // IHDR chunk
    let mut ihdr_data = Vec::with_capacity(13);
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(format.bit_depth());
    ihdr_data.push(format.color_type());
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    if let Some(palette) = palette {
        let plte_data: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
        write_chunk(&mut png, b"PLTE", &plte_data);

        if palette.iter().any(|&(_, _, _, a)| a < 255) {
            let trns_data: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
            write_chunk(&mut png, b"tRNS", &trns_data);
        }
    }

    // Each scanline is a filter byte (0 = none) followed by the row.
    let mut raw = Vec::with_capacity(height * (1 + width * format.bytes_per_pixel()));
    for row in 0..height {
        raw.push(0);
        scanline(row, &mut raw);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder.write_all(&raw)?;
    let idat_data = encoder.finish()?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk: length, type, data, then CRC over type and data.
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}
