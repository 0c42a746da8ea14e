//! Tests for tile PNG encoding.
//!
//! PNGs are taken apart chunk by chunk and the IDAT stream is inflated, so
//! the tests check the exact scanline bytes each layout produces.

use std::io::Read;

use raster::{DataType, PixelBuffer};
use renderer::png::{create_png_gray16, create_png_rgb, create_png_rgba};
use renderer::{Colormap, PixelFormat, TileEncoder};
use test_utils::{fixtures, generators};

// ============================================================================
// Helper functions
// ============================================================================

struct DecodedPng {
    width: u32,
    height: u32,
    bit_depth: u8,
    color_type: u8,
    palette: Option<Vec<u8>>,
    alpha: Option<Vec<u8>>,
    /// Inflated scanlines, filter bytes included.
    raw: Vec<u8>,
}

impl DecodedPng {
    /// Row `row` without its filter byte.
    fn row(&self, row: usize, bytes_per_pixel: usize) -> &[u8] {
        let stride = 1 + self.width as usize * bytes_per_pixel;
        let start = row * stride;
        assert_eq!(self.raw[start], 0, "unfiltered scanline expected");
        &self.raw[start + 1..start + stride]
    }
}

fn decode(png: &[u8]) -> DecodedPng {
    assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);

    let mut decoded = DecodedPng {
        width: 0,
        height: 0,
        bit_depth: 0,
        color_type: 0,
        palette: None,
        alpha: None,
        raw: Vec::new(),
    };
    let mut idat = Vec::new();
    let mut pos = 8;
    while pos < png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let kind = &png[pos + 4..pos + 8];
        let data = &png[pos + 8..pos + 8 + len];
        let crc = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());
        assert_eq!(crc, crc32fast::hash(&png[pos + 4..pos + 8 + len]), "bad CRC");

        match kind {
            b"IHDR" => {
                decoded.width = u32::from_be_bytes(data[0..4].try_into().unwrap());
                decoded.height = u32::from_be_bytes(data[4..8].try_into().unwrap());
                decoded.bit_depth = data[8];
                decoded.color_type = data[9];
            }
            b"PLTE" => decoded.palette = Some(data.to_vec()),
            b"tRNS" => decoded.alpha = Some(data.to_vec()),
            b"IDAT" => idat.extend_from_slice(data),
            b"IEND" => break,
            other => panic!("unexpected chunk {:?}", other),
        }
        pos += 12 + len;
    }

    flate2::read::ZlibDecoder::new(idat.as_slice())
        .read_to_end(&mut decoded.raw)
        .unwrap();
    decoded
}

// ============================================================================
// Grayscale
// ============================================================================

#[test]
fn test_gray8_tile_round_trips_pixels() {
    let data = generators::gradient_u8(16, 16);
    let tile = PixelBuffer::from_vec(16, 16, data.clone()).unwrap();
    let mut encoder = TileEncoder::new(DataType::UInt8, None, 0.0).unwrap();

    let png = decode(&encoder.encode(&tile).unwrap());
    assert_eq!((png.width, png.height), (16, 16));
    assert_eq!((png.bit_depth, png.color_type), (8, 0));
    assert!(png.palette.is_none());
    for row in 0..16 {
        assert_eq!(png.row(row, 1), &data[row * 16..(row + 1) * 16]);
    }
}

#[test]
fn test_gray16_is_big_endian() {
    let png = decode(&create_png_gray16(&[0x0102, 0xA0B0], 2, 1).unwrap());
    assert_eq!((png.bit_depth, png.color_type), (16, 0));
    assert_eq!(png.row(0, 2), &[0x01, 0x02, 0xA0, 0xB0]);
}

#[test]
fn test_gray16_tile() {
    let data = generators::ramp_u16(8, 4);
    let tile = PixelBuffer::from_vec(8, 4, data.clone()).unwrap();
    let mut encoder = TileEncoder::new(DataType::UInt16, None, 0.0).unwrap();

    let png = decode(&encoder.encode(&tile).unwrap());
    let first = png.row(0, 2);
    assert_eq!(u16::from_be_bytes([first[0], first[1]]), data[0]);
    assert_eq!(u16::from_be_bytes([first[14], first[15]]), data[7]);
}

// ============================================================================
// Truecolor
// ============================================================================

#[test]
fn test_rgb_unpacks_channels() {
    let png = decode(&create_png_rgb(&[0x00FF8001, 0xFF123456], 2, 1).unwrap());
    assert_eq!((png.bit_depth, png.color_type), (8, 2));
    // The top byte is ignored for RGB.
    assert_eq!(png.row(0, 3), &[0xFF, 0x80, 0x01, 0x12, 0x34, 0x56]);
}

#[test]
fn test_rgba_takes_alpha_from_top_byte() {
    let png = decode(&create_png_rgba(&[0x80FF0000, 0x0000FF00], 2, 1).unwrap());
    assert_eq!((png.bit_depth, png.color_type), (8, 6));
    assert_eq!(png.row(0, 4), &[0xFF, 0, 0, 0x80, 0, 0xFF, 0, 0]);
}

#[test]
fn test_u32_tile_through_encoder() {
    let tile = PixelBuffer::from_vec(2, 1, vec![0x00_11_22_33u32, 0x00_44_55_66]).unwrap();

    let mut rgb = TileEncoder::new(DataType::UInt32, None, 0.0).unwrap();
    let png = decode(&rgb.encode(&tile).unwrap());
    assert_eq!(png.row(0, 3), &[0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);

    let mut rgba =
        TileEncoder::with_format(PixelFormat::Rgba32, DataType::UInt32, None, 0.0).unwrap();
    let png = decode(&rgba.encode(&tile).unwrap());
    assert_eq!(png.color_type, 6);
    assert_eq!(png.row(0, 4)[3], 0);
}

// ============================================================================
// Paletted
// ============================================================================

#[test]
fn test_colormap_tile_uses_palette_indices() {
    let cmap = Colormap::parse(fixtures::colormaps::THREE_CLASSES).unwrap();
    let mut encoder = TileEncoder::new(DataType::UInt8, Some(cmap), 0.0).unwrap();
    let tile = PixelBuffer::from_vec(5, 1, vec![1u8, 2, 3, 0, 9]).unwrap();

    let png = decode(&encoder.encode(&tile).unwrap());
    assert_eq!((png.bit_depth, png.color_type), (8, 3));
    assert_eq!(
        png.palette.as_deref(),
        Some(&[255, 0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0][..])
    );
    assert_eq!(png.alpha.as_deref(), Some(&[255, 255, 255, 0][..]));
    // Nodata and unmapped values both land on the transparent entry.
    assert_eq!(png.row(0, 1), &[0, 1, 2, 3, 3]);
}

#[test]
fn test_short_hex_colormap() {
    let cmap = Colormap::parse(fixtures::colormaps::SHORT_HEX).unwrap();
    assert_eq!(cmap.palette()[0], (255, 0, 0, 255));
    assert_eq!(cmap.palette()[1], (0, 255, 0, 255));
    assert_eq!(cmap.index(20), 1);
}

#[test]
fn test_malformed_colormap_fixture() {
    assert!(Colormap::parse(fixtures::colormaps::MALFORMED).is_err());
}

#[test]
fn test_encoder_reused_across_tiles() {
    let mut encoder = TileEncoder::new(DataType::UInt8, None, 0.0).unwrap();
    let big = PixelBuffer::new(8, 8, 200u8);
    let small = PixelBuffer::new(2, 2, 7u8);

    encoder.encode(&big).unwrap();
    let png = decode(&encoder.encode(&small).unwrap());
    assert_eq!((png.width, png.height), (2, 2));
    assert_eq!(png.raw.len(), 2 * 3);
    assert_eq!(png.row(1, 1), &[7, 7]);
}

#[test]
fn test_identical_tiles_encode_identically() {
    let data = generators::checkerboard_u8(32, 32, 4, 10, 20);
    let a = PixelBuffer::from_vec(32, 32, data.clone()).unwrap();
    let b = PixelBuffer::from_vec(32, 32, data).unwrap();
    let mut encoder = TileEncoder::new(DataType::UInt8, None, 0.0).unwrap();

    let first = encoder.encode(&a).unwrap();
    let second = encoder.encode(&b).unwrap();
    assert_eq!(first, second);
}
