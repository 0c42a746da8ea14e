//! Rasters held in memory.

use std::sync::Arc;

use tile_common::Affine;
use tracing::debug;

use crate::{Crs, Pixel, PixelBuffer, RasterError, RasterView, ReadWindow, Result};

/// A decoded single-band grid.
///
/// Pixels live behind an `Arc`, so clones are cheap and share the same data.
#[derive(Debug, Clone)]
pub struct MemoryRaster<T> {
    width: usize,
    height: usize,
    transform: Affine,
    crs: Crs,
    nodata: T,
    data: Arc<[T]>,
}

impl<T: Pixel> MemoryRaster<T> {
    pub fn new(
        width: usize,
        height: usize,
        transform: Affine,
        crs: Crs,
        nodata: T,
        data: Vec<T>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RasterError::open_failed("raster has no pixels"));
        }
        if data.len() != width * height {
            return Err(RasterError::BufferSize {
                width,
                height,
                len: data.len(),
            });
        }
        if transform.is_degenerate() {
            return Err(RasterError::invalid_georeference(format!(
                "transform cannot be inverted:\n{}",
                transform
            )));
        }

        debug!(width, height, crs = %crs, data_type = %T::DATA_TYPE, "Created in-memory raster");

        Ok(Self {
            width,
            height,
            transform,
            crs,
            nodata,
            data: data.into(),
        })
    }

    /// Pixel at column `col`, row `row`.
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> T {
        self.data[row * self.width + col]
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }
}

impl<T: Pixel> RasterView for MemoryRaster<T> {
    type Pixel = T;

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn crs(&self) -> Crs {
        self.crs
    }

    fn nodata(&self) -> T {
        self.nodata
    }

    fn read(&mut self, window: ReadWindow, dst: &mut PixelBuffer<T>) -> Result<()> {
        if !window.fits(self.width, self.height) {
            return Err(RasterError::read_failed(
                window,
                format!("outside {}x{} raster", self.width, self.height),
            ));
        }

        let (dst_w, dst_h) = (dst.width(), dst.height());
        let cols = sample_positions(window.x_off, window.width, dst_w);
        let rows = sample_positions(window.y_off, window.height, dst_h);

        let out = dst.as_mut_slice();
        for (j, &row) in rows.iter().enumerate() {
            let src_row = &self.data[row * self.width..(row + 1) * self.width];
            let dst_row = &mut out[j * dst_w..(j + 1) * dst_w];
            for (value, &col) in dst_row.iter_mut().zip(&cols) {
                *value = src_row[col];
            }
        }
        Ok(())
    }
}

/// Nearest source index for each of `count` output samples spread over
/// `len` source pixels starting at `offset`.
fn sample_positions(offset: usize, len: usize, count: usize) -> Vec<usize> {
    let step = len as f64 / count as f64;
    (0..count)
        .map(|i| {
            let pos = ((i as f64 + 0.5) * step).floor() as usize;
            offset + pos.min(len - 1)
        })
        .collect()
}
