//! Reading one tile out of a raster view.
//!
//! A tile's Mercator bounds become a fractional window in the view's grid.
//! The window is clipped to the pixels the view actually has, read at tile
//! resolution, and pasted into a nodata-filled tile when it only covers part
//! of the tile.

use serde::{Deserialize, Serialize};
use tile_common::{Affine, TileId};
use tracing::trace;

use crate::{window_from_bounds, window_transform, PixelBuffer, RasterView, ReadWindow, Result};

/// Whether tiles that only partly overlap the raster are checked for nodata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeTilePolicy {
    /// Partial tiles always count as having data.
    #[default]
    AssumeData,
    /// Partial tiles made only of nodata are dropped like full ones.
    CheckNodata,
}

/// How a tile overlapped the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// No source pixel falls in the tile.
    Outside,
    /// The raster covers the whole tile.
    Full,
    /// The raster covers part of the tile; the rest is nodata.
    Partial,
}

/// Outcome of a tile read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileRead {
    pub has_data: bool,
    pub coverage: Coverage,
    /// Transform of the tile's pixels in the view's CRS.
    pub transform: Affine,
}

/// Reusable tile buffers for one worker.
#[derive(Debug)]
pub struct TileReader<T> {
    tile_size: usize,
    policy: EdgeTilePolicy,
    tile: PixelBuffer<T>,
    scratch: PixelBuffer<T>,
}

impl<T: crate::Pixel> TileReader<T> {
    pub fn new(tile_size: usize, policy: EdgeTilePolicy) -> Self {
        Self {
            tile_size,
            policy,
            tile: PixelBuffer::new(tile_size, tile_size, T::default()),
            scratch: PixelBuffer::new(0, 0, T::default()),
        }
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// The tile filled by the last [`TileReader::read`].
    pub fn buffer(&self) -> &PixelBuffer<T> {
        &self.tile
    }

    /// Read `tile` from `view` into the tile buffer.
    pub fn read<V>(&mut self, view: &mut V, tile: TileId) -> Result<TileRead>
    where
        V: RasterView<Pixel = T> + ?Sized,
    {
        let nodata = view.nodata();
        let size = self.tile_size as f64;
        self.tile.fill(nodata);

        let transform = view.transform();
        let tile_bounds = tile.mercator_bounds();
        if transform.is_degenerate() {
            return Ok(outside(transform));
        }

        let window = window_from_bounds(&transform, &tile_bounds);
        let tile_transform =
            window_transform(&window, &transform).scale(window.width / size, window.height / size);

        // Tile pixels hanging off each side of the raster.
        let view_bounds = view.bounds();
        let (xres, yres) = tile_transform.resolution();
        let left = ((view_bounds.min_x - tile_bounds.min_x) / xres).round().max(0.0);
        let right = ((tile_bounds.max_x - view_bounds.max_x) / xres).round().max(0.0);
        let bottom = ((view_bounds.min_y - tile_bounds.min_y) / yres).round().max(0.0);
        let top = ((tile_bounds.max_y - view_bounds.max_y) / yres).round().max(0.0);

        let width = size - left - right;
        let height = size - top - bottom;

        // Clip the window to the pixels the view has.
        let (view_w, view_h) = (view.width() as f64, view.height() as f64);
        let x_start = window.x_off.clamp(0.0, view_w).round();
        let y_start = window.y_off.clamp(0.0, view_h).round();
        let x_stop = (window.x_off + window.width).min(view_w).max(0.0);
        let y_stop = (window.y_off + window.height).min(view_h).max(0.0);
        let read_w = ((x_stop - x_start) + 0.5).floor();
        let read_h = ((y_stop - y_start) + 0.5).floor();

        trace!(
            tile = %tile,
            %window,
            left, right, top, bottom,
            read_w, read_h,
            "Tile window"
        );

        if !(read_w > 0.0 && read_h > 0.0 && width > 0.0 && height > 0.0) {
            return Ok(outside(tile_transform));
        }

        let read = ReadWindow::new(
            x_start as usize,
            y_start as usize,
            read_w as usize,
            read_h as usize,
        );

        if width == size && height == size {
            view.read(read, &mut self.tile)?;
            return Ok(TileRead {
                has_data: !self.tile.all_equal(nodata),
                coverage: Coverage::Full,
                transform: tile_transform,
            });
        }

        self.scratch.reshape(width as usize, height as usize, nodata);
        view.read(read, &mut self.scratch)?;
        self.tile.paste(&self.scratch, top as i64, left as i64)?;

        let has_data = match self.policy {
            EdgeTilePolicy::AssumeData => true,
            EdgeTilePolicy::CheckNodata => !self.scratch.all_equal(nodata),
        };

        Ok(TileRead {
            has_data,
            coverage: Coverage::Partial,
            transform: tile_transform,
        })
    }
}

fn outside(transform: Affine) -> TileRead {
    TileRead {
        has_data: false,
        coverage: Coverage::Outside,
        transform,
    }
}

/// Read one tile into a freshly allocated buffer.
///
/// Workers keep a [`TileReader`] instead so buffers are reused.
pub fn read_tile<V: RasterView + ?Sized>(
    view: &mut V,
    tile: TileId,
    tile_size: usize,
    policy: EdgeTilePolicy,
) -> Result<(PixelBuffer<V::Pixel>, TileRead)> {
    let mut reader = TileReader::new(tile_size, policy);
    let read = reader.read(view, tile)?;
    Ok((reader.tile, read))
}
