//! Traits the tiling pipeline reads rasters through.

use std::fmt;

use serde::{Deserialize, Serialize};
use tile_common::{Affine, Bounds};

use crate::{DataType, Pixel, PixelBuffer, Result};

/// Coordinate reference systems understood by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Crs {
    /// EPSG:4326, degrees.
    Wgs84,
    /// EPSG:3857, meters.
    WebMercator,
}

impl Crs {
    pub fn from_epsg(code: u16) -> Option<Self> {
        match code {
            4326 => Some(Crs::Wgs84),
            3857 => Some(Crs::WebMercator),
            _ => None,
        }
    }

    pub fn epsg(&self) -> u16 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// An integer pixel region to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadWindow {
    pub x_off: usize,
    pub y_off: usize,
    pub width: usize,
    pub height: usize,
}

impl ReadWindow {
    pub fn new(x_off: usize, y_off: usize, width: usize, height: usize) -> Self {
        Self {
            x_off,
            y_off,
            width,
            height,
        }
    }

    /// True when the region lies inside a `width x height` grid.
    pub fn fits(&self, width: usize, height: usize) -> bool {
        self.width > 0
            && self.height > 0
            && self.x_off + self.width <= width
            && self.y_off + self.height <= height
    }
}

impl fmt::Display for ReadWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} pixels at ({}, {})",
            self.width, self.height, self.x_off, self.y_off
        )
    }
}

/// A georeferenced single-band raster one worker reads from.
///
/// Views are not shared: every worker opens its own.
pub trait RasterView: Send {
    type Pixel: Pixel;

    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn transform(&self) -> Affine;

    fn crs(&self) -> Crs;

    fn nodata(&self) -> Self::Pixel;

    fn data_type(&self) -> DataType {
        Self::Pixel::DATA_TYPE
    }

    /// Bounds of the whole grid in the view's CRS.
    fn bounds(&self) -> Bounds {
        let t = self.transform();
        let (w, h) = (self.width() as f64, self.height() as f64);
        let corners = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)].map(|(c, r)| t.multiply(c, r));
        Bounds::enclosing(corners).unwrap_or_else(|| Bounds::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Read `window` into `dst`, resampling (nearest neighbour) when the
    /// window and `dst` differ in size.
    fn read(&mut self, window: ReadWindow, dst: &mut PixelBuffer<Self::Pixel>) -> Result<()>;
}

/// Facts about a source, as seen through the views it opens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    pub transform: Affine,
    pub data_type: DataType,
    pub nodata: f64,
    /// Web Mercator bounds of the view grid.
    pub mercator_bounds: Bounds,
    /// Geographic bounds of the original data.
    pub geo_bounds: Bounds,
}

/// Something that can hand each worker an independent view.
pub trait RasterSource: Send + Sync {
    type View: RasterView;

    fn info(&self) -> RasterInfo;

    fn open_view(&self) -> Result<Self::View>;
}
