//! Web Mercator views over geographic or Mercator rasters.
//!
//! The warp is lazy: nothing is resampled up front. Each read maps every
//! output pixel center back into the source grid and takes the nearest
//! source pixel; pixels falling outside the source get nodata.

use tile_common::{geo_to_mercator, mercator_to_geo, Affine, Bounds};
use tracing::info;

use crate::{
    Crs, MemoryRaster, Pixel, PixelBuffer, RasterError, RasterInfo, RasterSource, RasterView,
    ReadWindow, Result,
};

/// Sample points per edge when projecting the source outline.
const EDGE_SAMPLES: usize = 21;

/// Output grid of a warp.
#[derive(Debug, Clone, Copy, PartialEq)]
struct WarpGrid {
    width: usize,
    height: usize,
    transform: Affine,
}

/// Source that opens Web Mercator views over a decoded raster.
#[derive(Debug, Clone)]
pub struct MercatorSource<T> {
    raster: MemoryRaster<T>,
    grid: WarpGrid,
    info: RasterInfo,
}

impl<T: Pixel> MercatorSource<T> {
    pub fn new(raster: MemoryRaster<T>) -> Result<Self> {
        let grid = match raster.crs() {
            Crs::WebMercator => WarpGrid {
                width: raster.width(),
                height: raster.height(),
                transform: raster.transform(),
            },
            Crs::Wgs84 => suggested_grid(&raster)?,
        };

        let native = raster.bounds();
        let geo_bounds = match raster.crs() {
            Crs::Wgs84 => native,
            Crs::WebMercator => {
                let (x0, y0) = mercator_to_geo(native.min_x, native.min_y);
                let (x1, y1) = mercator_to_geo(native.max_x, native.max_y);
                Bounds::new(x0, y0, x1, y1)
            }
        };

        let info = RasterInfo {
            width: grid.width,
            height: grid.height,
            transform: grid.transform,
            data_type: T::DATA_TYPE,
            nodata: raster.nodata().to_f64().unwrap_or_default(),
            mercator_bounds: grid_bounds(&grid),
            geo_bounds,
        };

        info!(
            source_crs = %raster.crs(),
            source_width = raster.width(),
            source_height = raster.height(),
            width = grid.width,
            height = grid.height,
            resolution = grid.transform.a,
            "Prepared Web Mercator view"
        );

        Ok(Self { raster, grid, info })
    }
}

impl<T: Pixel> RasterSource for MercatorSource<T> {
    type View = MercatorWarp<T>;

    fn info(&self) -> RasterInfo {
        self.info
    }

    fn open_view(&self) -> Result<MercatorWarp<T>> {
        Ok(MercatorWarp {
            source_inverse: self.raster.transform().invert(),
            raster: self.raster.clone(),
            grid: self.grid,
            cols: Vec::new(),
        })
    }
}

/// A worker's private Web Mercator view.
#[derive(Debug)]
pub struct MercatorWarp<T> {
    raster: MemoryRaster<T>,
    source_inverse: Affine,
    grid: WarpGrid,
    cols: Vec<f64>,
}

impl<T: Pixel> MercatorWarp<T> {
    /// Nearest source pixel for a Mercator coordinate.
    fn source_pixel(&self, mx: f64, my: f64) -> Option<(usize, usize)> {
        let (x, y) = match self.raster.crs() {
            Crs::WebMercator => (mx, my),
            Crs::Wgs84 => mercator_to_geo(mx, my),
        };
        let (col, row) = self.source_inverse.multiply(x, y);
        let (col, row) = (col.floor(), row.floor());
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.raster.width() || row >= self.raster.height() {
            return None;
        }
        Some((col, row))
    }
}

impl<T: Pixel> RasterView for MercatorWarp<T> {
    type Pixel = T;

    fn width(&self) -> usize {
        self.grid.width
    }

    fn height(&self) -> usize {
        self.grid.height
    }

    fn transform(&self) -> Affine {
        self.grid.transform
    }

    fn crs(&self) -> Crs {
        Crs::WebMercator
    }

    fn nodata(&self) -> T {
        self.raster.nodata()
    }

    fn read(&mut self, window: ReadWindow, dst: &mut PixelBuffer<T>) -> Result<()> {
        if !window.fits(self.grid.width, self.grid.height) {
            return Err(RasterError::read_failed(
                window,
                format!("outside {}x{} view", self.grid.width, self.grid.height),
            ));
        }

        let (dst_w, dst_h) = (dst.width(), dst.height());
        let x_step = window.width as f64 / dst_w as f64;
        let y_step = window.height as f64 / dst_h as f64;
        let t = self.grid.transform;
        let nodata = self.raster.nodata();

        // Fractional output pixel centers, reused across rows.
        self.cols.clear();
        self.cols
            .extend((0..dst_w).map(|i| window.x_off as f64 + (i as f64 + 0.5) * x_step));

        let out = dst.as_mut_slice();
        for j in 0..dst_h {
            let y = window.y_off as f64 + (j as f64 + 0.5) * y_step;
            for (i, &x) in self.cols.iter().enumerate() {
                let (mx, my) = t.multiply(x, y);
                out[j * dst_w + i] = match self.source_pixel(mx, my) {
                    Some((col, row)) => self.raster.get(col, row),
                    None => nodata,
                };
            }
        }
        Ok(())
    }
}

/// Output grid for reprojecting a geographic raster to Web Mercator.
///
/// The outline is densified and projected; the pixel size keeps the same
/// number of pixels along the diagonal as the source.
fn suggested_grid<T: Pixel>(raster: &MemoryRaster<T>) -> Result<WarpGrid> {
    let t = raster.transform();
    let (w, h) = (raster.width() as f64, raster.height() as f64);

    let mut outline = Vec::with_capacity(EDGE_SAMPLES * 4);
    for k in 0..EDGE_SAMPLES {
        let s = k as f64 / (EDGE_SAMPLES - 1) as f64;
        outline.extend([(s * w, 0.0), (s * w, h), (0.0, s * h), (w, s * h)]);
    }
    let projected = outline.into_iter().map(|(col, row)| {
        let (lon, lat) = t.multiply(col, row);
        geo_to_mercator(lon, lat)
    });
    let bounds = Bounds::enclosing(projected)
        .ok_or_else(|| RasterError::invalid_georeference("empty raster outline"))?;

    if !(bounds.width() > 0.0 && bounds.height() > 0.0) {
        return Err(RasterError::invalid_georeference(format!(
            "raster collapses to {:?} in Web Mercator",
            bounds
        )));
    }

    let diagonal_pixels = (w * w + h * h).sqrt();
    let diagonal_meters = (bounds.width().powi(2) + bounds.height().powi(2)).sqrt();
    let resolution = diagonal_meters / diagonal_pixels;

    let width = ((bounds.width() / resolution) + 0.5).floor().max(1.0) as usize;
    let height = ((bounds.height() / resolution) + 0.5).floor().max(1.0) as usize;

    Ok(WarpGrid {
        width,
        height,
        transform: Affine::new(resolution, 0.0, bounds.min_x, 0.0, -resolution, bounds.max_y),
    })
}

fn grid_bounds(grid: &WarpGrid) -> Bounds {
    let t = grid.transform;
    let (x0, y0) = t.multiply(0.0, 0.0);
    let (x1, y1) = t.multiply(grid.width as f64, grid.height as f64);
    Bounds::new(x0, y0, x1, y1)
}
