//! Single-band GeoTIFF reader.
//!
//! Decodes the whole image into a [`MemoryRaster`] and reads the GeoTIFF
//! georeferencing tags:
//! - ModelTransformation, or ModelPixelScale + ModelTiepoint
//! - the GeoKey directory for the CRS (EPSG:4326 and EPSG:3857)
//! - GDAL_NODATA for the nodata value (0 when absent)

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;
use tile_common::Affine;
use tracing::{info, warn};

use crate::{Crs, DataType, MemoryRaster, Pixel, RasterError, RasterView, Result};

// GeoTIFF tag IDs
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

// GeoKey IDs
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;

/// A decoded raster of whichever pixel type the file holds.
#[derive(Debug, Clone)]
pub enum AnyRaster {
    UInt8(MemoryRaster<u8>),
    UInt16(MemoryRaster<u16>),
    UInt32(MemoryRaster<u32>),
}

impl AnyRaster {
    pub fn data_type(&self) -> DataType {
        match self {
            AnyRaster::UInt8(_) => DataType::UInt8,
            AnyRaster::UInt16(_) => DataType::UInt16,
            AnyRaster::UInt32(_) => DataType::UInt32,
        }
    }

    pub fn crs(&self) -> Crs {
        match self {
            AnyRaster::UInt8(r) => r.crs(),
            AnyRaster::UInt16(r) => r.crs(),
            AnyRaster::UInt32(r) => r.crs(),
        }
    }
}

/// Open and decode a single-band GeoTIFF.
pub fn open_geotiff(path: &Path) -> Result<AnyRaster> {
    let file = File::open(path)
        .map_err(|e| RasterError::open_failed(format!("{}: {}", path.display(), e)))?;
    let mut decoder = Decoder::new(BufReader::new(file))?;

    let (width, height) = decoder.dimensions()?;
    let data_type = match decoder.colortype()? {
        ColorType::Gray(bits) => DataType::from_bits(bits).ok_or_else(|| {
            RasterError::UnsupportedDataType(format!("{}-bit samples", bits))
        })?,
        other => {
            return Err(RasterError::UnsupportedDataType(format!(
                "{:?} (only single-band rasters are supported)",
                other
            )))
        }
    };

    let transform = read_transform(&mut decoder)?;
    let crs = read_crs(&mut decoder)?;
    let nodata = read_nodata(&mut decoder)?;
    let (w, h) = (width as usize, height as usize);

    let raster = match decoder.read_image()? {
        DecodingResult::U8(data) => {
            AnyRaster::UInt8(build(w, h, transform, crs, nodata, data)?)
        }
        DecodingResult::U16(data) => {
            AnyRaster::UInt16(build(w, h, transform, crs, nodata, data)?)
        }
        DecodingResult::U32(data) => {
            AnyRaster::UInt32(build(w, h, transform, crs, nodata, data)?)
        }
        _ => {
            return Err(RasterError::UnsupportedDataType(format!(
                "{} with a signed or floating point sample format",
                data_type
            )))
        }
    };

    info!(
        path = %path.display(),
        width,
        height,
        crs = %crs,
        data_type = %raster.data_type(),
        nodata,
        "Opened GeoTIFF"
    );

    Ok(raster)
}

fn build<T: Pixel>(
    width: usize,
    height: usize,
    transform: Affine,
    crs: Crs,
    nodata: f64,
    data: Vec<T>,
) -> Result<MemoryRaster<T>> {
    MemoryRaster::new(width, height, transform, crs, T::from_nodata(nodata)?, data)
}

fn find_f64_vec<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> Result<Option<Vec<f64>>> {
    Ok(decoder
        .find_tag(Tag::from_u16_exhaustive(code))?
        .map(|value| value.into_f64_vec())
        .transpose()?)
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Affine> {
    if let Some(m) = find_f64_vec(decoder, MODEL_TRANSFORMATION)? {
        if m.len() < 16 {
            return Err(RasterError::invalid_georeference(format!(
                "ModelTransformation has {} values, expected 16",
                m.len()
            )));
        }
        return Ok(Affine::new(m[0], m[1], m[3], m[4], m[5], m[7]));
    }

    let scale = find_f64_vec(decoder, MODEL_PIXEL_SCALE)?
        .ok_or_else(|| RasterError::invalid_georeference("missing ModelPixelScale tag"))?;
    let tiepoint = find_f64_vec(decoder, MODEL_TIEPOINT)?
        .ok_or_else(|| RasterError::invalid_georeference("missing ModelTiepoint tag"))?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(RasterError::invalid_georeference(
            "ModelPixelScale or ModelTiepoint is too short",
        ));
    }

    // Tiepoint ties raster (i, j) to model (x, y).
    let (sx, sy) = (scale[0], scale[1]);
    let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
    Ok(Affine::new(sx, 0.0, x - i * sx, 0.0, -sy, y + j * sy))
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Crs> {
    let directory = decoder
        .find_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))?
        .map(|value| value.into_u16_vec())
        .transpose()?;

    let Some(directory) = directory else {
        warn!("GeoTIFF has no GeoKey directory, assuming EPSG:4326");
        return Ok(Crs::Wgs84);
    };

    // Header is 4 shorts, then (key, location, count, value) entries.
    // Only keys stored inline (location 0) matter here.
    let keys: HashMap<u16, u16> = directory
        .get(4..)
        .unwrap_or_default()
        .chunks_exact(4)
        .filter(|entry| entry[1] == 0)
        .map(|entry| (entry[0], entry[3]))
        .collect();

    let lookup = |key: u16| -> Result<Option<Crs>> {
        match keys.get(&key) {
            Some(&code) => Crs::from_epsg(code)
                .map(Some)
                .ok_or_else(|| RasterError::UnsupportedCrs(format!("EPSG:{}", code))),
            None => Ok(None),
        }
    };

    match keys.get(&GT_MODEL_TYPE_GEO_KEY) {
        Some(&MODEL_TYPE_PROJECTED) => lookup(PROJECTED_CS_TYPE_GEO_KEY)?.ok_or_else(|| {
            RasterError::UnsupportedCrs("projected CRS without an EPSG code".to_string())
        }),
        Some(&MODEL_TYPE_GEOGRAPHIC) => Ok(lookup(GEOGRAPHIC_TYPE_GEO_KEY)?.unwrap_or(Crs::Wgs84)),
        Some(&other) => Err(RasterError::UnsupportedCrs(format!(
            "GeoTIFF model type {}",
            other
        ))),
        None => Ok(lookup(PROJECTED_CS_TYPE_GEO_KEY)?
            .or(lookup(GEOGRAPHIC_TYPE_GEO_KEY)?)
            .unwrap_or(Crs::Wgs84)),
    }
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<f64> {
    let text = decoder
        .find_tag(Tag::from_u16_exhaustive(GDAL_NODATA))?
        .map(|value| value.into_string())
        .transpose()?;

    match text {
        Some(text) => {
            let trimmed = text.trim_matches(char::from(0)).trim();
            trimmed.parse::<f64>().map_err(|_| {
                RasterError::open_failed(format!("unreadable GDAL_NODATA value {:?}", trimmed))
            })
        }
        None => Ok(0.0),
    }
}
