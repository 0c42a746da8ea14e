//! GeoTIFF reading tests against files written with the tiff encoder.

use std::fs::File;
use std::path::Path;

use raster::{open_geotiff, AnyRaster, Crs, DataType, RasterError, RasterView};
use test_utils::{assert_approx_eq, generators, temp_test_dir};
use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::Tag;

// ============================================================================
// Helper functions
// ============================================================================

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

enum Georef {
    /// Pixel size and the model coordinate of the upper-left corner.
    Tiepoint { scale: (f64, f64), origin: (f64, f64) },
    /// ModelTransformation values, normally a full 4x4 matrix.
    Matrix(Vec<f64>),
}

struct GeoTags {
    georef: Georef,
    epsg: Option<u16>,
    nodata: Option<&'static str>,
}

impl GeoTags {
    fn geographic(scale: f64, west: f64, north: f64) -> Self {
        Self {
            georef: Georef::Tiepoint {
                scale: (scale, scale),
                origin: (west, north),
            },
            epsg: Some(4326),
            nodata: None,
        }
    }
}

fn geokeys(epsg: u16) -> Vec<u16> {
    let (model_type, key) = if epsg == 4326 { (2, 2048) } else { (1, 3072) };
    vec![1, 1, 0, 2, 1024, 0, 1, model_type, key, 0, 1, epsg]
}

fn write_geotiff<C>(path: &Path, width: u32, height: u32, data: &[C::Inner], tags: &GeoTags)
where
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
{
    let file = File::create(path).unwrap();
    let mut tiff = TiffEncoder::new(file).unwrap();
    let mut image = tiff.new_image::<C>(width, height).unwrap();

    let dir = image.encoder();
    match &tags.georef {
        Georef::Tiepoint { scale, origin } => {
            let scale = [scale.0, scale.1, 0.0];
            let tiepoint = [0.0, 0.0, 0.0, origin.0, origin.1, 0.0];
            dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), scale.as_slice())
                .unwrap();
            dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), tiepoint.as_slice())
                .unwrap();
        }
        Georef::Matrix(m) => {
            dir.write_tag(Tag::Unknown(MODEL_TRANSFORMATION), m.as_slice())
                .unwrap();
        }
    }
    if let Some(epsg) = tags.epsg {
        dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), geokeys(epsg).as_slice())
            .unwrap();
    }
    if let Some(nodata) = tags.nodata {
        dir.write_tag(Tag::Unknown(GDAL_NODATA), nodata).unwrap();
    }

    image.write_data(data).unwrap();
}

// ============================================================================
// Pixel types
// ============================================================================

#[test]
fn test_open_u8_geographic() {
    let dir = temp_test_dir();
    let path = dir.path().join("gradient.tif");
    let data = generators::gradient_u8(20, 10);
    write_geotiff::<colortype::Gray8>(&path, 20, 10, &data, &GeoTags::geographic(0.5, 10.0, 45.0));

    let raster = open_geotiff(&path).unwrap();
    assert_eq!(raster.data_type(), DataType::UInt8);
    assert_eq!(raster.crs(), Crs::Wgs84);

    let AnyRaster::UInt8(r) = raster else {
        panic!("expected a u8 raster");
    };
    assert_eq!((r.width(), r.height()), (20, 10));
    assert_eq!(r.nodata(), 0);
    assert_eq!(r.data(), data.as_slice());

    let b = r.bounds();
    assert_approx_eq!(b.min_x, 10.0, 1e-9);
    assert_approx_eq!(b.max_x, 20.0, 1e-9);
    assert_approx_eq!(b.min_y, 40.0, 1e-9);
    assert_approx_eq!(b.max_y, 45.0, 1e-9);
}

#[test]
fn test_open_u16_with_nodata() {
    let dir = temp_test_dir();
    let path = dir.path().join("ramp.tif");
    let data = generators::ramp_u16(8, 8);
    let tags = GeoTags {
        nodata: Some("65535"),
        ..GeoTags::geographic(1.0, 0.0, 8.0)
    };
    write_geotiff::<colortype::Gray16>(&path, 8, 8, &data, &tags);

    let AnyRaster::UInt16(r) = open_geotiff(&path).unwrap() else {
        panic!("expected a u16 raster");
    };
    assert_eq!(r.nodata(), u16::MAX);
    assert_eq!(r.data(), data.as_slice());
}

#[test]
fn test_open_u32_mercator_transformation_matrix() {
    let dir = temp_test_dir();
    let path = dir.path().join("coded.tif");
    let data = generators::coded_u32(6, 4);
    let m = [
        100.0, 0.0, 0.0, 5000.0, //
        0.0, -100.0, 0.0, 9000.0, //
        0.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ];
    let tags = GeoTags {
        georef: Georef::Matrix(m.to_vec()),
        epsg: Some(3857),
        nodata: Some("0"),
    };
    write_geotiff::<colortype::Gray32>(&path, 6, 4, &data, &tags);

    let raster = open_geotiff(&path).unwrap();
    assert_eq!(raster.crs(), Crs::WebMercator);
    let AnyRaster::UInt32(r) = raster else {
        panic!("expected a u32 raster");
    };
    let t = r.transform();
    assert_approx_eq!(t.a, 100.0, 1e-9);
    assert_approx_eq!(t.c, 5000.0, 1e-9);
    assert_approx_eq!(t.e, -100.0, 1e-9);
    assert_approx_eq!(t.f, 9000.0, 1e-9);
    assert_eq!(r.get(5, 3), 5003);
}

// ============================================================================
// Georeferencing edge cases
// ============================================================================

#[test]
fn test_missing_geokeys_assumes_geographic() {
    let dir = temp_test_dir();
    let path = dir.path().join("nokeys.tif");
    let data = generators::gradient_u8(4, 4);
    let tags = GeoTags {
        epsg: None,
        ..GeoTags::geographic(1.0, 0.0, 4.0)
    };
    write_geotiff::<colortype::Gray8>(&path, 4, 4, &data, &tags);

    assert_eq!(open_geotiff(&path).unwrap().crs(), Crs::Wgs84);
}

#[test]
fn test_unsupported_crs_is_rejected() {
    let dir = temp_test_dir();
    let path = dir.path().join("utm.tif");
    let data = generators::gradient_u8(4, 4);
    let tags = GeoTags {
        epsg: Some(32633),
        ..GeoTags::geographic(30.0, 500000.0, 4000000.0)
    };
    write_geotiff::<colortype::Gray8>(&path, 4, 4, &data, &tags);

    let err = open_geotiff(&path).unwrap_err();
    assert!(matches!(err, RasterError::UnsupportedCrs(_)), "got {:?}", err);
}

#[test]
fn test_missing_georeference_is_rejected() {
    let dir = temp_test_dir();
    let path = dir.path().join("plain.tif");
    let file = File::create(&path).unwrap();
    let data = generators::gradient_u8(4, 4);
    TiffEncoder::new(file)
        .unwrap()
        .write_image::<colortype::Gray8>(4, 4, &data)
        .unwrap();

    let err = open_geotiff(&path).unwrap_err();
    assert!(
        matches!(err, RasterError::InvalidGeoreference(_)),
        "got {:?}",
        err
    );
}

#[test]
fn test_truncated_transformation_matrix_is_rejected() {
    let dir = temp_test_dir();
    let path = dir.path().join("short.tif");
    let data = generators::gradient_u8(4, 4);
    // Two rows of the matrix only.
    let tags = GeoTags {
        georef: Georef::Matrix(vec![
            1.0, 0.0, 0.0, 0.0, //
            0.0, -1.0, 0.0, 4.0,
        ]),
        ..GeoTags::geographic(1.0, 0.0, 4.0)
    };
    write_geotiff::<colortype::Gray8>(&path, 4, 4, &data, &tags);

    let err = open_geotiff(&path).unwrap_err();
    assert!(
        matches!(err, RasterError::InvalidGeoreference(ref msg) if msg.contains("8 values")),
        "got {:?}",
        err
    );
}

#[test]
fn test_nodata_out_of_range_is_rejected() {
    let dir = temp_test_dir();
    let path = dir.path().join("badnodata.tif");
    let data = generators::gradient_u8(4, 4);
    let tags = GeoTags {
        nodata: Some("-9999"),
        ..GeoTags::geographic(1.0, 0.0, 4.0)
    };
    write_geotiff::<colortype::Gray8>(&path, 4, 4, &data, &tags);

    let err = open_geotiff(&path).unwrap_err();
    assert!(
        matches!(err, RasterError::NodataOutOfRange { .. }),
        "got {:?}",
        err
    );
}

#[test]
fn test_missing_file() {
    let err = open_geotiff(Path::new("/nonexistent/input.tif")).unwrap_err();
    assert!(matches!(err, RasterError::OpenFailed(_)));
}
