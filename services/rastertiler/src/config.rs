//! Tiler configuration.
//!
//! Built once (from the command line or by a caller) and passed by reference
//! into the pipeline. Nothing in it changes after [`TilerConfig::validate`].

use std::path::{Path, PathBuf};

use raster::{DataType, EdgeTilePolicy};
use renderer::{Colormap, RenderError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tile_common::MAX_ZOOM;

/// Largest tile edge accepted, in pixels.
pub const MAX_TILE_SIZE: usize = 4096;

/// Problems found before any tile is produced.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("input raster {0} does not exist")]
    InputNotFound(PathBuf),

    #[error("output {0} must end in .mbtiles")]
    OutputExtension(PathBuf),

    #[error("output directory {0} does not exist")]
    OutputDirMissing(PathBuf),

    #[error("minzoom ({minzoom}) must not be greater than maxzoom ({maxzoom})")]
    ZoomRange { minzoom: u8, maxzoom: u8 },

    #[error("maxzoom {0} is above the limit of {}", MAX_ZOOM)]
    MaxZoom(u8),

    #[error("at least one worker is required")]
    NoWorkers,

    #[error("tile size {0} must be between 1 and {}", MAX_TILE_SIZE)]
    TileSize(usize),

    #[error("invalid colormap: {0}")]
    Colormap(#[from] RenderError),

    #[error("a colormap can only be applied to uint8 rasters, input is {0}")]
    ColormapDataType(DataType),
}

/// Everything one tiling run needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilerConfig {
    /// Input raster (single-band GeoTIFF).
    pub input: PathBuf,
    /// Output `.mbtiles` file; replaced if it exists.
    pub output: PathBuf,
    pub minzoom: u8,
    pub maxzoom: u8,
    /// Tile edge in pixels.
    pub tile_size: usize,
    /// Parallel tile workers.
    pub workers: usize,
    /// Tileset name; the input's file stem when empty.
    pub name: String,
    pub description: String,
    pub attribution: String,
    /// `"<value>:<hex>,..."` colormap for uint8 rasters.
    pub colormap: Option<String>,
    pub edge_tiles: EdgeTilePolicy,
    /// Show per-zoom progress bars.
    pub progress: bool,
}

impl Default for TilerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::from("tiles.mbtiles"),
            minzoom: 0,
            maxzoom: 0,
            tile_size: 256,
            workers: 4,
            name: String::new(),
            description: String::new(),
            attribution: String::new(),
            colormap: None,
            edge_tiles: EdgeTilePolicy::default(),
            progress: false,
        }
    }
}

impl TilerConfig {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Self::default()
        }
    }

    /// Check everything that can be checked without opening the raster.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.input.is_file() {
            return Err(ConfigError::InputNotFound(self.input.clone()));
        }

        if self.output.extension().and_then(|e| e.to_str()) != Some(storage::EXTENSION) {
            return Err(ConfigError::OutputExtension(self.output.clone()));
        }
        let parent = match self.output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Err(ConfigError::OutputDirMissing(parent.to_path_buf()));
        }

        if self.minzoom > self.maxzoom {
            return Err(ConfigError::ZoomRange {
                minzoom: self.minzoom,
                maxzoom: self.maxzoom,
            });
        }
        if self.maxzoom > MAX_ZOOM {
            return Err(ConfigError::MaxZoom(self.maxzoom));
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.tile_size == 0 || self.tile_size > MAX_TILE_SIZE {
            return Err(ConfigError::TileSize(self.tile_size));
        }

        self.parse_colormap()?;
        Ok(())
    }

    /// The parsed colormap, if one was given.
    pub fn parse_colormap(&self) -> Result<Option<Colormap>, ConfigError> {
        self.colormap
            .as_deref()
            .map(Colormap::parse)
            .transpose()
            .map_err(ConfigError::from)
    }

    /// Check settings that depend on the raster's pixel type.
    pub fn check_data_type(&self, data_type: DataType) -> Result<(), ConfigError> {
        if self.colormap.is_some() && data_type != DataType::UInt8 {
            return Err(ConfigError::ColormapDataType(data_type));
        }
        Ok(())
    }

    /// Tileset name, falling back to the input file stem.
    pub fn tileset_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::temp_test_dir;

    fn valid_config(dir: &Path) -> TilerConfig {
        let input = dir.join("input.tif");
        std::fs::write(&input, b"not really a tiff").unwrap();
        TilerConfig::new(input, dir.join("out.mbtiles"))
    }

    #[test]
    fn test_valid_config() {
        let dir = temp_test_dir();
        let config = valid_config(dir.path());
        config.validate().unwrap();
        assert_eq!(config.tileset_name(), "input");
    }

    #[test]
    fn test_missing_input() {
        let dir = temp_test_dir();
        let config = TilerConfig::new(dir.path().join("nope.tif"), dir.path().join("o.mbtiles"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InputNotFound(_))
        ));
    }

    #[test]
    fn test_output_checks() {
        let dir = temp_test_dir();
        let mut config = valid_config(dir.path());

        config.output = dir.path().join("out.sqlite");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutputExtension(_))
        ));

        config.output = dir.path().join("missing").join("out.mbtiles");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutputDirMissing(_))
        ));
    }

    #[test]
    fn test_zoom_checks() {
        let dir = temp_test_dir();
        let mut config = valid_config(dir.path());

        config.minzoom = 5;
        config.maxzoom = 4;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZoomRange { .. })
        ));

        config.minzoom = 0;
        config.maxzoom = 25;
        assert!(matches!(config.validate(), Err(ConfigError::MaxZoom(25))));

        config.maxzoom = 24;
        config.validate().unwrap();
    }

    #[test]
    fn test_workers_and_tile_size() {
        let dir = temp_test_dir();
        let mut config = valid_config(dir.path());

        config.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoWorkers)));

        config.workers = 1;
        config.tile_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::TileSize(0))));
        config.tile_size = 8192;
        assert!(matches!(config.validate(), Err(ConfigError::TileSize(8192))));
    }

    #[test]
    fn test_colormap_checks() {
        let dir = temp_test_dir();
        let mut config = valid_config(dir.path());

        config.colormap = Some("1:#FF0000,2".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Colormap(_))));

        config.colormap = Some("1:#FF0000".to_string());
        config.validate().unwrap();
        assert!(config.check_data_type(DataType::UInt8).is_ok());
        assert!(matches!(
            config.check_data_type(DataType::UInt16),
            Err(ConfigError::ColormapDataType(DataType::UInt16))
        ));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: TilerConfig =
            serde_json::from_str(r#"{"input": "a.tif", "output": "b.mbtiles", "maxzoom": 6}"#)
                .unwrap();
        assert_eq!(config.maxzoom, 6);
        assert_eq!(config.tile_size, 256);
        assert_eq!(config.workers, 4);
        assert_eq!(config.edge_tiles, EdgeTilePolicy::AssumeData);
    }
}
