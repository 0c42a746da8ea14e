//! Tileset metadata rows.

use serde::{Deserialize, Serialize};
use tile_common::Bounds;

/// Describes a tileset; written once before any tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attribution: String,
    pub minzoom: u8,
    pub maxzoom: u8,
    /// Geographic bounds in degrees.
    pub bounds: Bounds,
}

impl Metadata {
    /// `lon,lat,zoom` at the middle of the bounds, opening at `minzoom`.
    pub fn center(&self) -> String {
        let (lon, lat) = self.bounds.center();
        format!("{:.5},{:.5},{}", lon, lat, self.minzoom)
    }

    /// The `(name, value)` rows stored in the metadata table.
    ///
    /// Empty descriptions and attributions are left out.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![("name", self.name.clone())];
        if !self.description.is_empty() {
            rows.push(("description", self.description.clone()));
        }
        if !self.attribution.is_empty() {
            rows.push(("attribution", self.attribution.clone()));
        }
        rows.extend([
            ("minzoom", self.minzoom.to_string()),
            ("maxzoom", self.maxzoom.to_string()),
            ("center", self.center()),
            ("bounds", self.bounds.to_metadata_string()),
            ("type", "overlay".to_string()),
            ("format", "png".to_string()),
            ("version", "1.0.0".to_string()),
        ]);
        rows
    }
}
