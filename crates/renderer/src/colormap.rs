//! Value to color mappings for 8-bit rasters.
//!
//! A colormap is written as comma separated `<value>:<hex>` entries, for
//! example `"1:#AABBCC, 2:#DDEEFF"`. Each entry takes the next palette index
//! in order. One more palette entry, fully transparent, is appended for every
//! value the colormap does not name.

use std::collections::HashSet;
use std::str::FromStr;

use crate::{RenderError, Result, Rgba};

/// Largest number of entries; the transparent entry fills the 256th slot.
pub const MAX_ENTRIES: usize = 255;

const TRANSPARENT: Rgba = (0, 0, 0, 0);

/// A parsed colormap with a lookup table from pixel value to palette index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colormap {
    lookup: [u8; 256],
    palette: Vec<Rgba>,
}

impl Colormap {
    /// Parse a colormap string.
    pub fn parse(text: &str) -> Result<Self> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(RenderError::invalid_colormap("no entries"));
        }

        let entries: Vec<&str> = compact.split(',').collect();
        if entries.len() > MAX_ENTRIES {
            return Err(RenderError::TooManyColormapEntries(entries.len()));
        }

        let transparent = entries.len() as u8;
        let mut lookup = [transparent; 256];
        let mut palette = Vec::with_capacity(entries.len() + 1);
        let mut seen = HashSet::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let (value, color) = entry.split_once(':').ok_or_else(|| {
                RenderError::invalid_colormap(format!("entry {:?} is not <value>:<hex>", entry))
            })?;
            let value: u8 = value.parse().map_err(|_| {
                RenderError::invalid_colormap(format!("value {:?} is not in 0..=255", value))
            })?;
            if !seen.insert(value) {
                return Err(RenderError::DuplicateColormapValue(value));
            }
            let color =
                parse_hex(color).ok_or_else(|| RenderError::InvalidColor(color.to_string()))?;

            lookup[value as usize] = index as u8;
            palette.push(color);
        }
        palette.push(TRANSPARENT);

        Ok(Self { lookup, palette })
    }

    /// Palette index for a pixel value.
    #[inline]
    pub fn index(&self, value: u8) -> u8 {
        self.lookup[value as usize]
    }

    pub fn palette(&self) -> &[Rgba] {
        &self.palette
    }

    /// Index of the transparent entry, always the last one.
    pub fn transparent_index(&self) -> u8 {
        (self.palette.len() - 1) as u8
    }

    /// Number of mapped values, not counting the transparent entry.
    pub fn len(&self) -> usize {
        self.palette.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Force `value` onto the transparent entry.
    pub fn make_transparent(&mut self, value: u8) {
        self.lookup[value as usize] = self.transparent_index();
    }
}

impl FromStr for Colormap {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse `#RRGGBB`, `#RGB` or `#RRGGBBAA` into an RGBA color.
pub fn parse_hex(hex: &str) -> Option<Rgba> {
    let digits = hex.strip_prefix('#')?;
    if !digits.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok().map(|v| v * 17);

    match digits.len() {
        6 => Some((byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some((byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        3 => Some((nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("#FF0000"), Some((255, 0, 0, 255)));
        assert_eq!(parse_hex("#00ff00"), Some((0, 255, 0, 255)));
        assert_eq!(parse_hex("#F0A"), Some((255, 0, 170, 255)));
        assert_eq!(parse_hex("#11223344"), Some((17, 34, 51, 68)));
        assert_eq!(parse_hex("FF0000"), None);
        assert_eq!(parse_hex("#GGGGGG"), None);
        assert_eq!(parse_hex("#FF00"), None);
    }

    #[test]
    fn test_palette_order_and_lookup() {
        let cmap = Colormap::parse("1:#000000,3:#FFFFFF,4:#FF0000").unwrap();
        assert_eq!(
            cmap.palette(),
            &[(0, 0, 0, 255), (255, 255, 255, 255), (255, 0, 0, 255), (0, 0, 0, 0)]
        );
        assert_eq!(cmap.len(), 3);

        for (value, index) in [(0, 3), (1, 0), (2, 3), (3, 1), (4, 2), (5, 3), (255, 3)] {
            assert_eq!(cmap.index(value), index, "value {}", value);
        }
    }

    #[test]
    fn test_whitespace_ignored() {
        let a = Colormap::parse(" 10 : #F00 ,\n20:#0F0").unwrap();
        let b = Colormap::parse("10:#FF0000,20:#00FF00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            Colormap::parse(""),
            Err(RenderError::InvalidColormap(_))
        ));
        assert!(matches!(
            Colormap::parse("1:#FF0000,2"),
            Err(RenderError::InvalidColormap(_))
        ));
        assert!(matches!(
            Colormap::parse("256:#FF0000"),
            Err(RenderError::InvalidColormap(_))
        ));
        assert!(matches!(
            Colormap::parse("1:red"),
            Err(RenderError::InvalidColor(_))
        ));
        assert!(matches!(
            Colormap::parse("1:#FF0000,1:#00FF00"),
            Err(RenderError::DuplicateColormapValue(1))
        ));
    }

    #[test]
    fn test_entry_limit() {
        let full: Vec<String> = (0..255).map(|v| format!("{}:#000", v)).collect();
        let cmap = Colormap::parse(&full.join(",")).unwrap();
        assert_eq!(cmap.palette().len(), 256);
        assert_eq!(cmap.transparent_index(), 255);

        let over: Vec<String> = (0..256).map(|v| format!("{}:#000", v)).collect();
        assert!(matches!(
            Colormap::parse(&over.join(",")),
            Err(RenderError::TooManyColormapEntries(256))
        ));
    }

    #[test]
    fn test_make_transparent() {
        let mut cmap: Colormap = "0:#000,1:#FFF".parse().unwrap();
        assert_eq!(cmap.index(0), 0);
        cmap.make_transparent(0);
        assert_eq!(cmap.index(0), 2);
        assert_eq!(cmap.index(1), 1);
    }
}
