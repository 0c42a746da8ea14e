//! Pixel scalar types.
//!
//! A pipeline run is monomorphized over one [`Pixel`] type, picked once from
//! the raster's [`DataType`].

use std::fmt;

use num_traits::{FromPrimitive, PrimInt, ToPrimitive, Unsigned};
use serde::{Deserialize, Serialize};

use crate::{RasterError, Result};

/// Sample type of a single-band raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    UInt8,
    UInt16,
    UInt32,
}

impl DataType {
    pub fn size_bytes(&self) -> usize {
        match self {
            DataType::UInt8 => 1,
            DataType::UInt16 => 2,
            DataType::UInt32 => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
        }
    }

    /// Map a TIFF `BitsPerSample` value to a data type.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(DataType::UInt8),
            16 => Some(DataType::UInt16),
            32 => Some(DataType::UInt32),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An unsigned integer sample stored in a [`crate::PixelBuffer`].
pub trait Pixel:
    PrimInt + Unsigned + FromPrimitive + ToPrimitive + Default + fmt::Debug + Send + Sync + 'static
{
    const DATA_TYPE: DataType;

    /// Convert a nodata value read from metadata into this type.
    fn from_nodata(value: f64) -> Result<Self> {
        if value.fract() != 0.0 {
            return Err(RasterError::NodataOutOfRange {
                value,
                data_type: Self::DATA_TYPE.to_string(),
            });
        }
        Self::from_f64(value).ok_or_else(|| RasterError::NodataOutOfRange {
            value,
            data_type: Self::DATA_TYPE.to_string(),
        })
    }
}

impl Pixel for u8 {
    const DATA_TYPE: DataType = DataType::UInt8;
}

impl Pixel for u16 {
    const DATA_TYPE: DataType = DataType::UInt16;
}

impl Pixel for u32 {
    const DATA_TYPE: DataType = DataType::UInt32;
}
