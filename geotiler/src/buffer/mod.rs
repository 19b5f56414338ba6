//! Typed access to raw sample buffers.
//!
//! Raster tiles are carried as plain bytes plus a declared [`PixelType`] and
//! [`ByteOrder`]. This module provides:
//!
//! - [`ByteBuffer`] - a byte region with position/limit bookkeeping
//! - the codec functions ([`get_int_value`], [`put_float_value_at`], ...) that
//!   read and write one sample of any supported type
//! - [`BufferPool`] - a capacity-keyed pool that recycles byte buffers across
//!   repeated tile reads
//!
//! # Example
//!
//! ```
//! use geotiler::buffer::{BufferPool, ByteOrder, PixelType, get_int_value_at, put_int_value_at};
//!
//! let pool = BufferPool::new();
//! let mut buffer = pool.take(8, ByteOrder::LittleEndian);
//!
//! put_int_value_at(1, &mut buffer, PixelType::UInt16, 65_000).unwrap();
//! assert_eq!(get_int_value_at(1, &buffer, PixelType::UInt16).unwrap(), 65_000);
//!
//! pool.give(buffer);
//! ```

mod byte_buffer;
mod codec;
mod pool;

pub use byte_buffer::ByteBuffer;
pub use codec::{
    get_float_value, get_float_value_at, get_int_value, get_int_value_at, put_float_value,
    put_float_value_at, put_int_value, put_int_value_at,
};
pub use pool::{BufferPool, PoolStats};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TileError;

/// Sample encodings a raster band may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelType {
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
}

impl PixelType {
    /// All supported pixel types.
    pub const ALL: [PixelType; 7] = [
        PixelType::UInt8,
        PixelType::Int16,
        PixelType::UInt16,
        PixelType::Int32,
        PixelType::UInt32,
        PixelType::Float32,
        PixelType::Float64,
    ];

    /// Width of one sample in bytes.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            PixelType::UInt8 => 1,
            PixelType::Int16 | PixelType::UInt16 => 2,
            PixelType::Int32 | PixelType::UInt32 | PixelType::Float32 => 4,
            PixelType::Float64 => 8,
        }
    }

    /// Whether samples are IEEE floating point.
    pub fn is_float(self) -> bool {
        matches!(self, PixelType::Float32 | PixelType::Float64)
    }

    /// The GDAL data type code for this pixel type.
    pub fn gdal_code(self) -> u32 {
        match self {
            PixelType::UInt8 => 1,
            PixelType::UInt16 => 2,
            PixelType::Int16 => 3,
            PixelType::UInt32 => 4,
            PixelType::Int32 => 5,
            PixelType::Float32 => 6,
            PixelType::Float64 => 7,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelType::UInt8 => "uint8",
            PixelType::Int16 => "int16",
            PixelType::UInt16 => "uint16",
            PixelType::Int32 => "int32",
            PixelType::UInt32 => "uint32",
            PixelType::Float32 => "float32",
            PixelType::Float64 => "float64",
        }
    }
}

impl TryFrom<u32> for PixelType {
    type Error = TileError;

    /// Map a GDAL data type code to a pixel type.
    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(PixelType::UInt8),
            2 => Ok(PixelType::UInt16),
            3 => Ok(PixelType::Int16),
            4 => Ok(PixelType::UInt32),
            5 => Ok(PixelType::Int32),
            6 => Ok(PixelType::Float32),
            7 => Ok(PixelType::Float64),
            other => Err(TileError::illegal_state(format!(
                "unknown buffer type code {}",
                other
            ))),
        }
    }
}

impl FromStr for PixelType {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uint8" | "byte" => Ok(PixelType::UInt8),
            "int16" => Ok(PixelType::Int16),
            "uint16" => Ok(PixelType::UInt16),
            "int32" => Ok(PixelType::Int32),
            "uint32" => Ok(PixelType::UInt32),
            "float32" => Ok(PixelType::Float32),
            "float64" => Ok(PixelType::Float64),
            other => Err(TileError::illegal_state(format!(
                "unknown buffer type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PixelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte order of multi-byte samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// The byte order of the running platform.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::BigEndian
        } else {
            ByteOrder::LittleEndian
        }
    }
}
