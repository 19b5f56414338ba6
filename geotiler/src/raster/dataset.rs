//! Raster dataset capability.
//!
//! The tile reader never talks to a concrete raster library. It depends on
//! [`RasterDataset`], which exposes the handful of facts and the windowed
//! read a tile needs. Any binding (a native library wrapper, a pure decoder,
//! or the in-memory [`MemoryDataset`](super::MemoryDataset)) can satisfy it.
//!
//! ```text
//! ┌──────────────────┐      ┌─────────────────────┐
//! │ RasterTileReader │ ───► │ dyn RasterDataset   │ (trait)
//! └──────────────────┘      └──────────┬──────────┘
//!                                 ┌────┴─────┐
//!                                 ▼          ▼
//!                          MemoryDataset   native bindings
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::GeoTransform;
use crate::buffer::{ByteBuffer, PixelType};
use crate::error::{TileError, TileResult};

/// Spatial reference system of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpatialRef {
    /// Geographic WGS84 (EPSG:4326), degrees.
    Wgs84,
    /// Web Mercator (EPSG:3857), metres.
    WebMercator,
    /// Any other system, identified by its definition (WKT, PROJ or EPSG text).
    Other(String),
}

impl SpatialRef {
    /// Spatial reference for an EPSG code.
    pub fn from_epsg(code: u32) -> Self {
        match code {
            4326 => SpatialRef::Wgs84,
            3857 | 900913 => SpatialRef::WebMercator,
            other => SpatialRef::Other(format!("EPSG:{}", other)),
        }
    }

    pub fn epsg(&self) -> Option<u32> {
        match self {
            SpatialRef::Wgs84 => Some(4326),
            SpatialRef::WebMercator => Some(3857),
            SpatialRef::Other(_) => None,
        }
    }

    pub fn is_wgs84(&self) -> bool {
        matches!(self, SpatialRef::Wgs84)
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpatialRef::Wgs84 => write!(f, "EPSG:4326"),
            SpatialRef::WebMercator => write!(f, "EPSG:3857"),
            SpatialRef::Other(definition) => write!(f, "{}", definition),
        }
    }
}

/// Sampling used when a read window and its output differ in size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resampling {
    #[default]
    Nearest,
    Bilinear,
}

/// An integer pixel rectangle. Width and height are never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PixelRect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rectangle at the origin covering `width × height`.
    pub fn full(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// A colour table attached to an index-colour band, RGBA per entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    entries: Vec<[u8; 4]>,
}

impl Palette {
    pub fn new(entries: Vec<[u8; 4]>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[[u8; 4]] {
        &self.entries
    }

    /// The colour for an index, transparent black when out of range.
    pub fn color(&self, index: usize) -> [u8; 4] {
        self.entries.get(index).copied().unwrap_or([0, 0, 0, 0])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A multi-band georeferenced raster.
///
/// Implementations must be thread-safe (`Send + Sync`) so tiles of one
/// dataset can be read from parallel workers.
pub trait RasterDataset: Send + Sync {
    /// Raster width in pixels.
    fn width(&self) -> usize;

    /// Raster height in pixels.
    fn height(&self) -> usize;

    /// Number of bands.
    fn band_count(&self) -> usize;

    /// Sample encoding of a band (zero-based).
    ///
    /// # Errors
    ///
    /// Returns `Tiler` if the band does not exist.
    fn band_type(&self, band: usize) -> TileResult<PixelType>;

    /// Affine transform from pixels to the dataset's spatial reference.
    fn geo_transform(&self) -> GeoTransform;

    /// Spatial reference of the georeferenced coordinates.
    fn spatial_ref(&self) -> SpatialRef;

    /// No-data value of a band, if it declares one.
    fn no_data_value(&self, _band: usize) -> Option<f64> {
        None
    }

    /// Colour table of a band, if it is index-coloured.
    fn palette(&self, _band: usize) -> Option<Palette> {
        None
    }

    /// Read `window` of a band, resampled to `out_width × out_height`.
    ///
    /// Samples are written row-major from the start of `out`, in the band's
    /// own pixel type and in `out`'s byte order. `window` lies within the
    /// dataset and `out` holds at least
    /// `out_width * out_height * bytes_per_sample` bytes.
    fn read_band(
        &self,
        band: usize,
        window: PixelRect,
        out: &mut ByteBuffer,
        out_width: usize,
        out_height: usize,
        resampling: Resampling,
    ) -> TileResult<()>;
}

/// Check a band index against a dataset's band count.
pub(crate) fn check_band(band: usize, band_count: usize) -> TileResult<()> {
    if band >= band_count {
        return Err(TileError::tiler(format!(
            "band {} out of range, dataset has {} bands",
            band, band_count
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_ref_from_epsg() {
        assert_eq!(SpatialRef::from_epsg(4326), SpatialRef::Wgs84);
        assert_eq!(SpatialRef::from_epsg(900913), SpatialRef::WebMercator);
        assert_eq!(
            SpatialRef::from_epsg(32633),
            SpatialRef::Other("EPSG:32633".to_string())
        );
        assert!(SpatialRef::Wgs84.is_wgs84());
        assert!(!SpatialRef::WebMercator.is_wgs84());
    }

    #[test]
    fn test_pixel_rect_contains() {
        let rect = PixelRect::new(2, 3, 4, 5);
        assert!(rect.contains(2, 3));
        assert!(rect.contains(5, 7));
        assert!(!rect.contains(6, 7));
        assert!(!rect.contains(5, 8));
        assert_eq!(rect.area(), 20);
    }

    #[test]
    fn test_palette_out_of_range_is_transparent() {
        let palette = Palette::new(vec![[255, 0, 0, 255]]);
        assert_eq!(palette.color(0), [255, 0, 0, 255]);
        assert_eq!(palette.color(7), [0, 0, 0, 0]);
    }

    #[test]
    fn test_check_band() {
        assert!(check_band(2, 3).is_ok());
        assert!(matches!(check_band(3, 3), Err(TileError::Tiler(_))));
    }
}
