//! In-memory raster dataset.

use super::dataset::{check_band, Palette, PixelRect, RasterDataset, Resampling, SpatialRef};
use super::GeoTransform;
use crate::buffer::{
    get_float_value_at, put_float_value_at, ByteBuffer, ByteOrder, PixelType,
};
use crate::error::{TileError, TileResult};

#[derive(Debug, Clone)]
struct MemoryBand {
    pixel_type: PixelType,
    samples: ByteBuffer,
    no_data: Option<f64>,
    palette: Option<Palette>,
}

/// A raster held entirely in memory.
///
/// Used as the target of reprojection and as a dataset for callers that
/// already decoded their source. Bands are stored in their own pixel type.
///
/// # Example
///
/// ```
/// use geotiler::buffer::PixelType;
/// use geotiler::raster::{GeoTransform, MemoryDataset, RasterDataset, SpatialRef};
///
/// let gt = GeoTransform::new(0.0, 2.0, 1.0, -1.0);
/// let mut dataset = MemoryDataset::new(2, 2, gt, SpatialRef::Wgs84);
/// dataset.add_band(PixelType::UInt8, &[1.0, 2.0, 3.0, 4.0]).unwrap();
///
/// assert_eq!(dataset.band_count(), 1);
/// assert_eq!(dataset.value(0, 1, 1).unwrap(), 4.0);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDataset {
    width: usize,
    height: usize,
    geo_transform: GeoTransform,
    spatial_ref: SpatialRef,
    bands: Vec<MemoryBand>,
}

impl MemoryDataset {
    /// Create a dataset with no bands.
    pub fn new(
        width: usize,
        height: usize,
        geo_transform: GeoTransform,
        spatial_ref: SpatialRef,
    ) -> Self {
        Self {
            width,
            height,
            geo_transform,
            spatial_ref,
            bands: Vec::new(),
        }
    }

    /// Append a band from row-major values, cast to `pixel_type`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `values` does not hold exactly
    /// `width * height` samples.
    pub fn add_band(&mut self, pixel_type: PixelType, values: &[f64]) -> TileResult<usize> {
        let pixels = self.width * self.height;
        if values.len() != pixels {
            return Err(TileError::invalid_argument(format!(
                "band has {} values, dataset needs {}",
                values.len(),
                pixels
            )));
        }

        let mut samples = ByteBuffer::allocate(
            pixels * pixel_type.bytes_per_sample(),
            ByteOrder::LittleEndian,
        );
        for (i, &value) in values.iter().enumerate() {
            put_float_value_at(i, &mut samples, pixel_type, value)?;
        }
        Ok(self.push_band(pixel_type, samples))
    }

    /// Append a band from raw bytes already encoded in `pixel_type`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` on a length mismatch.
    pub fn add_band_bytes(
        &mut self,
        pixel_type: PixelType,
        order: ByteOrder,
        bytes: Vec<u8>,
    ) -> TileResult<usize> {
        let expected = self.width * self.height * pixel_type.bytes_per_sample();
        if bytes.len() != expected {
            return Err(TileError::invalid_argument(format!(
                "band has {} bytes, dataset needs {}",
                bytes.len(),
                expected
            )));
        }
        Ok(self.push_band(pixel_type, ByteBuffer::wrap(bytes, order)))
    }

    fn push_band(&mut self, pixel_type: PixelType, samples: ByteBuffer) -> usize {
        self.bands.push(MemoryBand {
            pixel_type,
            samples,
            no_data: None,
            palette: None,
        });
        self.bands.len() - 1
    }

    pub fn set_no_data(&mut self, band: usize, value: Option<f64>) -> TileResult<()> {
        check_band(band, self.bands.len())?;
        self.bands[band].no_data = value;
        Ok(())
    }

    pub fn set_palette(&mut self, band: usize, palette: Option<Palette>) -> TileResult<()> {
        check_band(band, self.bands.len())?;
        self.bands[band].palette = palette;
        Ok(())
    }

    /// The sample at `(x, y)` of a band.
    pub fn value(&self, band: usize, x: usize, y: usize) -> TileResult<f64> {
        check_band(band, self.bands.len())?;
        if x >= self.width || y >= self.height {
            return Err(TileError::IndexOutOfBounds {
                index: y * self.width + x,
                limit: self.width * self.height,
            });
        }
        let band = &self.bands[band];
        get_float_value_at(y * self.width + x, &band.samples, band.pixel_type)
    }

    fn sample(&self, band: &MemoryBand, x: usize, y: usize) -> TileResult<f64> {
        get_float_value_at(y * self.width + x, &band.samples, band.pixel_type)
    }

    /// Bilinear sample at a fractional pixel-centre coordinate inside `window`.
    fn bilinear(&self, band: &MemoryBand, window: PixelRect, fx: f64, fy: f64) -> TileResult<f64> {
        let max_x = (window.x + window.width - 1) as f64;
        let max_y = (window.y + window.height - 1) as f64;
        let fx = fx.clamp(window.x as f64, max_x);
        let fy = fy.clamp(window.y as f64, max_y);

        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(window.x + window.width - 1);
        let y1 = (y0 + 1).min(window.y + window.height - 1);
        let tx = fx - x0 as f64;
        let ty = fy - y0 as f64;

        let top = self.sample(band, x0, y0)? * (1.0 - tx) + self.sample(band, x1, y0)? * tx;
        let bottom = self.sample(band, x0, y1)? * (1.0 - tx) + self.sample(band, x1, y1)? * tx;
        Ok(top * (1.0 - ty) + bottom * ty)
    }
}

impl RasterDataset for MemoryDataset {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn band_type(&self, band: usize) -> TileResult<PixelType> {
        check_band(band, self.bands.len())?;
        Ok(self.bands[band].pixel_type)
    }

    fn geo_transform(&self) -> GeoTransform {
        self.geo_transform
    }

    fn spatial_ref(&self) -> SpatialRef {
        self.spatial_ref.clone()
    }

    fn no_data_value(&self, band: usize) -> Option<f64> {
        self.bands.get(band).and_then(|b| b.no_data)
    }

    fn palette(&self, band: usize) -> Option<Palette> {
        self.bands.get(band).and_then(|b| b.palette.clone())
    }

    fn read_band(
        &self,
        band: usize,
        window: PixelRect,
        out: &mut ByteBuffer,
        out_width: usize,
        out_height: usize,
        resampling: Resampling,
    ) -> TileResult<()> {
        check_band(band, self.bands.len())?;
        if window.is_empty()
            || window.x + window.width > self.width
            || window.y + window.height > self.height
        {
            return Err(TileError::tiler(format!(
                "read window {:?} outside {}x{} dataset",
                window, self.width, self.height
            )));
        }

        let band = &self.bands[band];
        let scale_x = window.width as f64 / out_width as f64;
        let scale_y = window.height as f64 / out_height as f64;
        let interpolate = resampling == Resampling::Bilinear
            && (window.width != out_width || window.height != out_height);

        for oy in 0..out_height {
            for ox in 0..out_width {
                let value = if interpolate {
                    let fx = window.x as f64 + (ox as f64 + 0.5) * scale_x - 0.5;
                    let fy = window.y as f64 + (oy as f64 + 0.5) * scale_y - 0.5;
                    let value = self.bilinear(band, window, fx, fy)?;
                    if band.pixel_type.is_float() {
                        value
                    } else {
                        value.round()
                    }
                } else {
                    let sx = ((ox as f64 + 0.5) * scale_x) as usize;
                    let sy = ((oy as f64 + 0.5) * scale_y) as usize;
                    self.sample(
                        band,
                        window.x + sx.min(window.width - 1),
                        window.y + sy.min(window.height - 1),
                    )?
                };
                put_float_value_at(oy * out_width + ox, out, band.pixel_type, value)?;
            }
        }
        Ok(())
    }
}
