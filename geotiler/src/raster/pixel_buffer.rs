//! Typed, band-sequential tile pixels.

use image::RgbaImage;

use super::dataset::{Palette, PixelRect};
use super::request::ValueReplacement;
use crate::buffer::{
    get_float_value_at, get_int_value_at, put_float_value_at, put_int_value_at, BufferPool,
    ByteBuffer, ByteOrder, PixelType,
};
use crate::error::{TileError, TileResult};

/// Running `[min, max]` of sample values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min: f64,
    pub max: f64,
}

impl MinMax {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(&mut self, value: f64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// True until a value has been included.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

impl Default for MinMax {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

/// Pixels of one tile.
///
/// Samples are stored band-sequentially: band `b` occupies samples
/// `[b * w * h, (b + 1) * w * h)`, each band row-major from the top-left.
/// `data_rectangle` is the part of the tile actually covered by source
/// data; everything outside it was never written by the read.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    data: ByteBuffer,
    width: usize,
    height: usize,
    pixel_type: PixelType,
    band_count: usize,
    alpha_band: Option<usize>,
    data_rectangle: PixelRect,
    palette: Option<Palette>,
}

impl PixelBuffer {
    /// Wrap a buffer of exactly `width * height * band_count` samples.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the buffer limit does not match.
    pub fn new(
        data: ByteBuffer,
        width: usize,
        height: usize,
        pixel_type: PixelType,
        band_count: usize,
    ) -> TileResult<Self> {
        let expected = width * height * band_count * pixel_type.bytes_per_sample();
        if data.limit() != expected {
            return Err(TileError::invalid_argument(format!(
                "pixel buffer needs {} bytes, got {}",
                expected,
                data.limit()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            pixel_type,
            band_count,
            alpha_band: None,
            data_rectangle: PixelRect::full(width, height),
            palette: None,
        })
    }

    pub(crate) fn with_data_rectangle(mut self, rect: PixelRect) -> Self {
        self.data_rectangle = rect;
        self
    }

    pub(crate) fn with_alpha_band(mut self, band: Option<usize>) -> Self {
        self.alpha_band = band;
        self
    }

    pub(crate) fn with_palette(mut self, palette: Option<Palette>) -> Self {
        self.palette = palette;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.data.order()
    }

    /// Bands held, including a synthesized alpha band.
    pub fn band_count(&self) -> usize {
        self.band_count
    }

    /// Index of the synthesized alpha band, if any.
    pub fn alpha_band(&self) -> Option<usize> {
        self.alpha_band
    }

    pub fn data_rectangle(&self) -> PixelRect {
        self.data_rectangle
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_slice()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data.into_vec()
    }

    /// Hand the backing storage back to a pool.
    pub fn release(self, pool: &BufferPool) {
        pool.give(self.data);
    }

    #[inline]
    fn index(&self, band: usize, x: usize, y: usize) -> usize {
        (band * self.height + y) * self.width + x
    }

    fn check(&self, band: usize, x: usize, y: usize) -> TileResult<()> {
        if band >= self.band_count || x >= self.width || y >= self.height {
            return Err(TileError::IndexOutOfBounds {
                index: self.index(band, x, y),
                limit: self.band_count * self.width * self.height,
            });
        }
        Ok(())
    }

    /// Sample of `band` at `(x, y)`.
    pub fn sample(&self, band: usize, x: usize, y: usize) -> TileResult<f64> {
        self.check(band, x, y)?;
        get_float_value_at(self.index(band, x, y), &self.data, self.pixel_type)
    }

    /// Overwrite the sample of `band` at `(x, y)`, cast to the buffer type.
    pub fn set_sample(&mut self, band: usize, x: usize, y: usize, value: f64) -> TileResult<()> {
        self.check(band, x, y)?;
        let index = self.index(band, x, y);
        put_float_value_at(index, &mut self.data, self.pixel_type, value)
    }

    /// Write per-band constants to every pixel outside the data rectangle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `values` does not have one entry per
    /// band (synthesized alpha included).
    pub fn fill_outside(&mut self, values: &[f64]) -> TileResult<()> {
        if values.len() != self.band_count {
            return Err(TileError::invalid_argument(format!(
                "fill_outside got {} values for {} bands",
                values.len(),
                self.band_count
            )));
        }

        let rect = self.data_rectangle;
        for (band, &value) in values.iter().enumerate() {
            for y in 0..self.height {
                for x in 0..self.width {
                    if !rect.contains(x, y) {
                        let index = self.index(band, x, y);
                        put_float_value_at(index, &mut self.data, self.pixel_type, value)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Apply value replacement rules to every pixel.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when a slot or range length differs from
    /// the band count.
    pub fn replace_values(&mut self, rules: &ValueReplacement) -> TileResult<()> {
        rules.validate(self.band_count)?;
        if rules.is_noop() {
            return Ok(());
        }

        let mut samples = vec![0.0; self.band_count];
        for y in 0..self.height {
            for x in 0..self.width {
                for (band, sample) in samples.iter_mut().enumerate() {
                    let index = self.index(band, x, y);
                    *sample = get_float_value_at(index, &self.data, self.pixel_type)?;
                }

                let matched = rules.ranges.iter().any(|range| range.contains(&samples));
                let slots = if matched {
                    &rules.replacement
                } else {
                    &rules.otherwise
                };
                for (band, slot) in slots.iter().enumerate() {
                    if let Some(value) = *slot {
                        let index = self.index(band, x, y);
                        put_float_value_at(index, &mut self.data, self.pixel_type, value)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Fold every data sample into `acc`, skipping `outside` and NaN.
    ///
    /// The synthesized alpha band is not scanned.
    pub fn update_min_max(&self, acc: &mut MinMax, outside: f64) -> TileResult<()> {
        for band in 0..self.band_count {
            if Some(band) == self.alpha_band {
                continue;
            }
            let start = self.index(band, 0, 0);
            for i in start..start + self.width * self.height {
                let value = get_float_value_at(i, &self.data, self.pixel_type)?;
                if value.is_nan() || value == outside {
                    continue;
                }
                acc.include(value);
            }
        }
        Ok(())
    }

    /// Cast every sample to `pixel_type`.
    ///
    /// Float to integer truncates toward zero; integer to narrower integer
    /// keeps the low bits. Everything but the sample type carries over.
    /// Returns `self` unchanged when the type already matches.
    pub fn convert_to_type(self, pixel_type: PixelType) -> TileResult<Self> {
        if pixel_type == self.pixel_type {
            return Ok(self);
        }

        let samples = self.band_count * self.width * self.height;
        let mut data = ByteBuffer::allocate(
            samples * pixel_type.bytes_per_sample(),
            self.data.order(),
        );
        for i in 0..samples {
            if self.pixel_type.is_float() {
                let value = get_float_value_at(i, &self.data, self.pixel_type)?;
                put_float_value_at(i, &mut data, pixel_type, value)?;
            } else {
                let value = get_int_value_at(i, &self.data, self.pixel_type)?;
                if pixel_type.is_float() {
                    put_float_value_at(i, &mut data, pixel_type, value as f64)?;
                } else {
                    put_int_value_at(i, &mut data, pixel_type, value)?;
                }
            }
        }

        Ok(Self {
            data,
            pixel_type,
            ..self
        })
    }

    /// Render an 8-bit tile as RGBA.
    ///
    /// One band maps through its palette, or to grey without one. Three
    /// bands are opaque RGB; four are RGBA.
    ///
    /// # Errors
    ///
    /// Returns `Tiler` for non-`UInt8` buffers or other band counts.
    pub fn to_rgba_image(&self) -> TileResult<RgbaImage> {
        if self.pixel_type != PixelType::UInt8 {
            return Err(TileError::tiler(format!(
                "cannot render {} samples as RGBA",
                self.pixel_type
            )));
        }

        let bytes = self.data.as_slice();
        let plane = self.width * self.height;
        let band = |b: usize, i: usize| bytes[b * plane + i];

        let mut rgba = Vec::with_capacity(plane * 4);
        for i in 0..plane {
            let pixel = match (self.band_count, &self.palette) {
                (1, Some(palette)) => palette.color(band(0, i) as usize),
                (1, None) => {
                    let v = band(0, i);
                    [v, v, v, 0xFF]
                }
                (3, _) => [band(0, i), band(1, i), band(2, i), 0xFF],
                (4, _) => [band(0, i), band(1, i), band(2, i), band(3, i)],
                (n, _) => {
                    return Err(TileError::tiler(format!(
                        "cannot render {} bands as RGBA",
                        n
                    )))
                }
            };
            rgba.extend_from_slice(&pixel);
        }

        RgbaImage::from_raw(self.width as u32, self.height as u32, rgba)
            .ok_or_else(|| TileError::tiler("RGBA buffer size mismatch"))
    }
}
