//! Raster tile reader.
//!
//! Reads the part of a dataset covered by a request's sector into a
//! [`PixelBuffer`] of the requested size.
//!
//! ```text
//! request.sector ──► inverse geotransform ──► source window (EPS rule)
//!                                                  │
//!                         clip to dataset ◄────────┘
//!                               │
//!                               ├──► data rectangle (proportional, rounded)
//!                               ▼
//!         per band: read_band ──► pooled scratch ──► rows copied into slot
//!                               │
//!                               ▼
//!            alpha ──► fill_outside(no_data) ──► replace_values
//! ```
//!
//! Sources in a spatial reference other than WGS84 are warped onto the
//! sector first when the request asks for it, and then read in full.

use std::sync::Arc;

use tracing::debug;

use super::dataset::{check_band, PixelRect, RasterDataset, Resampling};
use super::pixel_buffer::PixelBuffer;
use super::reproject::reproject_to_sector;
use super::request::RasterTileRequest;
use crate::buffer::{BufferPool, ByteBuffer, ByteOrder, PixelType};
use crate::coord::Sector;
use crate::error::{TileError, TileResult};

/// Tolerance applied before rounding pixel edges, so coordinates that land
/// on a pixel boundary up to float noise select the expected pixel.
const EPS: f64 = 1e-6;

/// Value of synthesized alpha inside the data rectangle.
const OPAQUE: f64 = 255.0;

/// Source window and where it lands in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowMapping {
    window: PixelRect,
    data_rectangle: PixelRect,
}

/// Reads tiles of raster datasets.
///
/// Scratch and output buffers come from a shared [`BufferPool`]; callers
/// return finished tiles with [`PixelBuffer::release`].
#[derive(Debug, Clone)]
pub struct RasterTileReader {
    pool: Arc<BufferPool>,
    order: ByteOrder,
}

impl RasterTileReader {
    /// Create a reader producing native byte order buffers.
    pub fn new(pool: Arc<BufferPool>) -> Self {
        Self {
            pool,
            order: ByteOrder::native(),
        }
    }

    /// Produce buffers in the given byte order.
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Read one tile.
    ///
    /// # Errors
    ///
    /// Returns `Tiler` when the dataset has no bands, a selected band does
    /// not exist, bands differ in type, the sector misses the dataset, or
    /// the source cannot be reprojected. Returns `InvalidArgument` when the
    /// request's no-data or replacement lengths do not match the output
    /// band count.
    pub fn read(&self, request: &RasterTileRequest) -> TileResult<PixelBuffer> {
        let dataset = request.dataset();
        let band_count = dataset.band_count();
        if band_count == 0 {
            return Err(TileError::tiler("dataset has no bands"));
        }

        let bands: Vec<usize> = match request.band() {
            Some(band) => {
                check_band(band, band_count)?;
                vec![band]
            }
            None => (0..band_count).collect(),
        };

        let pixel_type = dataset.band_type(bands[0])?;
        for &band in &bands[1..] {
            let other = dataset.band_type(band)?;
            if other != pixel_type {
                return Err(TileError::tiler(format!(
                    "mixed band types: band 0 is {}, band {} is {}",
                    pixel_type, band, other
                )));
            }
        }

        let add_alpha = request.add_alpha() && request.band().is_none() && band_count == 3;
        let buffer_bands = bands.len() + usize::from(add_alpha);
        if let Some(values) = request.no_data() {
            if values.len() != buffer_bands {
                return Err(TileError::invalid_argument(format!(
                    "no-data has {} values for {} output bands",
                    values.len(),
                    buffer_bands
                )));
            }
        }
        let resampling = if request.bilinear() {
            Resampling::Bilinear
        } else {
            Resampling::Nearest
        };
        let (width, height) = (request.width(), request.height());

        let spatial_ref = dataset.spatial_ref();
        let mut buffer = if request.reproject() && !spatial_ref.is_wgs84() {
            let warped = reproject_to_sector(
                dataset.as_ref(),
                &bands,
                request.sector(),
                width,
                height,
                resampling,
                &self.pool,
            )?;
            let mapping = WindowMapping {
                window: PixelRect::full(width, height),
                data_rectangle: PixelRect::full(width, height),
            };
            let warped_bands: Vec<usize> = (0..bands.len()).collect();
            self.read_bands(
                &warped,
                &warped_bands,
                mapping,
                pixel_type,
                buffer_bands,
                request,
            )?
        } else {
            let mapping = source_window(dataset.as_ref(), request.sector(), width, height)?;
            self.read_bands(
                dataset.as_ref(),
                &bands,
                mapping,
                pixel_type,
                buffer_bands,
                request,
            )?
        };

        if add_alpha {
            buffer = buffer.with_alpha_band(Some(bands.len()));
        }
        if bands.len() == 1 {
            buffer = buffer.with_palette(dataset.palette(bands[0]));
        }

        if let Err(e) = finish_buffer(&mut buffer, request, add_alpha.then_some(bands.len())) {
            buffer.release(&self.pool);
            return Err(e);
        }

        debug!(
            sector = %request.sector(),
            width,
            height,
            bands = buffer_bands,
            pixel_type = %pixel_type,
            data_rectangle = ?buffer.data_rectangle(),
            "Read raster tile"
        );

        Ok(buffer)
    }

    /// Read `bands` of `source` into a new buffer at the mapping's data
    /// rectangle. Band slots beyond `bands.len()` stay zero.
    fn read_bands(
        &self,
        source: &dyn RasterDataset,
        bands: &[usize],
        mapping: WindowMapping,
        pixel_type: PixelType,
        buffer_bands: usize,
        request: &RasterTileRequest,
    ) -> TileResult<PixelBuffer> {
        let (width, height) = (request.width(), request.height());
        let bps = pixel_type.bytes_per_sample();
        let rect = mapping.data_rectangle;
        let resized =
            mapping.window.width != rect.width || mapping.window.height != rect.height;
        let resampling = if request.bilinear() && resized {
            Resampling::Bilinear
        } else {
            Resampling::Nearest
        };

        let mut out = self.pool.take(width * height * buffer_bands * bps, self.order);
        let mut scratch = self.pool.take(rect.area() * bps, self.order);

        let result = bands.iter().enumerate().try_for_each(|(slot, &band)| {
            source.read_band(
                band,
                mapping.window,
                &mut scratch,
                rect.width,
                rect.height,
                resampling,
            )?;
            copy_rows(&scratch, &mut out, slot, rect, width, height, bps);
            Ok(())
        });
        self.pool.give(scratch);

        if let Err(e) = result {
            self.pool.give(out);
            return Err(e);
        }

        let buffer = PixelBuffer::new(out, width, height, pixel_type, buffer_bands)?;
        Ok(buffer.with_data_rectangle(rect))
    }
}

/// Opaque alpha over the data rectangle, then no-data fill and value
/// replacement.
fn finish_buffer(
    buffer: &mut PixelBuffer,
    request: &RasterTileRequest,
    alpha_band: Option<usize>,
) -> TileResult<()> {
    let rect = buffer.data_rectangle();
    if let Some(alpha) = alpha_band {
        for y in rect.y..rect.y + rect.height {
            for x in rect.x..rect.x + rect.width {
                buffer.set_sample(alpha, x, y, OPAQUE)?;
            }
        }
    }

    if let Some(values) = request.no_data() {
        if rect != PixelRect::full(buffer.width(), buffer.height()) {
            buffer.fill_outside(values)?;
        }
    }

    if let Some(rules) = request.replacement() {
        buffer.replace_values(rules)?;
    }
    Ok(())
}

/// Copy a `rect`-sized band from `scratch` into band `slot` of `out`.
fn copy_rows(
    scratch: &ByteBuffer,
    out: &mut ByteBuffer,
    slot: usize,
    rect: PixelRect,
    width: usize,
    height: usize,
    bps: usize,
) {
    let row_bytes = rect.width * bps;
    let src = scratch.as_slice();
    let dst = out.as_mut_slice();
    for row in 0..rect.height {
        let from = row * row_bytes;
        let to = ((slot * height + rect.y + row) * width + rect.x) * bps;
        dst[to..to + row_bytes].copy_from_slice(&src[from..from + row_bytes]);
    }
}

/// Source pixel window covering `sector`, clipped to the dataset, and the
/// output rectangle it maps to.
fn source_window(
    dataset: &dyn RasterDataset,
    sector: &Sector,
    width: usize,
    height: usize,
) -> TileResult<WindowMapping> {
    let gt = dataset.geo_transform();
    let degenerate = || TileError::tiler("degenerate dataset geotransform");
    let (c0, r0) = gt
        .geo_to_pixel(sector.min_lon(), sector.max_lat())
        .ok_or_else(degenerate)?;
    let (c1, r1) = gt
        .geo_to_pixel(sector.max_lon(), sector.min_lat())
        .ok_or_else(degenerate)?;

    let src_x = (c0.min(c1) + EPS).floor();
    let src_y = (r0.min(r1) + EPS).floor();
    let src_right = (c0.max(c1) - EPS).ceil();
    let src_bottom = (r0.max(r1) - EPS).ceil();
    let src_width = src_right - src_x;
    let src_height = src_bottom - src_y;

    let clip_x = src_x.max(0.0);
    let clip_y = src_y.max(0.0);
    let clip_right = src_right.min(dataset.width() as f64);
    let clip_bottom = src_bottom.min(dataset.height() as f64);
    if src_width <= 0.0 || src_height <= 0.0 || clip_right <= clip_x || clip_bottom <= clip_y {
        return Err(TileError::tiler(format!(
            "empty source window for sector {}",
            sector
        )));
    }

    let scale_x = width as f64 / src_width;
    let scale_y = height as f64 / src_height;
    let dx0 = ((clip_x - src_x) * scale_x).round() as usize;
    let dy0 = ((clip_y - src_y) * scale_y).round() as usize;
    let dx1 = (((clip_right - src_x) * scale_x).round() as usize).min(width);
    let dy1 = (((clip_bottom - src_y) * scale_y).round() as usize).min(height);
    if dx1 <= dx0 || dy1 <= dy0 {
        return Err(TileError::tiler(format!(
            "empty source window for sector {}",
            sector
        )));
    }

    Ok(WindowMapping {
        window: PixelRect::new(
            clip_x as usize,
            clip_y as usize,
            (clip_right - clip_x) as usize,
            (clip_bottom - clip_y) as usize,
        ),
        data_rectangle: PixelRect::new(dx0, dy0, dx1 - dx0, dy1 - dy0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{BandRange, GeoTransform, MemoryDataset, SpatialRef, ValueReplacement};

    /// 4x4 dataset over lat/lon [0, 4], one band per entry of `types`, each
    /// holding `band * 100 + pixel index`.
    fn dataset(types: &[PixelType]) -> Arc<MemoryDataset> {
        let mut dataset = MemoryDataset::new(
            4,
            4,
            GeoTransform::new(0.0, 4.0, 1.0, -1.0),
            SpatialRef::Wgs84,
        );
        for (b, &t) in types.iter().enumerate() {
            let values: Vec<f64> = (0..16).map(|i| (b * 100 + i) as f64).collect();
            dataset.add_band(t, &values).unwrap();
        }
        Arc::new(dataset)
    }

    fn reader() -> RasterTileReader {
        RasterTileReader::new(Arc::new(BufferPool::new()))
    }

    fn sector(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Sector {
        Sector::new(min_lat, min_lon, max_lat, max_lon).unwrap()
    }

    #[test]
    fn test_no_bands() {
        let request =
            RasterTileRequest::new(dataset(&[]), 4, 4, sector(0.0, 0.0, 4.0, 4.0)).unwrap();
        let result = reader().read(&request);
        assert!(matches!(result, Err(TileError::Tiler(msg)) if msg.contains("no bands")));
    }

    #[test]
    fn test_mixed_band_types() {
        let request = RasterTileRequest::new(
            dataset(&[PixelType::UInt8, PixelType::Int16]),
            4,
            4,
            sector(0.0, 0.0, 4.0, 4.0),
        )
        .unwrap();
        let result = reader().read(&request);
        assert!(matches!(result, Err(TileError::Tiler(msg)) if msg.contains("mixed band types")));
    }

    #[test]
    fn test_selected_band_out_of_range() {
        let request = RasterTileRequest::new(
            dataset(&[PixelType::UInt8]),
            4,
            4,
            sector(0.0, 0.0, 4.0, 4.0),
        )
        .unwrap()
        .with_band(1);
        assert!(matches!(reader().read(&request), Err(TileError::Tiler(_))));
    }

    #[test]
    fn test_selected_band_reads_one_band() {
        let request = RasterTileRequest::new(
            dataset(&[PixelType::UInt8, PixelType::Int16]),
            4,
            4,
            sector(0.0, 0.0, 4.0, 4.0),
        )
        .unwrap()
        .with_band(1)
        .with_add_alpha(true);

        let buffer = reader().read(&request).unwrap();
        assert_eq!(buffer.band_count(), 1);
        assert_eq!(buffer.pixel_type(), PixelType::Int16);
        assert_eq!(buffer.alpha_band(), None);
        assert_eq!(buffer.sample(0, 3, 3).unwrap(), 115.0);
    }

    #[test]
    fn test_sector_outside_dataset() {
        let request = RasterTileRequest::new(
            dataset(&[PixelType::UInt8]),
            4,
            4,
            sector(10.0, 10.0, 12.0, 12.0),
        )
        .unwrap();
        let result = reader().read(&request);
        assert!(
            matches!(result, Err(TileError::Tiler(msg)) if msg.contains("empty source window"))
        );
    }

    #[test]
    fn test_sub_window_upsampled() {
        // North-west quadrant (pixels 0, 1, 4, 5) at twice the resolution
        let request = RasterTileRequest::new(
            dataset(&[PixelType::UInt16]),
            4,
            4,
            sector(2.0, 0.0, 4.0, 2.0),
        )
        .unwrap();
        let buffer = reader().read(&request).unwrap();

        assert_eq!(buffer.data_rectangle(), PixelRect::full(4, 4));
        assert_eq!(buffer.sample(0, 0, 0).unwrap(), 0.0);
        assert_eq!(buffer.sample(0, 3, 0).unwrap(), 1.0);
        assert_eq!(buffer.sample(0, 0, 3).unwrap(), 4.0);
        assert_eq!(buffer.sample(0, 3, 3).unwrap(), 5.0);
    }

    #[test]
    fn test_window_straddling_east_edge() {
        let request = RasterTileRequest::new(
            dataset(&[PixelType::UInt8]),
            4,
            4,
            sector(0.0, 2.0, 4.0, 6.0),
        )
        .unwrap()
        .with_no_data(vec![77.0]);
        let buffer = reader().read(&request).unwrap();

        assert_eq!(buffer.data_rectangle(), PixelRect::new(0, 0, 2, 4));
        assert_eq!(buffer.sample(0, 0, 0).unwrap(), 2.0);
        assert_eq!(buffer.sample(0, 1, 3).unwrap(), 15.0);
        assert_eq!(buffer.sample(0, 2, 0).unwrap(), 77.0);
        assert_eq!(buffer.sample(0, 3, 3).unwrap(), 77.0);
    }

    #[test]
    fn test_big_endian_output() {
        let request = RasterTileRequest::new(
            dataset(&[PixelType::UInt16]),
            4,
            4,
            sector(0.0, 0.0, 4.0, 4.0),
        )
        .unwrap();
        let buffer = reader()
            .with_byte_order(ByteOrder::BigEndian)
            .read(&request)
            .unwrap();

        assert_eq!(buffer.byte_order(), ByteOrder::BigEndian);
        // Pixel 1 holds 1: high byte first
        assert_eq!(&buffer.as_bytes()[2..4], &[0x00, 0x01]);
    }

    #[test]
    fn test_reprojected_mercator_source() {
        let mut mercator = MemoryDataset::new(
            8,
            8,
            GeoTransform::new(-800_000.0, 800_000.0, 200_000.0, -200_000.0),
            SpatialRef::WebMercator,
        );
        mercator.add_band(PixelType::UInt8, &[42.0; 64]).unwrap();

        let request =
            RasterTileRequest::new(Arc::new(mercator), 4, 4, sector(-1.0, -1.0, 1.0, 1.0))
                .unwrap()
                .with_reproject(true);
        let buffer = reader().read(&request).unwrap();

        assert_eq!(buffer.data_rectangle(), PixelRect::full(4, 4));
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(buffer.sample(0, x, y).unwrap(), 42.0);
            }
        }
    }

    #[test]
    fn test_scratch_buffers_return_to_pool() {
        let reader = reader();
        let request = RasterTileRequest::new(
            dataset(&[PixelType::UInt8, PixelType::UInt8]),
            4,
            4,
            sector(0.0, 0.0, 4.0, 4.0),
        )
        .unwrap();

        let buffer = reader.read(&request).unwrap();
        buffer.release(reader.pool());
        reader.read(&request).unwrap();

        let stats = reader.pool().stats();
        assert_eq!(stats.takes, 4);
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.reuses, 2);
    }

    #[test]
    fn test_no_data_length_checked_for_interior_tiles() {
        let request = RasterTileRequest::new(
            dataset(&[PixelType::UInt8]),
            4,
            4,
            sector(0.0, 0.0, 4.0, 4.0),
        )
        .unwrap()
        .with_no_data(vec![0.0; 3]);

        let reader = reader();
        let result = reader.read(&request);
        assert!(matches!(result, Err(TileError::InvalidArgument(_))));
        assert_eq!(reader.pool().stats().takes, 0);
    }

    #[test]
    fn test_failed_replacement_returns_output_to_pool() {
        let replacement = ValueReplacement::new(
            vec![BandRange::new(vec![0.0, 0.0], vec![1.0, 1.0])],
            vec![Some(0.0), Some(0.0)],
            vec![None, None],
        );
        let request = RasterTileRequest::new(
            dataset(&[PixelType::UInt8]),
            4,
            4,
            sector(0.0, 0.0, 4.0, 4.0),
        )
        .unwrap()
        .with_replacement(replacement);

        let reader = reader();
        let result = reader.read(&request);
        assert!(matches!(result, Err(TileError::InvalidArgument(_))));

        let stats = reader.pool().stats();
        assert_eq!(stats.allocations, 2);
        assert_eq!(stats.pooled_buffers, 2);
    }
}
