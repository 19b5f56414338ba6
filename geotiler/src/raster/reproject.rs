//! Reprojection of raster sources onto a WGS84 sector.
//!
//! A source in another spatial reference is warped into an in-memory
//! dataset whose geotransform matches the requested sector and output size
//! exactly, so the tile reader can then read it as a whole.
//!
//! Supported sources are geographic WGS84 (plain resampling) and Web
//! Mercator. Destination pixels whose centre falls outside the source get
//! the band's no-data value, or zero when the band declares none.

use tracing::debug;

use super::dataset::{PixelRect, RasterDataset, Resampling, SpatialRef};
use super::{GeoTransform, MemoryDataset};
use crate::buffer::{get_float_value_at, BufferPool, ByteOrder};
use crate::coord::{self, Sector, MAX_LAT, MIN_LAT};
use crate::error::{TileError, TileResult};

/// Maps a WGS84 `(lat, lon)` to the source's georeferenced `(x, y)`.
type Projection = fn(f64, f64) -> Option<(f64, f64)>;

fn geographic(lat: f64, lon: f64) -> Option<(f64, f64)> {
    Some((lon, lat))
}

fn web_mercator(lat: f64, lon: f64) -> Option<(f64, f64)> {
    coord::to_mercator(lat.clamp(MIN_LAT, MAX_LAT), lon).ok()
}

fn source_projection(spatial_ref: &SpatialRef) -> TileResult<Projection> {
    let project: Projection = match spatial_ref {
        SpatialRef::Wgs84 => geographic,
        SpatialRef::WebMercator => web_mercator,
        SpatialRef::Other(definition) => {
            return Err(TileError::tiler(format!(
                "unsupported spatial reference for reprojection: {}",
                definition
            )))
        }
    };
    Ok(project)
}

/// Pixel window of the source needed to cover `sector`, padded by one pixel
/// for interpolation and clipped to the dataset. `None` when they do not
/// overlap.
fn covering_window(
    dataset: &dyn RasterDataset,
    project: Projection,
    sector: &Sector,
) -> TileResult<Option<PixelRect>> {
    let gt = dataset.geo_transform();
    let mut min_col = f64::INFINITY;
    let mut min_row = f64::INFINITY;
    let mut max_col = f64::NEG_INFINITY;
    let mut max_row = f64::NEG_INFINITY;

    for corner in sector.corners() {
        let Some((x, y)) = project(corner.y, corner.x) else {
            continue;
        };
        let (col, row) = gt
            .geo_to_pixel(x, y)
            .ok_or_else(|| TileError::tiler("degenerate source geotransform"))?;
        min_col = min_col.min(col);
        min_row = min_row.min(row);
        max_col = max_col.max(col);
        max_row = max_row.max(row);
    }

    if !min_col.is_finite() || !min_row.is_finite() {
        return Ok(None);
    }

    let x0 = (min_col.floor() - 1.0).max(0.0);
    let y0 = (min_row.floor() - 1.0).max(0.0);
    let x1 = (max_col.ceil() + 1.0).min(dataset.width() as f64);
    let y1 = (max_row.ceil() + 1.0).min(dataset.height() as f64);
    if x1 <= x0 || y1 <= y0 {
        return Ok(None);
    }

    Ok(Some(PixelRect::new(
        x0 as usize,
        y0 as usize,
        (x1 - x0) as usize,
        (y1 - y0) as usize,
    )))
}

/// Warp `bands` of `dataset` onto `sector` at `width × height`.
///
/// The result is a WGS84 [`MemoryDataset`] with one band per entry of
/// `bands`, in that order, keeping each band's pixel type, no-data value and
/// palette.
///
/// # Errors
///
/// Returns `Tiler` for an unsupported spatial reference or a degenerate
/// geotransform, and whatever the source's `read_band` reports.
pub fn reproject_to_sector(
    dataset: &dyn RasterDataset,
    bands: &[usize],
    sector: &Sector,
    width: usize,
    height: usize,
    resampling: Resampling,
    pool: &BufferPool,
) -> TileResult<MemoryDataset> {
    let spatial_ref = dataset.spatial_ref();
    let project = source_projection(&spatial_ref)?;
    let window = covering_window(dataset, project, sector)?;
    let gt = dataset.geo_transform();

    debug!(
        source = %spatial_ref,
        sector = %sector,
        width,
        height,
        ?window,
        "Reprojecting source to WGS84"
    );

    // Source pixel-centre coordinates for every destination pixel
    let mut lookups = Vec::with_capacity(width * height);
    for y in 0..height {
        let lat = sector.max_lat() - (y as f64 + 0.5) * sector.delta_lat() / height as f64;
        for x in 0..width {
            let lon = sector.min_lon() + (x as f64 + 0.5) * sector.delta_lon() / width as f64;
            lookups.push(project(lat, lon).and_then(|(sx, sy)| gt.geo_to_pixel(sx, sy)));
        }
    }

    let mut warped = MemoryDataset::new(
        width,
        height,
        GeoTransform::for_sector(sector, width, height),
        SpatialRef::Wgs84,
    );

    for &band in bands {
        let pixel_type = dataset.band_type(band)?;
        let no_data = dataset.no_data_value(band);
        let fill = no_data.unwrap_or(0.0);
        let mut values = vec![fill; width * height];

        if let Some(window) = window {
            let mut scratch = pool.take(
                window.area() * pixel_type.bytes_per_sample(),
                ByteOrder::native(),
            );
            let read = dataset.read_band(
                band,
                window,
                &mut scratch,
                window.width,
                window.height,
                Resampling::Nearest,
            );
            if let Err(e) = read {
                pool.give(scratch);
                return Err(e);
            }

            let sample = |col: usize, row: usize| {
                get_float_value_at(row * window.width + col, &scratch, pixel_type)
            };

            for (value, lookup) in values.iter_mut().zip(&lookups) {
                let Some((col, row)) = *lookup else {
                    continue;
                };
                // Position relative to the window, still in pixel-edge space
                let wc = col - window.x as f64;
                let wr = row - window.y as f64;
                if wc < 0.0 || wr < 0.0 || wc >= window.width as f64 || wr >= window.height as f64 {
                    continue;
                }

                *value = match resampling {
                    Resampling::Nearest => sample(wc as usize, wr as usize)?,
                    Resampling::Bilinear => {
                        let fx = (wc - 0.5).clamp(0.0, (window.width - 1) as f64);
                        let fy = (wr - 0.5).clamp(0.0, (window.height - 1) as f64);
                        let x0 = fx.floor() as usize;
                        let y0 = fy.floor() as usize;
                        let x1 = (x0 + 1).min(window.width - 1);
                        let y1 = (y0 + 1).min(window.height - 1);
                        let tx = fx - x0 as f64;
                        let ty = fy - y0 as f64;

                        let top = sample(x0, y0)? * (1.0 - tx) + sample(x1, y0)? * tx;
                        let bottom = sample(x0, y1)? * (1.0 - tx) + sample(x1, y1)? * tx;
                        let blended = top * (1.0 - ty) + bottom * ty;
                        if pixel_type.is_float() {
                            blended
                        } else {
                            blended.round()
                        }
                    }
                };
            }
            pool.give(scratch);
        }

        let index = warped.add_band(pixel_type, &values)?;
        warped.set_no_data(index, no_data)?;
        warped.set_palette(index, dataset.palette(band))?;
    }

    Ok(warped)
}
