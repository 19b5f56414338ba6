//! Raster tile pipeline.
//!
//! Reads a windowed, optionally reprojected region of a multi-band dataset
//! into a typed [`PixelBuffer`] of a requested size.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │ RasterTileRequest │ ──► │ RasterTileReader │ ──► │ PixelBuffer │
//! └───────────────────┘     └────────┬─────────┘     └─────────────┘
//!                                    │
//!                ┌───────────────────┼─────────────────┐
//!                ▼                   ▼                 ▼
//!       dyn RasterDataset   reproject_to_sector    BufferPool
//!                                (non-WGS84)      (shared, Arc)
//! ```
//!
//! [`BatchReader`] fans many requests out over rayon workers.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use geotiler::buffer::{BufferPool, PixelType};
//! use geotiler::coord::Sector;
//! use geotiler::raster::{
//!     GeoTransform, MemoryDataset, RasterTileReader, RasterTileRequest, SpatialRef,
//! };
//!
//! let gt = GeoTransform::new(0.0, 2.0, 1.0, -1.0);
//! let mut dataset = MemoryDataset::new(2, 2, gt, SpatialRef::Wgs84);
//! dataset.add_band(PixelType::UInt8, &[1.0, 2.0, 3.0, 4.0]).unwrap();
//!
//! let sector = Sector::new(0.0, 0.0, 2.0, 2.0).unwrap();
//! let request = RasterTileRequest::new(Arc::new(dataset), 4, 4, sector).unwrap();
//!
//! let reader = RasterTileReader::new(Arc::new(BufferPool::new()));
//! let tile = reader.read(&request).unwrap();
//! assert_eq!(tile.band_count(), 1);
//! assert_eq!(tile.sample(0, 3, 3).unwrap(), 4.0);
//! ```

mod batch;
mod dataset;
mod geotransform;
mod memory;
mod pixel_buffer;
mod reader;
mod reproject;
mod request;

pub use batch::{BatchReader, BatchReport, TileFailure};
pub use dataset::{Palette, PixelRect, RasterDataset, Resampling, SpatialRef};
pub use geotransform::GeoTransform;
pub use memory::MemoryDataset;
pub use pixel_buffer::{MinMax, PixelBuffer};
pub use reader::RasterTileReader;
pub use reproject::reproject_to_sector;
pub use request::{BandRange, RasterTileRequest, ValueReplacement};
