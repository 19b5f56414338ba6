//! geotiler - raster and vector tiling for geospatial tile generators
//!
//! Two pipelines share one coordinate model:
//!
//! - [`raster`] reads a window of a multi-band dataset into a typed pixel
//!   buffer of a requested size, reprojecting, adding alpha and filling
//!   no-data as needed. Byte buffers are recycled through a shared
//!   [`buffer::BufferPool`].
//! - [`vector`] splits polygon and line features across a grid of tiles and
//!   closes the clipped polygons along each tile's boundary.
//!
//! [`config`] loads tiler settings from an INI file and [`logging`] wires
//! up `tracing` output.

pub mod buffer;
pub mod config;
pub mod coord;
pub mod error;
pub mod logging;
pub mod raster;
pub mod vector;

pub use error::{TileError, TileResult};
