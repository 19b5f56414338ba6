//! Polygon and line splitting across a tile grid.
//!
//! Source features are clipped into per-tile fragments, then each tile
//! closes its polygon fragments along its own boundary so every output
//! feature is a valid ring lying inside a single tile.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐     ┌──────────┐  clip   ┌───────────────┐
//! │ VectorFeatureSource │ ──► │ TileGrid │ ──────► │ ShapefileTile │ × rows·cols
//! └─────────────────────┘     └──────────┘         └───────┬───────┘
//!                                                          │ join orphans
//!                                                          │ complete polygons
//!                                                          ▼
//!                                              TileFeatures { Feature, .. }
//! ```
//!
//! Fragments are [`TileRecord`]s; their boundary crossings are sorted as
//! [`EntryExit`] markers clockwise around the tile centroid.

mod entry_exit;
mod feature;
mod grid;
mod record;
mod source;
mod tile;

pub use entry_exit::{clockwise_angle, clockwise_span, EntryExit};
pub use feature::{Feature, FeatureSchema};
pub use grid::{TileFeatures, TileGrid};
pub use record::{Attributes, TileRecord, CORNER_FILL_ID};
pub use source::{MemoryFeatureSource, SourceFeature, VectorFeatureSource};
pub use tile::ShapefileTile;
