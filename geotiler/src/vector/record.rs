//! Geometry fragments clipped to one tile.

use std::collections::BTreeMap;

use geo::Coord;

/// Attribute values of a feature, keyed by field name.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Shape id of records synthesized from tile corners.
pub const CORNER_FILL_ID: i64 = -1;

/// One fragment of a source geometry inside a tile.
///
/// `entered` is set when the first coordinate is a crossing into the tile,
/// `exited` when the last one is a crossing out of it. Fragments that do
/// both are closed against the tile boundary by
/// [`ShapefileTile::complete_polygons`](super::ShapefileTile::complete_polygons).
#[derive(Debug, Clone, PartialEq)]
pub struct TileRecord {
    shape_id: i64,
    coords: Vec<Coord<f64>>,
    holes: Vec<TileRecord>,
    attributes: Attributes,
    entered: bool,
    exited: bool,
}

impl TileRecord {
    pub fn new(shape_id: i64, attributes: Attributes) -> Self {
        Self {
            shape_id,
            coords: Vec::new(),
            holes: Vec::new(),
            attributes,
            entered: false,
            exited: false,
        }
    }

    /// A record covering a whole tile, from its clockwise corners.
    pub fn corner_fill(corners: &[Coord<f64>], attributes: Attributes) -> Self {
        Self {
            coords: corners.to_vec(),
            ..Self::new(CORNER_FILL_ID, attributes)
        }
    }

    pub fn shape_id(&self) -> i64 {
        self.shape_id
    }

    pub fn coords(&self) -> &[Coord<f64>] {
        &self.coords
    }

    pub fn holes(&self) -> &[TileRecord] {
        &self.holes
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn entered(&self) -> bool {
        self.entered
    }

    pub fn exited(&self) -> bool {
        self.exited
    }

    /// Entered and exited: both ends lie on the tile boundary.
    pub fn is_crossing(&self) -> bool {
        self.entered && self.exited
    }

    pub fn first(&self) -> Option<Coord<f64>> {
        self.coords.first().copied()
    }

    pub fn last(&self) -> Option<Coord<f64>> {
        self.coords.last().copied()
    }

    pub(crate) fn push(&mut self, coord: Coord<f64>) {
        self.coords.push(coord);
    }

    pub(crate) fn extend(&mut self, coords: impl IntoIterator<Item = Coord<f64>>) {
        self.coords.extend(coords);
    }

    pub(crate) fn set_entered(&mut self, entered: bool) {
        self.entered = entered;
    }

    pub(crate) fn set_exited(&mut self, exited: bool) {
        self.exited = exited;
    }

    pub(crate) fn add_hole(&mut self, hole: TileRecord) {
        self.holes.push(hole);
    }

    pub(crate) fn take_holes(&mut self) -> Vec<TileRecord> {
        std::mem::take(&mut self.holes)
    }

    pub(crate) fn take_coords(&mut self) -> Vec<Coord<f64>> {
        std::mem::take(&mut self.coords)
    }

    /// Append the first coordinate when the ring is not already closed.
    pub(crate) fn close(&mut self) {
        if let (Some(first), Some(last)) = (self.first(), self.last()) {
            if first != last {
                self.coords.push(first);
            }
        }
    }
}
