//! Per-tile fragment accumulation and polygon closing.
//!
//! A [`ShapefileTile`] receives the coordinates of every source geometry
//! clipped to its sector, flagged where they cross the sector boundary.
//! Once all geometry is in, fragments are stitched into closed rings:
//!
//! ```text
//!     NW ─────────── N ─────────── NE        fragments run inside the tile
//!      │      exit ◄──────┐         │        between an entry and an exit;
//!      │                  │         │        each exit is joined clockwise
//!      W       entry ─────┘         E        along the boundary to the entry
//!      │                            │        it pairs with, picking up the
//!      │                            │        corners passed on the way
//!     SW ─────────── S ─────────── SE
//! ```
//!
//! Clockwise is measured as the negated `atan2(dy, dx)` about the tile
//! centroid, both when sorting crossings and when choosing corners.

use std::collections::BTreeMap;

use geo::{Area, Contains, Coord, Geometry, LineString, Point, Polygon};
use tracing::{debug, warn};

use super::entry_exit::{clockwise_angle, clockwise_span, EntryExit};
use super::feature::{Feature, FeatureSchema};
use super::record::{Attributes, TileRecord};
use crate::coord::Sector;
use crate::error::{TileError, TileResult};

/// Fragments of source geometry for one output tile.
#[derive(Debug, Clone)]
pub struct ShapefileTile {
    sector: Sector,
    centroid: Coord<f64>,
    corners: [Coord<f64>; 4],
    records: Vec<TileRecord>,
    current: Option<usize>,
    filled: bool,
    filled_attributes: Attributes,
    no_entry_shape_exists: bool,
}

impl ShapefileTile {
    pub fn new(sector: Sector) -> Self {
        Self {
            centroid: sector.centroid(),
            corners: sector.corners(),
            sector,
            records: Vec::new(),
            current: None,
            filled: false,
            filled_attributes: Attributes::new(),
            no_entry_shape_exists: false,
        }
    }

    pub fn sector(&self) -> &Sector {
        &self.sector
    }

    pub fn centroid(&self) -> Coord<f64> {
        self.centroid
    }

    /// Sector corners, clockwise from the south-west.
    pub fn corners(&self) -> &[Coord<f64>; 4] {
        &self.corners
    }

    pub fn records(&self) -> &[TileRecord] {
        &self.records
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    /// Whether some fragment started without entering the tile.
    pub fn no_entry_shape_exists(&self) -> bool {
        self.no_entry_shape_exists
    }

    /// Append a coordinate of shape `shape_id`.
    ///
    /// A new fragment starts when `is_entry` is set, when none is open, when
    /// the open one has already exited, or when the shape changes.
    /// `attributes` are captured when a fragment starts.
    pub fn add_coordinate(
        &mut self,
        shape_id: i64,
        coord: Coord<f64>,
        is_entry: bool,
        is_exit: bool,
        attributes: &Attributes,
    ) {
        let index = match self.current {
            Some(i)
                if !is_entry
                    && !self.records[i].exited()
                    && self.records[i].shape_id() == shape_id =>
            {
                i
            }
            _ => self.start_record(shape_id, is_entry, attributes),
        };

        let record = &mut self.records[index];
        record.push(coord);
        if is_exit {
            record.set_exited(true);
        }
    }

    fn start_record(&mut self, shape_id: i64, is_entry: bool, attributes: &Attributes) -> usize {
        let mut record = TileRecord::new(shape_id, attributes.clone());
        record.set_entered(is_entry);
        if !is_entry {
            self.no_entry_shape_exists = true;
        }
        self.records.push(record);
        let index = self.records.len() - 1;
        self.current = Some(index);
        index
    }

    /// Attach a hole ring to the open fragment.
    ///
    /// # Errors
    ///
    /// Returns `IllegalState` when no fragment is open.
    pub fn add_hole(&mut self, points: &[Coord<f64>], attributes: &Attributes) -> TileResult<()> {
        let index = self
            .current
            .ok_or_else(|| TileError::illegal_state("no open fragment to attach a hole to"))?;
        let record = &mut self.records[index];
        let mut hole = TileRecord::new(record.shape_id(), attributes.clone());
        hole.extend(points.iter().copied());
        record.add_hole(hole);
        Ok(())
    }

    /// Mark the tile as lying wholly inside a polygon.
    pub fn mark_filled(&mut self, attributes: &Attributes) {
        self.filled = true;
        self.filled_attributes = attributes.clone();
    }

    /// End the open fragment; the next coordinate starts a new one.
    pub fn close_fragment(&mut self) {
        self.current = None;
    }

    /// Join the fragment that entered but never exited with the one that
    /// exited but never entered.
    ///
    /// Only a single such pair is resolved. The entered fragment comes first
    /// and the shared junction point is kept once; a junction that does not
    /// coincide is logged and joined anyway. Any other mix of unmatched
    /// fragments is logged and left alone.
    pub fn join_orphan_polygons(&mut self) {
        self.current = None;
        if !self.no_entry_shape_exists {
            return;
        }

        let no_exit: Vec<usize> = self.indices(|r| r.entered() && !r.exited());
        let no_entry: Vec<usize> = self.indices(|r| r.exited() && !r.entered());

        match (no_exit.as_slice(), no_entry.as_slice()) {
            ([], []) => {}
            (&[head], &[tail]) => self.splice_orphans(head, tail),
            _ => warn!(
                sector = %self.sector,
                no_exit = no_exit.len(),
                no_entry = no_entry.len(),
                "Unresolved orphan fragments"
            ),
        }
    }

    fn indices(&self, predicate: impl Fn(&TileRecord) -> bool) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| predicate(r))
            .map(|(i, _)| i)
            .collect()
    }

    fn splice_orphans(&mut self, head: usize, tail: usize) {
        let mut tail_record = self.records.remove(tail);
        let head = if tail < head { head - 1 } else { head };
        let mut coords = tail_record.take_coords();

        let record = &mut self.records[head];
        match (record.last(), coords.first().copied()) {
            (Some(end), Some(start)) if end == start => {
                coords.remove(0);
            }
            (end, start) => warn!(
                sector = %self.sector,
                ?end,
                ?start,
                "Orphan fragments do not meet, joining anyway"
            ),
        }

        record.extend(coords);
        for hole in tail_record.take_holes() {
            record.add_hole(hole);
        }
        record.set_exited(true);
        debug!(sector = %self.sector, shape_id = record.shape_id(), "Joined orphan fragments");
    }

    /// Close every fragment that entered and exited into rings.
    ///
    /// Crossings are paired per shape. Within a shape, exits and entries are
    /// each ranked clockwise; the pairing offset comes from the first exit
    /// that is immediately followed by an entry at a different point, and
    /// exit `k` then joins entry `k + offset`. Chains formed by the pairing
    /// are spliced in order with the corners between each exit and its
    /// entry, and closed on their first coordinate.
    ///
    /// A filled tile without any crossing gets one record of its four
    /// corners.
    pub fn complete_polygons(&mut self) {
        self.current = None;

        let crossing = self.indices(|r| r.is_crossing() && !r.coords().is_empty());
        if crossing.is_empty() {
            if self.filled {
                let record = TileRecord::corner_fill(&self.corners, self.filled_attributes.clone());
                self.records.push(record);
            }
            return;
        }
        if self.filled {
            debug!(sector = %self.sector, "Filled tile has boundary crossings, fill ignored");
        }

        let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for &i in &crossing {
            groups.entry(self.records[i].shape_id()).or_default().push(i);
        }

        let mut links: BTreeMap<usize, (EntryExit, EntryExit)> = BTreeMap::new();
        for members in groups.values() {
            links.extend(self.pair_crossings(members));
        }

        let mut slots: Vec<Option<TileRecord>> =
            std::mem::take(&mut self.records).into_iter().map(Some).collect();
        let mut completed = Vec::with_capacity(slots.len());

        for start in 0..slots.len() {
            let Some(mut chain) = slots[start].take() else {
                continue;
            };
            if !links.contains_key(&start) {
                completed.push(chain);
                continue;
            }

            let mut current = start;
            while let Some(&(exit, entry)) = links.get(&current) {
                self.insert_corners(&mut chain, &exit, &entry);
                let next = entry.record;
                if next == start {
                    break;
                }
                let Some(mut member) = slots[next].take() else {
                    break;
                };
                chain.extend(member.take_coords());
                for hole in member.take_holes() {
                    chain.add_hole(hole);
                }
                current = next;
            }
            chain.close();
            completed.push(chain);
        }

        redistribute_holes(&mut completed);
        debug!(
            sector = %self.sector,
            crossings = crossing.len(),
            records = completed.len(),
            "Completed tile polygons"
        );
        self.records = completed;
    }

    /// Link each exit of one shape to the entry it closes onto.
    fn pair_crossings(&self, members: &[usize]) -> Vec<(usize, (EntryExit, EntryExit))> {
        let mut markers: Vec<EntryExit> = Vec::with_capacity(members.len() * 2);
        for &index in members {
            let record = &self.records[index];
            if let (Some(first), Some(last)) = (record.first(), record.last()) {
                markers.push(EntryExit::new(first, self.centroid, true, index));
                markers.push(EntryExit::new(last, self.centroid, false, index));
            }
        }
        markers.sort();

        let n = markers.len();
        let mut ranks = vec![0; n];
        let (mut entries, mut exits) = (Vec::new(), Vec::new());
        for (i, marker) in markers.iter().enumerate() {
            if marker.entry {
                ranks[i] = entries.len();
                entries.push(*marker);
            } else {
                ranks[i] = exits.len();
                exits.push(*marker);
            }
        }
        let k = exits.len();
        if k == 0 {
            return Vec::new();
        }

        let exit_then_entry = |i: usize| markers[i].is_exit() && markers[(i + 1) % n].entry;
        let transition = (0..n)
            .find(|&i| exit_then_entry(i) && markers[i].coord != markers[(i + 1) % n].coord)
            .or_else(|| (0..n).find(|&i| exit_then_entry(i)));
        let offset = match transition {
            Some(i) => (ranks[(i + 1) % n] + k - ranks[i]) % k,
            None => 0,
        };

        exits
            .iter()
            .enumerate()
            .map(|(rank, exit)| (exit.record, (*exit, entries[(rank + offset) % k])))
            .collect()
    }

    /// Append the corners strictly inside the clockwise arc from `exit` to
    /// `entry`.
    fn insert_corners(&self, chain: &mut TileRecord, exit: &EntryExit, entry: &EntryExit) {
        if exit.coord == entry.coord {
            return;
        }
        let span = clockwise_span(exit.angle, entry.angle);
        let mut between: Vec<(f64, Coord<f64>)> = self
            .corners
            .iter()
            .filter_map(|&corner| {
                let sweep = clockwise_span(exit.angle, clockwise_angle(self.centroid, corner));
                (sweep > 0.0 && sweep < span).then_some((sweep, corner))
            })
            .collect();
        between.sort_by(|a, b| a.0.total_cmp(&b.0));
        chain.extend(between.into_iter().map(|(_, corner)| corner));
    }

    /// Convert the surviving records into output features.
    ///
    /// Polygon mode builds a polygon per record with its holes and drops
    /// rings that enclose no area; line mode builds line strings.
    pub fn create_records(&self, schema: &FeatureSchema, is_polygon: bool) -> Vec<Feature> {
        self.records
            .iter()
            .filter_map(|record| {
                let geometry = if is_polygon {
                    polygon_of(record).map(Geometry::Polygon)
                } else {
                    (record.coords().len() >= 2)
                        .then(|| Geometry::LineString(ring(record.coords())))
                };
                Some(Feature {
                    shape_id: record.shape_id(),
                    geometry: geometry?,
                    attributes: schema.project(record.attributes()),
                })
            })
            .collect()
    }
}

fn ring(coords: &[Coord<f64>]) -> LineString<f64> {
    LineString::from(coords.to_vec())
}

fn polygon_of(record: &TileRecord) -> Option<Polygon<f64>> {
    if record.coords().len() < 3 {
        return None;
    }
    let holes = record
        .holes()
        .iter()
        .filter(|hole| hole.coords().len() >= 3)
        .map(|hole| ring(hole.coords()))
        .collect();
    let exterior = ring(record.coords());
    let enclosed = Polygon::new(exterior.clone(), Vec::new()).unsigned_area();
    (enclosed > 0.0).then(|| Polygon::new(exterior, holes))
}

/// Move each hole onto the ring of its shape that contains it.
fn redistribute_holes(records: &mut [TileRecord]) {
    let mut holes = Vec::new();
    for (origin, record) in records.iter_mut().enumerate() {
        for hole in record.take_holes() {
            holes.push((origin, hole));
        }
    }
    if holes.is_empty() {
        return;
    }

    let outlines: Vec<Option<Polygon<f64>>> = records
        .iter()
        .map(|r| (r.coords().len() >= 3).then(|| Polygon::new(ring(r.coords()), vec![])))
        .collect();

    for (origin, hole) in holes {
        let target = hole
            .first()
            .and_then(|start| {
                records.iter().zip(&outlines).position(|(record, outline)| {
                    record.shape_id() == hole.shape_id()
                        && outline
                            .as_ref()
                            .is_some_and(|o| o.contains(&Point::from(start)))
                })
            })
            .unwrap_or(origin);
        records[target].add_hole(hole);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn unit_tile() -> ShapefileTile {
        ShapefileTile::new(Sector::new(0.0, 0.0, 1.0, 1.0).unwrap())
    }

    fn attrs(name: &str) -> Attributes {
        let mut attrs = Attributes::new();
        attrs.insert("name".to_string(), json!(name));
        attrs
    }

    /// Stream `coords` as one fragment; the first enters and the last
    /// exits as requested.
    fn fragment(tile: &mut ShapefileTile, id: i64, coords: &[Coord<f64>], enter: bool, exit: bool) {
        let last = coords.len() - 1;
        for (i, &coord) in coords.iter().enumerate() {
            tile.add_coordinate(id, coord, enter && i == 0, exit && i == last, &attrs("a"));
        }
    }

    #[test]
    fn test_add_coordinate_starts_records() {
        let mut tile = unit_tile();
        let a = attrs("a");
        tile.add_coordinate(1, c(0.0, 0.5), true, false, &a);
        tile.add_coordinate(1, c(0.5, 0.5), false, false, &a);
        tile.add_coordinate(1, c(1.0, 0.5), false, true, &a);
        // Open record exited: a new one starts without entry
        tile.add_coordinate(1, c(0.5, 0.6), false, false, &a);
        // Shape change
        tile.add_coordinate(2, c(0.5, 0.7), false, false, &a);

        let records = tile.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].coords().len(), 3);
        assert!(records[0].is_crossing());
        assert!(!records[1].entered());
        assert_eq!(records[2].shape_id(), 2);
        assert!(tile.no_entry_shape_exists());
    }

    #[test]
    fn test_entry_always_starts_record() {
        let mut tile = unit_tile();
        let a = attrs("a");
        tile.add_coordinate(1, c(0.0, 0.5), true, false, &a);
        tile.add_coordinate(1, c(0.0, 0.6), true, false, &a);
        assert_eq!(tile.records().len(), 2);
        assert!(!tile.no_entry_shape_exists());
    }

    #[test]
    fn test_add_hole_without_open_record() {
        let mut tile = unit_tile();
        let result = tile.add_hole(&[c(0.1, 0.1), c(0.2, 0.1), c(0.2, 0.2)], &attrs("a"));
        assert!(matches!(result, Err(TileError::IllegalState(_))));

        tile.add_coordinate(1, c(0.5, 0.5), false, false, &attrs("a"));
        tile.close_fragment();
        assert!(tile.add_hole(&[c(0.1, 0.1)], &attrs("a")).is_err());
    }

    #[test]
    fn test_filled_tile_emits_corners_clockwise() {
        let mut tile = ShapefileTile::new(Sector::new(10.0, 20.0, 11.0, 22.0).unwrap());
        tile.mark_filled(&attrs("lake"));
        tile.join_orphan_polygons();
        tile.complete_polygons();

        let records = tile.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].shape_id(), -1);
        assert_eq!(
            records[0].coords(),
            &[c(20.0, 10.0), c(20.0, 11.0), c(22.0, 11.0), c(22.0, 10.0)]
        );
        assert_eq!(records[0].attributes(), &attrs("lake"));
    }

    #[test]
    fn test_same_point_entry_exit_unchanged() {
        let mut tile = unit_tile();
        let coords = [c(0.5, 0.0), c(0.4, 0.3), c(0.6, 0.3), c(0.5, 0.0)];
        fragment(&mut tile, 1, &coords, true, true);
        tile.complete_polygons();

        assert_eq!(tile.records().len(), 1);
        assert_eq!(tile.records()[0].coords(), &coords);
    }

    #[test]
    fn test_corner_inserted_between_exit_and_entry() {
        // Clockwise square [0.5, 1.5]² clipped to the unit tile
        let mut tile = unit_tile();
        fragment(&mut tile, 1, &[c(1.0, 0.5), c(0.5, 0.5), c(0.5, 1.0)], true, true);
        tile.complete_polygons();

        let record = &tile.records()[0];
        assert_eq!(
            record.coords(),
            &[c(1.0, 0.5), c(0.5, 0.5), c(0.5, 1.0), c(1.0, 1.0), c(1.0, 0.5)]
        );
    }

    #[test]
    fn test_two_fragments_of_one_band_chain() {
        let mut tile = unit_tile();
        fragment(&mut tile, 1, &[c(0.0, 0.4), c(1.0, 0.4)], true, true);
        fragment(&mut tile, 1, &[c(1.0, 0.2), c(0.0, 0.2)], true, true);
        tile.complete_polygons();

        assert_eq!(tile.records().len(), 1);
        let features = tile.create_records(&FeatureSchema::all(), true);
        let Geometry::Polygon(polygon) = &features[0].geometry else {
            panic!("expected polygon");
        };
        assert!((polygon.unsigned_area() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_exit_wrapping_past_all_corners() {
        // Most of the tile: a notch cut from the north edge
        let mut tile = unit_tile();
        fragment(&mut tile, 1, &[c(0.4, 1.0), c(0.5, 0.8), c(0.6, 1.0)], true, true);
        tile.complete_polygons();

        let record = &tile.records()[0];
        assert_eq!(record.coords().len(), 3 + 4 + 1);
        let features = tile.create_records(&FeatureSchema::all(), true);
        let Geometry::Polygon(polygon) = &features[0].geometry else {
            panic!("expected polygon");
        };
        assert!((polygon.unsigned_area() - (1.0 - 0.02)).abs() < 1e-12);
    }

    #[test]
    fn test_shapes_paired_separately() {
        // Two neighbours meeting on x = 0.5, each entering where the other exits
        let mut tile = unit_tile();
        fragment(&mut tile, 1, &[c(0.5, 1.0), c(0.5, 0.0)], true, true);
        fragment(&mut tile, 2, &[c(0.5, 0.0), c(0.5, 1.0)], true, true);
        tile.complete_polygons();

        let features = tile.create_records(&FeatureSchema::all(), true);
        assert_eq!(features.len(), 2);
        for feature in &features {
            let Geometry::Polygon(polygon) = &feature.geometry else {
                panic!("expected polygon");
            };
            assert!((polygon.unsigned_area() - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_join_orphans() {
        // B enters at P and stops at Q; A starts at Q and exits at P
        let mut tile = unit_tile();
        let p = c(0.5, 0.0);
        let q = c(0.5, 0.5);
        fragment(&mut tile, 1, &[q, c(0.7, 0.3), p], false, true);
        fragment(&mut tile, 1, &[p, c(0.3, 0.3), q], true, false);
        tile.join_orphan_polygons();

        let records = tile.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_crossing());
        assert_eq!(
            records[0].coords(),
            &[p, c(0.3, 0.3), q, c(0.7, 0.3), p]
        );
    }

    #[test]
    fn test_join_orphans_mismatched_junction() {
        let mut tile = unit_tile();
        fragment(&mut tile, 1, &[c(0.5, 0.6), c(1.0, 0.6)], false, true);
        fragment(&mut tile, 1, &[c(0.0, 0.6), c(0.5, 0.5)], true, false);
        tile.join_orphan_polygons();

        assert_eq!(tile.records().len(), 1);
        assert_eq!(tile.records()[0].coords().len(), 4);
    }

    #[test]
    fn test_multiple_orphan_pairs_left_alone() {
        let mut tile = unit_tile();
        fragment(&mut tile, 1, &[c(0.5, 0.6), c(1.0, 0.6)], false, true);
        fragment(&mut tile, 2, &[c(0.5, 0.2), c(1.0, 0.2)], false, true);
        fragment(&mut tile, 1, &[c(0.0, 0.6), c(0.5, 0.6)], true, false);
        fragment(&mut tile, 2, &[c(0.0, 0.2), c(0.5, 0.2)], true, false);
        tile.join_orphan_polygons();
        assert_eq!(tile.records().len(), 4);
    }

    #[test]
    fn test_hole_moves_to_containing_ring() {
        let mut tile = unit_tile();
        // Two separate bumps from the south edge, hole attached to the second
        fragment(&mut tile, 1, &[c(0.1, 0.0), c(0.1, 0.5), c(0.4, 0.5), c(0.4, 0.0)], true, true);
        fragment(&mut tile, 1, &[c(0.6, 0.0), c(0.6, 0.5), c(0.9, 0.5), c(0.9, 0.0)], true, true);
        tile.add_hole(&[c(0.2, 0.2), c(0.3, 0.2), c(0.3, 0.3), c(0.2, 0.3)], &attrs("a"))
            .unwrap();
        tile.complete_polygons();

        let records = tile.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].holes().len(), 1);
        assert!(records[1].holes().is_empty());
    }

    #[test]
    fn test_create_records_line_mode() {
        let mut tile = unit_tile();
        fragment(&mut tile, 4, &[c(0.0, 0.5), c(1.0, 0.5)], true, true);
        tile.add_coordinate(5, c(0.2, 0.2), false, false, &attrs("b"));

        let features = tile.create_records(&FeatureSchema::new(["name"]), false);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].shape_id, 4);
        assert!(matches!(features[0].geometry, Geometry::LineString(_)));
        assert_eq!(features[0].attributes, attrs("a"));
    }

    #[test]
    fn test_degenerate_polygon_dropped() {
        let mut tile = unit_tile();
        fragment(&mut tile, 1, &[c(0.0, 0.0), c(1.0, 0.0), c(0.5, 0.0)], false, false);
        assert!(tile.create_records(&FeatureSchema::all(), true).is_empty());
    }

    #[test]
    fn test_inside_ring_and_fill_become_polygons() {
        let mut tile = unit_tile();
        let square = [c(0.2, 0.2), c(0.2, 0.8), c(0.8, 0.8), c(0.8, 0.2), c(0.2, 0.2)];
        fragment(&mut tile, 1, &square, false, false);
        tile.close_fragment();
        tile.complete_polygons();

        let features = tile.create_records(&FeatureSchema::all(), true);
        assert_eq!(features.len(), 1);
        let Geometry::Polygon(polygon) = &features[0].geometry else {
            panic!("expected polygon");
        };
        assert!((polygon.unsigned_area() - 0.36).abs() < 1e-12);

        let mut filled = unit_tile();
        filled.mark_filled(&attrs("sea"));
        filled.complete_polygons();
        let features = filled.create_records(&FeatureSchema::all(), true);
        assert_eq!(features.len(), 1);
        let Geometry::Polygon(polygon) = &features[0].geometry else {
            panic!("expected polygon");
        };
        assert!((polygon.unsigned_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_four_notches_bridge_corners() {
        // The tile minus a notch on each edge, met clockwise N, E, S, W
        let mut tile = unit_tile();
        fragment(&mut tile, 1, &[c(0.4, 1.0), c(0.5, 0.8), c(0.6, 1.0)], true, true);
        fragment(&mut tile, 1, &[c(1.0, 0.6), c(0.8, 0.5), c(1.0, 0.4)], true, true);
        fragment(&mut tile, 1, &[c(0.6, 0.0), c(0.5, 0.2), c(0.4, 0.0)], true, true);
        fragment(&mut tile, 1, &[c(0.0, 0.4), c(0.2, 0.5), c(0.0, 0.6)], true, true);
        tile.complete_polygons();

        assert_eq!(tile.records().len(), 1);
        let coords = tile.records()[0].coords();
        assert_eq!(coords.len(), 12 + 4 + 1);
        for &corner in tile.corners() {
            assert_eq!(coords.iter().filter(|&&p| p == corner).count(), 1);
        }

        let features = tile.create_records(&FeatureSchema::all(), true);
        assert_eq!(features.len(), 1);
        let Geometry::Polygon(polygon) = &features[0].geometry else {
            panic!("expected polygon");
        };
        assert!((polygon.unsigned_area() - (1.0 - 4.0 * 0.02)).abs() < 1e-12);
    }
}
