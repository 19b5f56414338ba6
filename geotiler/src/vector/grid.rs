//! Splitting source geometries across a grid of tiles.
//!
//! Each geometry is clipped against every tile it overlaps. Polygon rings
//! are normalised first (exterior clockwise, holes counter-clockwise) so
//! that the area of a polygon always lies to the right of its rings, which
//! is what [`ShapefileTile::complete_polygons`] relies on.

use geo::{BoundingRect, Contains, Coord, Geometry, LineString, Point, Polygon, Rect, Winding};
use rayon::prelude::*;
use tracing::{debug, info};

use super::feature::{Feature, FeatureSchema};
use super::record::Attributes;
use super::source::{SourceFeature, VectorFeatureSource};
use super::tile::ShapefileTile;
use crate::coord::Sector;
use crate::error::{TileError, TileResult};

/// Features produced for one tile of the grid.
#[derive(Debug, Clone)]
pub struct TileFeatures {
    pub row: usize,
    pub col: usize,
    pub sector: Sector,
    pub features: Vec<Feature>,
}

/// A `rows × cols` grid of [`ShapefileTile`]s over a sector.
///
/// Row 0 is the southernmost row, column 0 the westernmost.
///
/// # Example
///
/// ```
/// use geo::polygon;
/// use geotiler::coord::Sector;
/// use geotiler::vector::{Attributes, FeatureSchema, SourceFeature, TileGrid};
///
/// let sector = Sector::new(0.0, 0.0, 2.0, 2.0).unwrap();
/// let mut grid = TileGrid::new(sector, 2, 2).unwrap();
///
/// let square = polygon![(x: 0.5, y: 0.5), (x: 1.5, y: 0.5), (x: 1.5, y: 1.5), (x: 0.5, y: 1.5)];
/// grid.split_feature(&SourceFeature::new(1, square, Attributes::new())).unwrap();
///
/// let tiles = grid.finish(&FeatureSchema::all(), true);
/// assert!(tiles.iter().all(|tile| tile.features.len() == 1));
/// ```
#[derive(Debug, Clone)]
pub struct TileGrid {
    sector: Sector,
    rows: usize,
    cols: usize,
    tiles: Vec<ShapefileTile>,
}

impl TileGrid {
    /// # Errors
    ///
    /// Returns `InvalidArgument` when either count is zero.
    pub fn new(sector: Sector, rows: usize, cols: usize) -> TileResult<Self> {
        let tiles = sector
            .subdivide(rows, cols)?
            .into_iter()
            .map(ShapefileTile::new)
            .collect();
        Ok(Self {
            sector,
            rows,
            cols,
            tiles,
        })
    }

    pub fn sector(&self) -> &Sector {
        &self.sector
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn tile(&self, row: usize, col: usize) -> Option<&ShapefileTile> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.tiles.get(row * self.cols + col)
    }

    /// Clip one feature into every tile it overlaps.
    ///
    /// # Errors
    ///
    /// Returns a `Tiler` error for point geometries, which cannot be split.
    pub fn split_feature(&mut self, feature: &SourceFeature) -> TileResult<()> {
        let mut polygons = Vec::new();
        let mut lines = Vec::new();
        collect_parts(&feature.geometry, &mut polygons, &mut lines)?;

        for polygon in &mut polygons {
            polygon.exterior_mut(|exterior| exterior.make_cw_winding());
            polygon.interiors_mut(|interiors| {
                for interior in interiors {
                    interior.make_ccw_winding();
                }
            });
        }

        let shape_id = feature.shape_id;
        let attributes = &feature.attributes;
        self.tiles.par_iter_mut().try_for_each(|tile| {
            let bounds = Bounds::of(tile.sector());
            for polygon in &polygons {
                if bounds.overlaps(polygon.bounding_rect()) {
                    split_polygon(tile, &bounds, shape_id, polygon, attributes)?;
                }
            }
            for line in &lines {
                if bounds.overlaps(line.bounding_rect()) {
                    split_line(tile, &bounds, shape_id, line, attributes);
                }
            }
            Ok(())
        })
    }

    /// Split every feature of `source`, returning how many were read.
    pub fn split_source(&mut self, source: &mut dyn VectorFeatureSource) -> TileResult<usize> {
        let mut count = 0;
        while let Some(feature) = source.next_feature()? {
            self.split_feature(&feature)?;
            count += 1;
        }
        info!(sector = %self.sector, features = count, "Split vector source");
        Ok(count)
    }

    /// Close all fragments and build the output features of every tile.
    ///
    /// Polygon mode joins orphan fragments and closes crossings along the
    /// tile boundary first; line mode emits the fragments as they are.
    pub fn finish(mut self, schema: &FeatureSchema, is_polygon: bool) -> Vec<TileFeatures> {
        if is_polygon {
            self.tiles.par_iter_mut().for_each(|tile| {
                tile.join_orphan_polygons();
                tile.complete_polygons();
            });
        }

        let cols = self.cols;
        let tiles: Vec<TileFeatures> = self
            .tiles
            .into_par_iter()
            .enumerate()
            .map(|(index, tile)| TileFeatures {
                row: index / cols,
                col: index % cols,
                sector: *tile.sector(),
                features: tile.create_records(schema, is_polygon),
            })
            .collect();

        debug!(
            sector = %self.sector,
            tiles = tiles.len(),
            features = tiles.iter().map(|t| t.features.len()).sum::<usize>(),
            "Finished tile grid"
        );
        tiles
    }
}

fn collect_parts(
    geometry: &Geometry<f64>,
    polygons: &mut Vec<Polygon<f64>>,
    lines: &mut Vec<LineString<f64>>,
) -> TileResult<()> {
    match geometry {
        Geometry::Polygon(p) => polygons.push(p.clone()),
        Geometry::MultiPolygon(mp) => polygons.extend(mp.0.iter().cloned()),
        Geometry::Rect(r) => polygons.push(r.to_polygon()),
        Geometry::Triangle(t) => polygons.push(t.to_polygon()),
        Geometry::LineString(l) => lines.push(l.clone()),
        Geometry::MultiLineString(ml) => lines.extend(ml.0.iter().cloned()),
        Geometry::Line(l) => lines.push(LineString::new(vec![l.start, l.end])),
        Geometry::GeometryCollection(gc) => {
            for part in gc {
                collect_parts(part, polygons, lines)?;
            }
        }
        Geometry::Point(_) | Geometry::MultiPoint(_) => {
            return Err(TileError::tiler("unsupported shape type: point"));
        }
    }
    Ok(())
}

/// Closed rectangle of one tile in `x = lon, y = lat`.
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: Coord<f64>,
    max: Coord<f64>,
}

impl Bounds {
    fn of(sector: &Sector) -> Self {
        let corners = sector.corners();
        Self {
            min: corners[0],
            max: corners[2],
        }
    }

    fn contains(&self, c: Coord<f64>) -> bool {
        c.x >= self.min.x && c.x <= self.max.x && c.y >= self.min.y && c.y <= self.max.y
    }

    fn clamp(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: c.x.clamp(self.min.x, self.max.x),
            y: c.y.clamp(self.min.y, self.max.y),
        }
    }

    fn overlaps(&self, rect: Option<Rect<f64>>) -> bool {
        rect.is_some_and(|r| {
            r.min().x <= self.max.x
                && r.max().x >= self.min.x
                && r.min().y <= self.max.y
                && r.max().y >= self.min.y
        })
    }

    /// Parameter range of segment `a → b` inside the bounds
    /// (Liang–Barsky).
    fn clip(&self, a: Coord<f64>, b: Coord<f64>) -> Option<(f64, f64)> {
        let d = b - a;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        for (p, q) in [
            (-d.x, a.x - self.min.x),
            (d.x, self.max.x - a.x),
            (-d.y, a.y - self.min.y),
            (d.y, self.max.y - a.y),
        ] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
            } else {
                let r = q / p;
                if p < 0.0 {
                    if r > t1 {
                        return None;
                    }
                    t0 = t0.max(r);
                } else {
                    if r < t0 {
                        return None;
                    }
                    t1 = t1.min(r);
                }
            }
        }
        Some((t0, t1))
    }
}

/// Streams clipped coordinates of one ring or line into a tile.
///
/// The end of an inside run is held back until the following segment
/// shows whether it leaves the tile there.
struct FragmentStream<'a> {
    tile: &'a mut ShapefileTile,
    bounds: Bounds,
    shape_id: i64,
    attributes: &'a Attributes,
    open: bool,
    pending: Option<Coord<f64>>,
    entries: usize,
}

impl<'a> FragmentStream<'a> {
    fn new(
        tile: &'a mut ShapefileTile,
        bounds: Bounds,
        shape_id: i64,
        attributes: &'a Attributes,
    ) -> Self {
        Self {
            tile,
            bounds,
            shape_id,
            attributes,
            open: false,
            pending: None,
            entries: 0,
        }
    }

    fn emit(&mut self, coord: Coord<f64>, is_entry: bool, is_exit: bool) {
        self.tile
            .add_coordinate(self.shape_id, coord, is_entry, is_exit, self.attributes);
    }

    /// Start inside the tile without an entry crossing.
    fn start_inside(&mut self, coord: Coord<f64>) {
        self.open = true;
        self.pending = Some(coord);
    }

    fn segment(&mut self, a: Coord<f64>, b: Coord<f64>) {
        if a == b {
            return;
        }
        let clipped = self.bounds.clip(a, b).filter(|(t0, t1)| t0 < t1);
        let Some((t0, t1)) = clipped else {
            if self.open {
                if let Some(last) = self.pending.take() {
                    self.emit(last, false, true);
                }
                self.open = false;
            }
            return;
        };

        let at = |t: f64| self.bounds.clamp(a + (b - a) * t);
        let (start, end) = (at(t0), if t1 < 1.0 { at(t1) } else { b });

        if self.open {
            if let Some(last) = self.pending.take() {
                self.emit(last, false, false);
            }
        } else {
            self.emit(start, true, false);
            self.entries += 1;
            self.open = true;
        }

        if t1 < 1.0 {
            self.emit(end, false, true);
            self.open = false;
        } else {
            self.pending = Some(end);
        }
    }

    /// Flush the held-back point, as an exit for rings.
    fn finish(mut self, as_exit: bool) -> usize {
        if let Some(last) = self.pending.take() {
            self.emit(last, false, as_exit);
        }
        self.tile.close_fragment();
        self.entries
    }
}

/// Ring vertices without the closing duplicate.
fn open_ring(ring: &LineString<f64>) -> &[Coord<f64>] {
    match ring.0.as_slice() {
        [rest @ .., last] if ring.0.len() > 1 && Some(last) == ring.0.first() => rest,
        all => all,
    }
}

/// Stream a ring that is not wholly inside the tile, returning the number
/// of fragments it produced.
fn stream_crossing_ring(
    tile: &mut ShapefileTile,
    bounds: &Bounds,
    shape_id: i64,
    vertices: &[Coord<f64>],
    attributes: &Attributes,
) -> usize {
    let Some(start) = vertices.iter().position(|&v| !bounds.contains(v)) else {
        return 0;
    };
    let n = vertices.len();
    let mut stream = FragmentStream::new(tile, *bounds, shape_id, attributes);
    for i in 0..n {
        let a = vertices[(start + i) % n];
        let b = vertices[(start + i + 1) % n];
        stream.segment(a, b);
    }
    stream.finish(true)
}

fn split_polygon(
    tile: &mut ShapefileTile,
    bounds: &Bounds,
    shape_id: i64,
    polygon: &Polygon<f64>,
    attributes: &Attributes,
) -> TileResult<()> {
    let inside = |ring: &LineString<f64>| open_ring(ring).iter().all(|&v| bounds.contains(v));

    let exterior = polygon.exterior();
    let mut produced = false;
    if inside(exterior) {
        tile.close_fragment();
        for &coord in &exterior.0 {
            tile.add_coordinate(shape_id, coord, false, false, attributes);
        }
        produced = true;
    } else {
        let vertices = open_ring(exterior);
        produced |= stream_crossing_ring(tile, bounds, shape_id, vertices, attributes) > 0;
    }

    let (inside_holes, outside_holes): (Vec<&LineString<f64>>, Vec<&LineString<f64>>) =
        polygon.interiors().iter().partition(|hole| inside(*hole));

    let mut hole_crossed = false;
    for hole in &outside_holes {
        let vertices = open_ring(hole);
        hole_crossed |= stream_crossing_ring(tile, bounds, shape_id, vertices, attributes) > 0;
    }

    if produced || hole_crossed {
        for hole in &inside_holes {
            tile.add_hole(&hole.0, attributes)?;
        }
    } else {
        let reduced = Polygon::new(
            exterior.clone(),
            outside_holes.iter().map(|&hole| hole.clone()).collect(),
        );
        if reduced.contains(&Point::from(tile.centroid())) {
            if inside_holes.is_empty() {
                tile.mark_filled(attributes);
            } else {
                tile.close_fragment();
                for corner in *tile.corners() {
                    tile.add_coordinate(shape_id, corner, false, false, attributes);
                }
                for hole in &inside_holes {
                    tile.add_hole(&hole.0, attributes)?;
                }
            }
        }
    }

    tile.close_fragment();
    Ok(())
}

fn split_line(
    tile: &mut ShapefileTile,
    bounds: &Bounds,
    shape_id: i64,
    line: &LineString<f64>,
    attributes: &Attributes,
) {
    let Some(&first) = line.0.first() else {
        return;
    };
    tile.close_fragment();
    let mut stream = FragmentStream::new(tile, *bounds, shape_id, attributes);
    if bounds.contains(first) {
        stream.start_inside(first);
    }
    for pair in line.0.windows(2) {
        stream.segment(pair[0], pair[1]);
    }
    stream.finish(false);
}
