//! Boundary crossing markers.

use std::cmp::Ordering;
use std::f64::consts::TAU;

use geo::Coord;

/// Clockwise angle of `coord` around `centroid`, in `(-π, π]`.
///
/// Larger angles are further clockwise; the sweep starts due west.
pub fn clockwise_angle(centroid: Coord<f64>, coord: Coord<f64>) -> f64 {
    -(coord.y - centroid.y).atan2(coord.x - centroid.x)
}

/// Clockwise sweep from angle `from` to angle `to`, in `[0, 2π)`.
pub fn clockwise_span(from: f64, to: f64) -> f64 {
    (to - from).rem_euclid(TAU)
}

/// A point where a fragment enters or leaves a tile.
///
/// Markers order by clockwise angle around the tile centroid; at equal
/// angles exits sort before entries.
#[derive(Debug, Clone, Copy)]
pub struct EntryExit {
    pub coord: Coord<f64>,
    pub angle: f64,
    pub entry: bool,
    /// Handle of the owning record in the tile.
    pub record: usize,
}

impl EntryExit {
    pub fn new(coord: Coord<f64>, centroid: Coord<f64>, entry: bool, record: usize) -> Self {
        Self {
            coord,
            angle: clockwise_angle(centroid, coord),
            entry,
            record,
        }
    }

    pub fn is_exit(&self) -> bool {
        !self.entry
    }
}

impl PartialEq for EntryExit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EntryExit {}

impl PartialOrd for EntryExit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntryExit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.angle
            .total_cmp(&other.angle)
            .then(self.entry.cmp(&other.entry))
            .then(self.record.cmp(&other.record))
    }
}
