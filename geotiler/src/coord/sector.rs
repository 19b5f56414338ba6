//! Latitude/longitude bounding boxes.

use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::error::{TileError, TileResult};

/// An axis-aligned latitude/longitude bounding box, in degrees.
///
/// Sectors are immutable values. Construction guarantees `min < max` on
/// both axes, so the deltas are always strictly positive.
///
/// # Example
///
/// ```
/// use geotiler::coord::Sector;
///
/// let sector = Sector::new(-10.0, 20.0, 10.0, 40.0).unwrap();
/// assert_eq!(sector.center_lat(), 0.0);
/// assert_eq!(sector.delta_lon(), 20.0);
/// assert!(sector.contains_point(5.0, 25.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SectorBounds")]
pub struct Sector {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

/// Unchecked sector fields as they appear on the wire.
#[derive(Deserialize)]
struct SectorBounds {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

impl TryFrom<SectorBounds> for Sector {
    type Error = TileError;

    fn try_from(bounds: SectorBounds) -> TileResult<Self> {
        Sector::new(bounds.min_lat, bounds.min_lon, bounds.max_lat, bounds.max_lon)
    }
}

impl Sector {
    /// Create a new sector.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `min >= max` on either axis or any bound
    /// is not a number.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> TileResult<Self> {
        if min_lat.is_nan() || max_lat.is_nan() || min_lat >= max_lat {
            return Err(TileError::invalid_argument(format!(
                "sector min_lat {} must be less than max_lat {}",
                min_lat, max_lat
            )));
        }
        if min_lon.is_nan() || max_lon.is_nan() || min_lon >= max_lon {
            return Err(TileError::invalid_argument(format!(
                "sector min_lon {} must be less than max_lon {}",
                min_lon, max_lon
            )));
        }
        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// The whole WGS84 world.
    pub fn full_sphere() -> Self {
        Self {
            min_lat: -90.0,
            min_lon: -180.0,
            max_lat: 90.0,
            max_lon: 180.0,
        }
    }

    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    pub fn center_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    pub fn center_lon(&self) -> f64 {
        (self.min_lon + self.max_lon) / 2.0
    }

    /// Centre as an `x = lon, y = lat` coordinate.
    pub fn centroid(&self) -> Coord<f64> {
        Coord {
            x: self.center_lon(),
            y: self.center_lat(),
        }
    }

    pub fn delta_lat(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn delta_lon(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// Whether the point lies inside the sector, boundary included.
    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Whether two sectors share any area or boundary.
    pub fn intersects(&self, other: &Sector) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }

    /// The four corners as `x = lon, y = lat` coordinates, clockwise starting
    /// at the south-west corner.
    pub fn corners(&self) -> [Coord<f64>; 4] {
        [
            Coord {
                x: self.min_lon,
                y: self.min_lat,
            },
            Coord {
                x: self.min_lon,
                y: self.max_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.max_lat,
            },
            Coord {
                x: self.max_lon,
                y: self.min_lat,
            },
        ]
    }

    /// Split into a `rows × cols` grid of child sectors.
    ///
    /// Children are returned row-major; row 0 is the southernmost row and
    /// column 0 the westernmost column. The outer edges of the grid reuse
    /// this sector's bounds exactly.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when either count is zero.
    pub fn subdivide(&self, rows: usize, cols: usize) -> TileResult<Vec<Sector>> {
        if rows == 0 || cols == 0 {
            return Err(TileError::invalid_argument(format!(
                "cannot subdivide sector into {}x{} cells",
                rows, cols
            )));
        }

        let lat_edge = |i: usize| {
            if i == rows {
                self.max_lat
            } else {
                self.min_lat + self.delta_lat() * i as f64 / rows as f64
            }
        };
        let lon_edge = |j: usize| {
            if j == cols {
                self.max_lon
            } else {
                self.min_lon + self.delta_lon() * j as f64 / cols as f64
            }
        };

        let mut cells = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                cells.push(Sector::new(
                    lat_edge(row),
                    lon_edge(col),
                    lat_edge(row + 1),
                    lon_edge(col + 1),
                )?);
            }
        }
        Ok(cells)
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}] - [{}, {}]",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}
