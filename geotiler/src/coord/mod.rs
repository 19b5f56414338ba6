//! Coordinate model shared by the raster and vector pipelines.
//!
//! Provides the [`Sector`] bounding box every tile is cut against, and
//! conversions between geographic coordinates (latitude/longitude) and
//! Web Mercator metres used when a raster source has to be reprojected.

mod sector;

pub use sector::Sector;

use crate::error::{TileError, TileResult};

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// WGS84 semi-major axis in metres, the Web Mercator sphere radius.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Converts geographic coordinates to Web Mercator (EPSG:3857) metres.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
///
/// # Returns
///
/// `(x, y)` in metres, or an error if the inputs are outside the projection.
#[inline]
pub fn to_mercator(lat: f64, lon: f64) -> TileResult<(f64, f64)> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(TileError::invalid_argument(format!(
            "latitude {} outside Web Mercator range",
            lat
        )));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(TileError::invalid_argument(format!(
            "longitude {} outside [-180, 180]",
            lon
        )));
    }

    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * lat.to_radians().tan().asinh();
    Ok((x, y))
}

/// Converts Web Mercator metres back to geographic coordinates.
///
/// Returns `(lat, lon)` in degrees. Inputs outside the projected world are
/// not clamped; callers sampling a raster treat them as off-dataset.
#[inline]
pub fn from_mercator(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / EARTH_RADIUS_M).to_degrees();
    let lat = (y / EARTH_RADIUS_M).sinh().atan().to_degrees();
    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let (x, y) = to_mercator(0.0, 0.0).unwrap();
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_antimeridian_x() {
        let (x, _) = to_mercator(0.0, 180.0).unwrap();
        assert!((x - 20_037_508.342789244).abs() < 1e-6);
    }

    #[test]
    fn test_max_lat_is_square_world() {
        // The Mercator world is square at the clamp latitude
        let (_, y) = to_mercator(MAX_LAT, 0.0).unwrap();
        assert!((y - 20_037_508.34).abs() < 1.0, "y was {}", y);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_mercator(89.0, 0.0);
        assert!(matches!(result, Err(TileError::InvalidArgument(_))));
    }

    #[test]
    fn test_invalid_longitude() {
        let result = to_mercator(10.0, 181.0);
        assert!(matches!(result, Err(TileError::InvalidArgument(_))));
    }

    #[test]
    fn test_new_york_roundtrip() {
        let (x, y) = to_mercator(40.7128, -74.0060).unwrap();
        let (lat, lon) = from_mercator(x, y);
        assert!((lat - 40.7128).abs() < 1e-9);
        assert!((lon - -74.0060).abs() < 1e-9);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_roundtrip_property(
                lat in -85.05..85.05_f64,
                lon in -180.0..180.0_f64,
            ) {
                let (x, y) = to_mercator(lat, lon)?;
                let (converted_lat, converted_lon) = from_mercator(x, y);

                prop_assert!(
                    (converted_lat - lat).abs() < 1e-9,
                    "Latitude roundtrip failed: {} -> {}",
                    lat, converted_lat
                );
                prop_assert!(
                    (converted_lon - lon).abs() < 1e-9,
                    "Longitude roundtrip failed: {} -> {}",
                    lon, converted_lon
                );
            }

            #[test]
            fn test_latitude_monotonic(
                lat1 in -85.0..0.0_f64,
                lat2 in 0.0..85.0_f64,
            ) {
                let (_, y1) = to_mercator(lat1, 0.0)?;
                let (_, y2) = to_mercator(lat2, 0.0)?;
                prop_assert!(y1 <= y2, "lat {} (y {}) > lat {} (y {})", lat1, y1, lat2, y2);
            }
        }
    }
}
