//! Raster tile requests.

use std::fmt;
use std::sync::Arc;

use super::RasterDataset;
use crate::config::RasterConfig;
use crate::coord::Sector;
use crate::error::{TileError, TileResult};

/// Inclusive per-band value range used by [`ValueReplacement`].
#[derive(Debug, Clone, PartialEq)]
pub struct BandRange {
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

impl BandRange {
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> Self {
        Self { min, max }
    }

    /// Whether every band sample lies within its `[min, max]`.
    pub fn contains(&self, samples: &[f64]) -> bool {
        samples
            .iter()
            .zip(self.min.iter().zip(&self.max))
            .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }
}

/// Value replacement rules applied to a read tile.
///
/// A pixel whose bands all fall within any one of `ranges` gets
/// `replacement[b]` written to each band `b` that has a value; every other
/// pixel gets `otherwise[b]` for the bands that have one. Bands whose slot is
/// `None` keep their sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueReplacement {
    pub ranges: Vec<BandRange>,
    pub replacement: Vec<Option<f64>>,
    pub otherwise: Vec<Option<f64>>,
}

impl ValueReplacement {
    pub fn new(
        ranges: Vec<BandRange>,
        replacement: Vec<Option<f64>>,
        otherwise: Vec<Option<f64>>,
    ) -> Self {
        Self {
            ranges,
            replacement,
            otherwise,
        }
    }

    /// True when no slot would write anything.
    pub fn is_noop(&self) -> bool {
        self.replacement.iter().chain(&self.otherwise).all(Option::is_none)
    }

    /// Check every length against a buffer's band count.
    pub(crate) fn validate(&self, band_count: usize) -> TileResult<()> {
        if self.replacement.len() != band_count || self.otherwise.len() != band_count {
            return Err(TileError::invalid_argument(format!(
                "replacement has {}/{} slots, buffer has {} bands",
                self.replacement.len(),
                self.otherwise.len(),
                band_count
            )));
        }
        for range in &self.ranges {
            if range.min.len() != band_count || range.max.len() != band_count {
                return Err(TileError::invalid_argument(format!(
                    "replacement range has {}/{} bounds, buffer has {} bands",
                    range.min.len(),
                    range.max.len(),
                    band_count
                )));
            }
        }
        Ok(())
    }
}

/// A request to read one tile of a raster dataset.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use geotiler::coord::Sector;
/// use geotiler::raster::{GeoTransform, MemoryDataset, RasterTileRequest, SpatialRef};
///
/// let dataset = Arc::new(MemoryDataset::new(4, 4, GeoTransform::default(), SpatialRef::Wgs84));
/// let sector = Sector::new(-4.0, 0.0, 0.0, 4.0).unwrap();
/// let request = RasterTileRequest::new(dataset, 256, 256, sector)
///     .unwrap()
///     .with_add_alpha(true)
///     .with_bilinear(true);
///
/// assert!(request.add_alpha());
/// assert_eq!(request.band(), None);
/// ```
#[derive(Clone)]
pub struct RasterTileRequest {
    dataset: Arc<dyn RasterDataset>,
    width: usize,
    height: usize,
    sector: Sector,
    add_alpha: bool,
    band: Option<usize>,
    reproject: bool,
    bilinear: bool,
    no_data: Option<Vec<f64>>,
    replacement: Option<ValueReplacement>,
}

impl RasterTileRequest {
    /// Create a request with every flag off.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when either output dimension is zero.
    pub fn new(
        dataset: Arc<dyn RasterDataset>,
        width: usize,
        height: usize,
        sector: Sector,
    ) -> TileResult<Self> {
        if width == 0 || height == 0 {
            return Err(TileError::invalid_argument(format!(
                "tile size must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            dataset,
            width,
            height,
            sector,
            add_alpha: false,
            band: None,
            reproject: false,
            bilinear: false,
            no_data: None,
            replacement: None,
        })
    }

    /// Create a request taking size and flags from configuration.
    pub fn from_config(
        dataset: Arc<dyn RasterDataset>,
        sector: Sector,
        config: &RasterConfig,
    ) -> TileResult<Self> {
        Ok(Self::new(dataset, config.tile_width, config.tile_height, sector)?
            .with_add_alpha(config.add_alpha)
            .with_reproject(config.reproject)
            .with_bilinear(config.bilinear))
    }

    /// Synthesize an alpha band for 3-band sources.
    pub fn with_add_alpha(mut self, add_alpha: bool) -> Self {
        self.add_alpha = add_alpha;
        self
    }

    /// Read only this band (zero-based).
    pub fn with_band(mut self, band: usize) -> Self {
        self.band = Some(band);
        self
    }

    /// Warp non-WGS84 sources onto the sector before reading.
    pub fn with_reproject(mut self, reproject: bool) -> Self {
        self.reproject = reproject;
        self
    }

    /// Interpolate bilinearly when the source and output sizes differ.
    pub fn with_bilinear(mut self, bilinear: bool) -> Self {
        self.bilinear = bilinear;
        self
    }

    /// Per-band values written outside the data rectangle.
    pub fn with_no_data(mut self, values: Vec<f64>) -> Self {
        self.no_data = Some(values);
        self
    }

    pub fn with_replacement(mut self, replacement: ValueReplacement) -> Self {
        self.replacement = Some(replacement);
        self
    }

    pub fn dataset(&self) -> &Arc<dyn RasterDataset> {
        &self.dataset
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn sector(&self) -> &Sector {
        &self.sector
    }

    pub fn add_alpha(&self) -> bool {
        self.add_alpha
    }

    pub fn band(&self) -> Option<usize> {
        self.band
    }

    pub fn reproject(&self) -> bool {
        self.reproject
    }

    pub fn bilinear(&self) -> bool {
        self.bilinear
    }

    pub fn no_data(&self) -> Option<&[f64]> {
        self.no_data.as_deref()
    }

    pub fn replacement(&self) -> Option<&ValueReplacement> {
        self.replacement.as_ref()
    }
}

impl fmt::Debug for RasterTileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterTileRequest")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sector", &self.sector)
            .field("add_alpha", &self.add_alpha)
            .field("band", &self.band)
            .field("reproject", &self.reproject)
            .field("bilinear", &self.bilinear)
            .field("no_data", &self.no_data)
            .field("replacement", &self.replacement)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{GeoTransform, MemoryDataset, SpatialRef};

    fn dataset() -> Arc<dyn RasterDataset> {
        Arc::new(MemoryDataset::new(
            4,
            4,
            GeoTransform::default(),
            SpatialRef::Wgs84,
        ))
    }

    fn sector() -> Sector {
        Sector::new(0.0, 0.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_zero_size_rejected() {
        let result = RasterTileRequest::new(dataset(), 0, 16, sector());
        assert!(matches!(result, Err(TileError::InvalidArgument(_))));
    }

    #[test]
    fn test_builders_set_flags() {
        let request = RasterTileRequest::new(dataset(), 8, 4, sector())
            .unwrap()
            .with_band(2)
            .with_reproject(true)
            .with_no_data(vec![0.0]);

        assert_eq!(request.width(), 8);
        assert_eq!(request.height(), 4);
        assert_eq!(request.band(), Some(2));
        assert!(request.reproject());
        assert!(!request.bilinear());
        assert_eq!(request.no_data(), Some(&[0.0][..]));
    }

    #[test]
    fn test_from_config() {
        let config = RasterConfig::default()
            .with_tile_size(32, 16)
            .with_add_alpha(true);
        let request = RasterTileRequest::from_config(dataset(), sector(), &config).unwrap();
        assert_eq!(request.width(), 32);
        assert_eq!(request.height(), 16);
        assert!(request.add_alpha());
    }

    #[test]
    fn test_band_range_inclusive() {
        let range = BandRange::new(vec![0.0, 10.0], vec![5.0, 20.0]);
        assert!(range.contains(&[0.0, 20.0]));
        assert!(range.contains(&[5.0, 10.0]));
        assert!(!range.contains(&[5.1, 10.0]));
    }

    #[test]
    fn test_replacement_validate_lengths() {
        let rules = ValueReplacement::new(
            vec![BandRange::new(vec![0.0], vec![1.0])],
            vec![Some(1.0), None],
            vec![None, None],
        );
        assert!(rules.validate(2).is_err());
        assert!(matches!(rules.validate(1), Err(TileError::InvalidArgument(_))));
    }

    #[test]
    fn test_replacement_noop() {
        let rules = ValueReplacement::new(vec![], vec![None], vec![None]);
        assert!(rules.is_noop());
    }
}
