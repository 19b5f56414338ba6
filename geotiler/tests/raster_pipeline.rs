//! Integration tests for the raster tile pipeline.
//!
//! These tests drive complete reads through `RasterTileReader` and
//! `BatchReader` against in-memory datasets:
//! - alpha synthesis and data rectangles for fully covered tiles
//! - no-data fill for tiles hanging off the dataset edge
//! - value replacement, type conversion and RGBA rendering
//! - batch reads that keep going past a failed tile
//!
//! Run with: `cargo test --test raster_pipeline`

use std::sync::Arc;

use geotiler::buffer::{BufferPool, PixelType};
use geotiler::config::RasterConfig;
use geotiler::coord::Sector;
use geotiler::raster::{
    BandRange, BatchReader, GeoTransform, MemoryDataset, MinMax, PixelRect, RasterTileReader,
    RasterTileRequest, SpatialRef, ValueReplacement,
};
use geotiler::TileError;

// ============================================================================
// Helper Functions
// ============================================================================

/// 4x4 dataset over lat/lon [0, 4] with `bands` uint8 bands holding
/// `band * 20 + y * 4 + x`.
fn rgb_dataset(bands: usize) -> Arc<MemoryDataset> {
    let mut dataset = MemoryDataset::new(
        4,
        4,
        GeoTransform::new(0.0, 4.0, 1.0, -1.0),
        SpatialRef::Wgs84,
    );
    for band in 0..bands {
        let values: Vec<f64> = (0..16).map(|i| (band * 20 + i) as f64).collect();
        dataset.add_band(PixelType::UInt8, &values).unwrap();
    }
    Arc::new(dataset)
}

fn sector(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Sector {
    Sector::new(min_lat, min_lon, max_lat, max_lon).unwrap()
}

fn reader() -> RasterTileReader {
    RasterTileReader::new(Arc::new(BufferPool::new()))
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_rgb_source_gets_opaque_alpha() {
    let request = RasterTileRequest::new(rgb_dataset(3), 4, 4, sector(0.0, 0.0, 4.0, 4.0))
        .unwrap()
        .with_add_alpha(true);

    let tile = reader().read(&request).unwrap();

    assert_eq!(tile.band_count(), 4);
    assert_eq!(tile.alpha_band(), Some(3));
    assert_eq!(tile.data_rectangle(), PixelRect::new(0, 0, 4, 4));
    for y in 0..4 {
        for x in 0..4 {
            assert_eq!(tile.sample(3, x, y).unwrap(), 255.0);
            assert_eq!(tile.sample(1, x, y).unwrap(), (20 + y * 4 + x) as f64);
        }
    }
}

#[test]
fn test_selected_band_ignores_alpha() {
    let request = RasterTileRequest::new(rgb_dataset(3), 4, 4, sector(0.0, 0.0, 4.0, 4.0))
        .unwrap()
        .with_add_alpha(true)
        .with_band(2);

    let tile = reader().read(&request).unwrap();
    assert_eq!(tile.band_count(), 1);
    assert_eq!(tile.alpha_band(), None);
    assert_eq!(tile.sample(0, 0, 0).unwrap(), 40.0);
}

#[test]
fn test_tile_off_dataset_edge_filled_with_no_data() {
    // Sector [2, 6]² overlaps only the north-east quarter of the dataset,
    // which lands in the bottom-left of the output
    let request = RasterTileRequest::new(rgb_dataset(3), 4, 4, sector(2.0, 2.0, 6.0, 6.0))
        .unwrap()
        .with_add_alpha(true)
        .with_no_data(vec![9.0, 9.0, 9.0, 0.0]);

    let tile = reader().read(&request).unwrap();

    assert_eq!(tile.data_rectangle(), PixelRect::new(0, 2, 2, 2));
    // Output (0, 2) is source (2, 0)
    assert_eq!(tile.sample(0, 0, 2).unwrap(), 2.0);
    assert_eq!(tile.sample(0, 1, 3).unwrap(), 7.0);
    assert_eq!(tile.sample(3, 0, 2).unwrap(), 255.0);

    assert_eq!(tile.sample(0, 3, 3).unwrap(), 9.0);
    assert_eq!(tile.sample(2, 0, 0).unwrap(), 9.0);
    assert_eq!(tile.sample(3, 0, 0).unwrap(), 0.0);
}

#[test]
fn test_no_data_length_mismatch_rejected() {
    let request = RasterTileRequest::new(rgb_dataset(3), 4, 4, sector(2.0, 2.0, 6.0, 6.0))
        .unwrap()
        .with_add_alpha(true)
        .with_no_data(vec![9.0, 9.0, 9.0]);

    let result = reader().read(&request);
    assert!(matches!(result, Err(TileError::InvalidArgument(_))));
}

#[test]
fn test_sector_outside_dataset_fails() {
    let request =
        RasterTileRequest::new(rgb_dataset(1), 4, 4, sector(10.0, 10.0, 12.0, 12.0)).unwrap();
    let result = reader().read(&request);
    assert!(matches!(result, Err(TileError::Tiler(_))));
}

#[test]
fn test_replacement_masks_low_values() {
    let replacement = ValueReplacement::new(
        vec![BandRange::new(vec![0.0], vec![4.0])],
        vec![Some(0.0)],
        vec![None],
    );
    let request = RasterTileRequest::new(rgb_dataset(1), 4, 4, sector(0.0, 0.0, 4.0, 4.0))
        .unwrap()
        .with_replacement(replacement);

    let tile = reader().read(&request).unwrap();
    assert_eq!(tile.sample(0, 3, 0).unwrap(), 0.0);
    assert_eq!(tile.sample(0, 1, 1).unwrap(), 5.0);
    assert_eq!(tile.sample(0, 3, 3).unwrap(), 15.0);
}

#[test]
fn test_convert_and_scan_min_max() {
    let request =
        RasterTileRequest::new(rgb_dataset(1), 4, 4, sector(0.0, 0.0, 4.0, 4.0)).unwrap();
    let tile = reader()
        .read(&request)
        .unwrap()
        .convert_to_type(PixelType::Float32)
        .unwrap();
    assert_eq!(tile.pixel_type(), PixelType::Float32);

    let mut acc = MinMax::new();
    tile.update_min_max(&mut acc, 0.0).unwrap();
    assert_eq!(acc.min, 1.0);
    assert_eq!(acc.max, 15.0);
}

#[test]
fn test_rgba_rendering() {
    let request = RasterTileRequest::from_config(
        rgb_dataset(3),
        sector(0.0, 0.0, 4.0, 4.0),
        &RasterConfig::default().with_tile_size(4, 4),
    )
    .unwrap();

    let image = reader().read(&request).unwrap().to_rgba_image().unwrap();
    assert_eq!(image.dimensions(), (4, 4));
    assert_eq!(image.get_pixel(1, 0).0, [1, 21, 41, 255]);
}

#[test]
fn test_released_tiles_feed_the_pool() {
    let pool = Arc::new(BufferPool::new());
    let reader = RasterTileReader::new(Arc::clone(&pool));
    let request = RasterTileRequest::new(rgb_dataset(3), 4, 4, sector(0.0, 0.0, 4.0, 4.0))
        .unwrap()
        .with_add_alpha(true);

    for _ in 0..3 {
        reader.read(&request).unwrap().release(&pool);
    }

    let stats = pool.stats();
    assert_eq!(stats.takes, 6);
    assert_eq!(stats.allocations, 2);
    assert_eq!(stats.reuses, 4);
}

#[test]
fn test_batch_reports_failures_and_keeps_going() {
    let dataset = rgb_dataset(3);
    let requests = vec![
        RasterTileRequest::new(dataset.clone(), 4, 4, sector(0.0, 0.0, 2.0, 2.0)).unwrap(),
        RasterTileRequest::new(dataset.clone(), 4, 4, sector(20.0, 20.0, 22.0, 22.0)).unwrap(),
        RasterTileRequest::new(dataset, 4, 4, sector(2.0, 2.0, 4.0, 4.0)).unwrap(),
    ];

    let batch = BatchReader::with_threads(reader(), 2).unwrap();
    let report = batch.read_all(&requests);

    assert!(!report.is_complete());
    let read: Vec<usize> = report.tiles.iter().map(|(index, _)| *index).collect();
    assert_eq!(read, vec![0, 2]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 1);
    assert_eq!(report.failures[0].sector, sector(20.0, 20.0, 22.0, 22.0));
}
