//! Parallel tile reads.
//!
//! Reads a batch of requests across rayon workers sharing the reader's
//! buffer pool. A failing tile does not stop the batch: it is logged with
//! its sector and reported alongside the tiles that succeeded.

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, warn};

use super::pixel_buffer::PixelBuffer;
use super::reader::RasterTileReader;
use super::request::RasterTileRequest;
use crate::coord::Sector;
use crate::error::{TileError, TileResult};

/// A request of the batch that could not be read.
#[derive(Debug)]
pub struct TileFailure {
    /// Position of the request in the batch.
    pub index: usize,
    pub sector: Sector,
    pub error: TileError,
}

/// Outcome of a batch read, both lists in request order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub tiles: Vec<(usize, PixelBuffer)>,
    pub failures: Vec<TileFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Reads many tiles in parallel.
pub struct BatchReader {
    reader: RasterTileReader,
    pool: Option<ThreadPool>,
}

impl BatchReader {
    /// Use rayon's global thread pool.
    pub fn new(reader: RasterTileReader) -> Self {
        Self { reader, pool: None }
    }

    /// Use a dedicated pool of `threads` workers; zero keeps the global pool.
    ///
    /// # Errors
    ///
    /// Returns `Tiler` if the thread pool cannot be built.
    pub fn with_threads(reader: RasterTileReader, threads: usize) -> TileResult<Self> {
        if threads == 0 {
            return Ok(Self::new(reader));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("geotiler-batch-{}", i))
            .build()
            .map_err(|e| TileError::tiler(format!("failed to build thread pool: {}", e)))?;
        Ok(Self {
            reader,
            pool: Some(pool),
        })
    }

    pub fn reader(&self) -> &RasterTileReader {
        &self.reader
    }

    /// Read every request.
    pub fn read_all(&self, requests: &[RasterTileRequest]) -> BatchReport {
        let run = || {
            requests
                .par_iter()
                .enumerate()
                .map(|(index, request)| (index, self.reader.read(request)))
                .collect::<Vec<_>>()
        };
        let results = match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        };

        let mut report = BatchReport::default();
        for (index, result) in results {
            match result {
                Ok(buffer) => report.tiles.push((index, buffer)),
                Err(error) => {
                    let sector = *requests[index].sector();
                    warn!(index, sector = %sector, error = %error, "Tile read failed");
                    report.failures.push(TileFailure {
                        index,
                        sector,
                        error,
                    });
                }
            }
        }

        debug!(
            requested = requests.len(),
            read = report.tiles.len(),
            failed = report.failures.len(),
            "Batch read complete"
        );
        report
    }
}
