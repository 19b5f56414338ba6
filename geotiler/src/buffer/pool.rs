//! Capacity-keyed byte buffer pool.
//!
//! Repeated tile reads allocate buffers of a handful of sizes. The pool keeps
//! returned buffers keyed by capacity and hands out the smallest one that is
//! large enough, so steady-state tiling stops allocating.
//!
//! ```text
//! take(n) ──► smallest pooled capacity >= n ──► zero [0, n), limit = n
//!                  │ none
//!                  └──────────────────────────► allocate exactly n
//! give(buf) ──► pooled under buf.capacity()
//! ```
//!
//! The pool is meant to be shared as `Arc<BufferPool>`; one mutex serializes
//! every operation.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::trace;

use super::{ByteBuffer, ByteOrder};

/// Counters describing pool behaviour since creation or the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Calls to `take`.
    pub takes: u64,
    /// Takes satisfied from the pool.
    pub reuses: u64,
    /// Takes that had to allocate.
    pub allocations: u64,
    /// Buffers currently pooled.
    pub pooled_buffers: usize,
    /// Total capacity of pooled buffers in bytes.
    pub pooled_bytes: usize,
}

#[derive(Debug, Default)]
struct PoolState {
    free: BTreeMap<usize, Vec<ByteBuffer>>,
    stats: PoolStats,
}

/// Pool of reusable byte buffers keyed by capacity.
#[derive(Debug, Default)]
pub struct BufferPool {
    state: Mutex<PoolState>,
}

impl BufferPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a buffer able to hold `size` bytes.
    ///
    /// The returned buffer has position 0, limit `size`, the given byte
    /// order, and its first `size` bytes zeroed. Its capacity may exceed
    /// `size` when a larger pooled buffer was reused.
    pub fn take(&self, size: usize, order: ByteOrder) -> ByteBuffer {
        let reused = {
            let mut state = self.state.lock();
            state.stats.takes += 1;

            let key = state.free.range(size..).next().map(|(&capacity, _)| capacity);
            let buffer = key.and_then(|capacity| {
                let bucket = state.free.get_mut(&capacity)?;
                let buffer = bucket.pop();
                if bucket.is_empty() {
                    state.free.remove(&capacity);
                }
                buffer
            });

            match &buffer {
                Some(b) => {
                    state.stats.reuses += 1;
                    state.stats.pooled_buffers -= 1;
                    state.stats.pooled_bytes -= b.capacity();
                }
                None => state.stats.allocations += 1,
            }
            buffer
        };

        match reused {
            Some(mut buffer) => {
                trace!(size, capacity = buffer.capacity(), "Reusing pooled buffer");
                buffer.zero_prefix(size);
                buffer.clear();
                buffer.set_limit(size);
                buffer.set_order(order);
                buffer
            }
            None => {
                trace!(size, "Allocating buffer");
                ByteBuffer::allocate(size, order)
            }
        }
    }

    /// Return a buffer for later reuse.
    ///
    /// The buffer is pooled under its full capacity regardless of its limit.
    pub fn give(&self, buffer: ByteBuffer) {
        let capacity = buffer.capacity();
        if capacity == 0 {
            return;
        }
        let mut state = self.state.lock();
        state.free.entry(capacity).or_default().push(buffer);
        state.stats.pooled_buffers += 1;
        state.stats.pooled_bytes += capacity;
    }

    /// Drop every pooled buffer and clear the counters.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.free.clear();
        state.stats = PoolStats::default();
    }

    /// Snapshot of the pool counters.
    pub fn stats(&self) -> PoolStats {
        self.state.lock().stats
    }
}
