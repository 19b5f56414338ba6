//! Byte buffer with position/limit bookkeeping.

use super::ByteOrder;

/// A contiguous byte region with a read/write cursor.
///
/// `capacity` is the length of the backing storage. `limit` bounds every
/// access and never exceeds capacity; `position` is the cursor used by the
/// relative codec functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    position: usize,
    limit: usize,
    order: ByteOrder,
}

impl ByteBuffer {
    /// Allocate a zeroed buffer of exactly `capacity` bytes.
    pub fn allocate(capacity: usize, order: ByteOrder) -> Self {
        Self {
            data: vec![0; capacity],
            position: 0,
            limit: capacity,
            order,
        }
    }

    /// Wrap existing bytes; the limit is the full length.
    pub fn wrap(data: Vec<u8>, order: ByteOrder) -> Self {
        let limit = data.len();
        Self {
            data,
            position: 0,
            limit,
            order,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Bytes left between the position and the limit.
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    /// Move the cursor. Positions past the limit are clamped to it.
    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.limit);
    }

    /// Set the limit, clamped to capacity. The position follows if it would
    /// otherwise lie beyond the new limit.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.min(self.data.len());
        if self.position > self.limit {
            self.position = self.limit;
        }
    }

    /// Position 0, limit at capacity.
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.data.len();
    }

    /// Position 0, limit unchanged.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// The bytes up to the limit.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.limit]
    }

    /// Mutable bytes up to the limit.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.limit]
    }

    /// Zero the first `len` bytes (clamped to capacity).
    pub(crate) fn zero_prefix(&mut self, len: usize) {
        let len = len.min(self.data.len());
        self.data[..len].fill(0);
    }

    /// Consume the buffer, returning the bytes up to the limit.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.data.truncate(self.limit);
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_is_zeroed() {
        let buffer = ByteBuffer::allocate(16, ByteOrder::BigEndian);
        assert_eq!(buffer.capacity(), 16);
        assert_eq!(buffer.limit(), 16);
        assert_eq!(buffer.position(), 0);
        assert!(buffer.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_limit_clamps_position() {
        let mut buffer = ByteBuffer::allocate(16, ByteOrder::LittleEndian);
        buffer.set_position(12);
        buffer.set_limit(8);
        assert_eq!(buffer.limit(), 8);
        assert_eq!(buffer.position(), 8);
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn test_limit_clamped_to_capacity() {
        let mut buffer = ByteBuffer::allocate(4, ByteOrder::LittleEndian);
        buffer.set_limit(100);
        assert_eq!(buffer.limit(), 4);
    }

    #[test]
    fn test_into_vec_truncates_to_limit() {
        let mut buffer = ByteBuffer::wrap(vec![1, 2, 3, 4], ByteOrder::LittleEndian);
        buffer.set_limit(2);
        assert_eq!(buffer.into_vec(), vec![1, 2]);
    }

    #[test]
    fn test_clear_restores_capacity() {
        let mut buffer = ByteBuffer::allocate(10, ByteOrder::LittleEndian);
        buffer.set_limit(3);
        buffer.set_position(2);
        buffer.clear();
        assert_eq!(buffer.limit(), 10);
        assert_eq!(buffer.position(), 0);
    }
}
