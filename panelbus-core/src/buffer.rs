//! Bounded transaction buffer
//!
//! Accumulates the payload of one bus transaction. Bytes that do not fit
//! are dropped, never written past the end.

use heapless::Vec;

/// Transaction capacity in bytes
///
/// Must be at least as large as the largest single command emitted by the
/// panel drivers.
pub const TRANSACTION_CAPACITY: usize = 32;

/// Fixed-capacity byte buffer with a write cursor
#[derive(Debug, Clone, Default)]
pub struct TransactionBuffer<const N: usize = TRANSACTION_CAPACITY> {
    data: Vec<u8, N>,
}

impl<const N: usize> TransactionBuffer<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Discard all buffered bytes
    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Append as many of `bytes` as fit
    ///
    /// Returns the number of bytes appended; the rest are dropped.
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        let count = bytes.len().min(self.remaining());
        // Cannot fail: count is bounded by the free space
        let _ = self.data.extend_from_slice(&bytes[..count]);
        count
    }

    /// Buffered bytes, up to the cursor
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if nothing is buffered
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Free space left
    pub fn remaining(&self) -> usize {
        N - self.data.len()
    }

    /// Total capacity
    pub const fn capacity(&self) -> usize {
        N
    }
}
