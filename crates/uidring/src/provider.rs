//! Batch UID provision for the cached generator.

use crate::bits::BitsAllocator;
use crate::error::UidError;

/// Provides every UID issuable within one specific second.
pub trait UidProvider: Send + Sync {
    /// Returns the full batch for `current_second`, in ascending sequence
    /// order; cardinality is `max_sequence + 1`.
    fn provide(&self, epoch_seconds: i64, current_second: i64) -> Result<Vec<i64>, UidError>;
}

/// Batch provider used by the padding executor.
///
/// The worker subfield of every cached UID is pinned to `max_worker_id` as
/// a cache-mode marker: cached identifiers never collide with direct-mode
/// identifiers issued by the same configured worker, and remain
/// distinguishable when parsed.
#[derive(Debug, Clone, Copy)]
pub struct CachedUidProvider {
    allocator: BitsAllocator,
}

impl CachedUidProvider {
    /// Creates a provider over the given layout.
    pub fn new(allocator: BitsAllocator) -> Self {
        Self { allocator }
    }
}

impl UidProvider for CachedUidProvider {
    fn provide(&self, epoch_seconds: i64, current_second: i64) -> Result<Vec<i64>, UidError> {
        let delta = current_second - epoch_seconds;
        if delta > self.allocator.max_delta_seconds() {
            return Err(UidError::TimestampExhausted {
                delta,
                max: self.allocator.max_delta_seconds(),
            });
        }

        // The sequence occupies the low bits, so the whole batch is the
        // seq-0 UID plus consecutive offsets; no per-UID packing needed.
        let batch_size = self.allocator.max_sequence() + 1;
        let first = self.allocator.allocate(delta, self.allocator.max_worker_id(), 0);
        Ok((0..batch_size).map(|offset| first + offset).collect())
    }
}
