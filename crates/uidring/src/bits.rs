//! 64-bit field allocation for UIDs.

use crate::error::UidError;
use crate::invariants::debug_assert_field_in_range;

/// Total width of a UID.
pub const TOTAL_BITS: u32 = 64;

/// Width of the sign bit; always zero so UIDs stay positive `i64`s.
pub const SIGN_BITS: u32 = 1;

/// Packs and unpacks the three UID fields into the 63 usable bits.
///
/// Layout, MSB to LSB: sign (1) | delta-seconds (T) | worker (W) |
/// sequence (S), with `1 + T + W + S == 64`. The struct is stateless and
/// `Copy`; generators share it freely without synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitsAllocator {
    timestamp_bits: u32,
    worker_bits: u32,
    sequence_bits: u32,

    max_delta_seconds: i64,
    max_worker_id: i64,
    max_sequence: i64,

    timestamp_shift: u32,
    worker_shift: u32,
}

impl BitsAllocator {
    /// Creates an allocator for the given field widths.
    ///
    /// Rejects any layout whose widths (plus the sign bit) do not sum to 64.
    pub fn new(timestamp_bits: u32, worker_bits: u32, sequence_bits: u32) -> Result<Self, UidError> {
        let total = SIGN_BITS + timestamp_bits + worker_bits + sequence_bits;
        if total != TOTAL_BITS {
            return Err(UidError::InvalidBitLayout {
                time_bits: timestamp_bits,
                worker_bits,
                seq_bits: sequence_bits,
                total,
            });
        }

        Ok(Self {
            timestamp_bits,
            worker_bits,
            sequence_bits,
            max_delta_seconds: max_value(timestamp_bits),
            max_worker_id: max_value(worker_bits),
            max_sequence: max_value(sequence_bits),
            timestamp_shift: worker_bits + sequence_bits,
            worker_shift: sequence_bits,
        })
    }

    /// Combines delta-seconds, worker id and sequence into a single UID.
    ///
    /// Arguments must already be within the field maxima; out-of-range
    /// values corrupt adjacent fields. Checked in debug builds only.
    #[inline]
    pub fn allocate(&self, delta_seconds: i64, worker_id: i64, sequence: i64) -> i64 {
        debug_assert_field_in_range!("delta_seconds", delta_seconds, self.max_delta_seconds);
        debug_assert_field_in_range!("worker_id", worker_id, self.max_worker_id);
        debug_assert_field_in_range!("sequence", sequence, self.max_sequence);

        (delta_seconds << self.timestamp_shift) | (worker_id << self.worker_shift) | sequence
    }

    /// Splits a UID back into `(delta_seconds, worker_id, sequence)`.
    #[inline]
    pub fn parse(&self, uid: i64) -> (i64, i64, i64) {
        let sequence = uid & self.max_sequence;
        let worker_id = (uid >> self.worker_shift) & self.max_worker_id;
        let delta_seconds = (uid >> self.timestamp_shift) & self.max_delta_seconds;
        (delta_seconds, worker_id, sequence)
    }

    /// Width of the delta-seconds field.
    #[inline]
    pub fn timestamp_bits(&self) -> u32 {
        self.timestamp_bits
    }

    /// Width of the worker field.
    #[inline]
    pub fn worker_bits(&self) -> u32 {
        self.worker_bits
    }

    /// Width of the sequence field.
    #[inline]
    pub fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    /// Largest representable delta in seconds.
    #[inline]
    pub fn max_delta_seconds(&self) -> i64 {
        self.max_delta_seconds
    }

    /// Largest representable worker id.
    #[inline]
    pub fn max_worker_id(&self) -> i64 {
        self.max_worker_id
    }

    /// Largest representable sequence value.
    #[inline]
    pub fn max_sequence(&self) -> i64 {
        self.max_sequence
    }

    /// Left shift applied to delta-seconds when packing.
    #[inline]
    pub fn timestamp_shift(&self) -> u32 {
        self.timestamp_shift
    }

    /// Left shift applied to the worker id when packing.
    #[inline]
    pub fn worker_shift(&self) -> u32 {
        self.worker_shift
    }
}

/// Largest value representable in `bits` bits.
#[inline]
fn max_value(bits: u32) -> i64 {
    !(-1_i64 << bits)
}
