//! Error types for UID generation.

use thiserror::Error;

/// Errors that can occur while configuring or running a generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UidError {
    /// The sign, timestamp, worker and sequence widths do not sum to 64.
    #[error("bit widths must sum to 64 including the sign bit (1 + {time_bits} + {worker_bits} + {seq_bits} = {total})")]
    InvalidBitLayout {
        /// Requested delta-seconds width.
        time_bits: u32,
        /// Requested worker width.
        worker_bits: u32,
        /// Requested sequence width.
        seq_bits: u32,
        /// The actual sum, for the message.
        total: u32,
    },

    /// The epoch string is not a `YYYY-MM-DD` date.
    #[error("epoch `{0}` is not a YYYY-MM-DD date")]
    InvalidEpoch(String),

    /// The worker id does not fit the worker field.
    #[error("worker id {worker_id} outside [0, {max}] supported by the layout")]
    WorkerIdOutOfRange {
        /// The rejected worker id.
        worker_id: i64,
        /// Maximum representable worker id.
        max: i64,
    },

    /// The padding factor must be a percentage strictly between 0 and 100.
    #[error("padding factor {0} must be in (0, 100)")]
    InvalidPaddingFactor(u32),

    /// The boost power must be positive and small enough to size the ring.
    #[error("boost power {0} must be positive and leave the ring size addressable")]
    InvalidBoostPower(u32),

    /// The delta-seconds field can no longer represent the current time.
    #[error("timestamp bits exhausted: delta {delta}s exceeds maximum {max}s, refusing UID generation")]
    TimestampExhausted {
        /// Seconds elapsed since the configured epoch.
        delta: i64,
        /// Maximum representable delta.
        max: i64,
    },

    /// The wall clock moved behind the last generation second.
    #[error("clock moved backwards, refusing generation for {refused_seconds}s")]
    ClockMovedBackwards {
        /// How far behind the clock is.
        refused_seconds: i64,
    },

    /// The ring buffer holds no consumable UID.
    #[error("ring buffer is empty, no UID available")]
    BufferEmpty,

    /// A slot was not in the expected state for the attempted transition.
    #[error("ring buffer slot {index} was not ready to take")]
    SlotNotReady {
        /// Masked slot index that failed the transition.
        index: usize,
    },
}

impl UidError {
    /// Returns `true` if the caller may simply retry (e.g. the cache ran dry
    /// and padding is catching up).
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::BufferEmpty)
    }

    /// Returns `true` if the generator can never produce again.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TimestampExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifiers() {
        assert!(UidError::BufferEmpty.is_recoverable());
        assert!(!UidError::BufferEmpty.is_terminal());
        let exhausted = UidError::TimestampExhausted { delta: 300, max: 255 };
        assert!(exhausted.is_terminal());
        assert!(!exhausted.is_recoverable());
    }
}
