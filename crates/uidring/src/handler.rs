//! Pluggable policies for rejected ring buffer operations.
//!
//! A put is rejected when the tail catches the cursor (buffer full); a take
//! is rejected when the cursor catches the tail (buffer empty). Each policy
//! is a single-method capability so callers can plug in counters, alerts or
//! custom drop behavior.

use crate::ring::RingBuffer;

/// Policy invoked when the ring buffer rejects a put.
pub trait RejectedPutHandler: Send + Sync {
    /// Called with the buffer state and the UID that could not be stored.
    fn reject_put(&self, ring: &RingBuffer, uid: i64);
}

/// Policy invoked when the ring buffer rejects a take.
pub trait RejectedTakeHandler: Send + Sync {
    /// Called with the buffer state that could not serve a UID.
    fn reject_take(&self, ring: &RingBuffer);
}

/// Default put policy: log and discard the UID.
///
/// The padding executor treats the rejection as "buffer full" and ends its
/// pass, so a discarded UID here is expected steady-state behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardPutHandler;

impl RejectedPutHandler for DiscardPutHandler {
    fn reject_put(&self, ring: &RingBuffer, uid: i64) {
        tracing::warn!(
            uid,
            tail = ring.tail(),
            cursor = ring.cursor(),
            "ring buffer full, discarding uid"
        );
    }
}

/// Default take policy: log and return.
///
/// The caller still receives an error; rejection here is recoverable once
/// padding refills the buffer.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTakeHandler;

impl RejectedTakeHandler for LogTakeHandler {
    fn reject_take(&self, ring: &RingBuffer) {
        tracing::warn!(
            tail = ring.tail(),
            cursor = ring.cursor(),
            "ring buffer empty, rejecting take"
        );
    }
}
