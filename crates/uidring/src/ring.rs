//! Bounded ring buffer of pre-fabricated UIDs.

use crate::error::UidError;
use crate::handler::{DiscardPutHandler, LogTakeHandler, RejectedPutHandler, RejectedTakeHandler};
use crate::invariants::{debug_assert_bounded_occupancy, debug_assert_cursor_not_past_tail};
use crate::padding::PaddingExecutor;
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError, Weak};

// =============================================================================
// SYNCHRONIZATION PROTOCOL
// =============================================================================
//
// Each slot is paired with a two-state flag: CAN_PUT (producer owns the
// slot) and CAN_TAKE (a UID is stored and a consumer may claim it). Every
// transition is a CAS from the expected state.
//
// `tail` and `cursor` are unbounded i64 sequence numbers starting at -1;
// only the masked form wraps into the array, so distances like
// `tail - cursor` never suffer ABA ambiguity.
//
// **Producer (put):**
// 1. Serialize under `put_lock` (the padding executor is the only writer,
//    the mutex covers re-entry attempts).
// 2. Full when `tail - cursor == size - 1`; reject.
// 3. CAS `flags[(tail + 1) & mask]` CAN_PUT → CAN_TAKE, claiming the slot.
// 4. Write the slot, then `tail.fetch_add(1, Release)` to publish it.
//
// **Consumer (take):**
// 1. Conditionally advance `cursor` with `fetch_update`; it refuses to move
//    past `tail`, so the cursor never overshoots on an empty buffer.
// 2. An Acquire load of `tail` pairs with the producer's Release increment,
//    which makes the slot write of step 4 above visible before the slot is
//    read here.
// 3. Read the slot, then CAS its flag CAN_TAKE → CAN_PUT to hand it back.
//    The AcqRel CAS keeps the read from sinking below the hand-back.
//
// `cursor` is fetch-added by any number of consumers; each claimed sequence
// number maps to a distinct slot, so concurrent takes never alias.
// =============================================================================

/// Flag value: the slot may be written by the producer.
pub const CAN_PUT: u32 = 0;

/// Flag value: the slot holds a UID a consumer may take.
pub const CAN_TAKE: u32 = 1;

/// Initial value of both `tail` and `cursor`.
pub const START_POINT: i64 = -1;

/// Rounds `n` up to the nearest power of two, treating zero as one.
#[inline]
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Fixed-size ring of UID slots with per-slot producer/consumer flags.
///
/// `put` is serialized by a mutex (single-writer contract); `take` is
/// lock-free and safe to call from many consumers concurrently. When the
/// consumable distance falls below the padding threshold, `take` triggers
/// the attached [`PaddingExecutor`] asynchronously.
pub struct RingBuffer {
    buffer_size: usize,
    index_mask: i64,
    slots: Box<[UnsafeCell<i64>]>,
    flags: Box<[AtomicU32]>,
    /// Sequence of the highest slot produced; `-1` before the first put.
    tail: CachePadded<AtomicI64>,
    /// Sequence of the highest slot consumed; `-1` before the first take.
    cursor: CachePadded<AtomicI64>,
    padding_threshold: i64,
    put_lock: Mutex<()>,
    rejected_put: Box<dyn RejectedPutHandler>,
    rejected_take: Box<dyn RejectedTakeHandler>,
    padding: OnceLock<Weak<PaddingExecutor>>,
}

// SAFETY: the UnsafeCell slots are the only non-Sync state. A slot is
// written only by the producer that CASed its flag to CAN_TAKE and read
// only by the consumer that claimed its sequence number before handing the
// flag back, with the tail Release/Acquire pair ordering write before read.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Creates a ring with `buffer_size` slots (rounded up to a power of
    /// two) and the given padding factor in percent.
    pub fn new(buffer_size: usize, padding_factor: u32) -> Result<Self, UidError> {
        if padding_factor == 0 || padding_factor >= 100 {
            return Err(UidError::InvalidPaddingFactor(padding_factor));
        }

        let buffer_size = next_power_of_two(buffer_size);
        let slots = (0..buffer_size)
            .map(|_| UnsafeCell::new(0))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let flags = (0..buffer_size)
            .map(|_| AtomicU32::new(CAN_PUT))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(Self {
            buffer_size,
            index_mask: buffer_size as i64 - 1,
            slots,
            flags,
            tail: CachePadded::new(AtomicI64::new(START_POINT)),
            cursor: CachePadded::new(AtomicI64::new(START_POINT)),
            padding_threshold: buffer_size as i64 * i64::from(padding_factor) / 100,
            put_lock: Mutex::new(()),
            rejected_put: Box::new(DiscardPutHandler),
            rejected_take: Box::new(LogTakeHandler),
            padding: OnceLock::new(),
        })
    }

    /// Replaces the rejected-put policy. Only callable before sharing.
    pub fn set_rejected_put_handler(&mut self, handler: Box<dyn RejectedPutHandler>) {
        self.rejected_put = handler;
    }

    /// Replaces the rejected-take policy. Only callable before sharing.
    pub fn set_rejected_take_handler(&mut self, handler: Box<dyn RejectedTakeHandler>) {
        self.rejected_take = handler;
    }

    /// Attaches the executor that `take` triggers below the threshold.
    ///
    /// Held weakly: the executor owns the ring, not the other way around.
    pub(crate) fn attach_padding_executor(&self, executor: Weak<PaddingExecutor>) {
        let _ = self.padding.set(executor);
    }

    /// Stores a UID into the next slot.
    ///
    /// Returns `false` (after invoking the rejected-put policy) when the
    /// buffer is full or the slot was not producer-owned.
    pub fn put(&self, uid: i64) -> bool {
        let _guard = self.put_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let current_tail = self.tail.load(Ordering::Acquire);
        let current_cursor = self.cursor.load(Ordering::Acquire);
        debug_assert_bounded_occupancy!(current_tail, current_cursor, self.buffer_size);

        if current_tail - current_cursor == self.buffer_size as i64 - 1 {
            self.rejected_put.reject_put(self, uid);
            return false;
        }

        let next_index = ((current_tail + 1) & self.index_mask) as usize;
        if self.flags[next_index]
            .compare_exchange(CAN_PUT, CAN_TAKE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // A slot the producer expected to own is still consumer-side.
            self.rejected_put.reject_put(self, uid);
            return false;
        }

        // SAFETY: the CAS above claimed the slot for this producer, and the
        // Release increment below publishes the write before any consumer
        // can observe a tail covering this sequence number.
        unsafe {
            *self.slots[next_index].get() = uid;
        }
        self.tail.fetch_add(1, Ordering::Release);
        true
    }

    /// Claims and returns the next consumable UID.
    ///
    /// Triggers asynchronous padding when the consumable distance drops
    /// below the threshold, including on the empty path, so a drained ring
    /// recovers without waiting for the schedule.
    pub fn take(&self) -> Result<i64, UidError> {
        // Conditional advance: the cursor stays put when it has caught the
        // tail, so an empty buffer never leaves it overshot.
        let advanced = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if current == self.tail.load(Ordering::Acquire) {
                    None
                } else {
                    Some(current + 1)
                }
            });

        let current_tail = self.tail.load(Ordering::Acquire);
        let next_cursor = match advanced {
            Ok(previous) => previous + 1,
            Err(previous) => previous,
        };

        if current_tail - next_cursor < self.padding_threshold {
            self.trigger_padding();
        }

        if advanced.is_err() {
            self.rejected_take.reject_take(self);
            return Err(UidError::BufferEmpty);
        }
        debug_assert_cursor_not_past_tail!(next_cursor, current_tail);

        let index = (next_cursor & self.index_mask) as usize;
        // SAFETY: the fetch_update claimed `next_cursor` exclusively, and
        // the Acquire tail load inside it synchronized with the producer's
        // Release increment, so the slot write is visible. The read stays
        // ahead of the AcqRel flag hand-back below.
        let uid = unsafe { *self.slots[index].get() };

        if self.flags[index]
            .compare_exchange(CAN_TAKE, CAN_PUT, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.rejected_take.reject_take(self);
            return Err(UidError::SlotNotReady { index });
        }

        Ok(uid)
    }

    fn trigger_padding(&self) {
        if let Some(executor) = self.padding.get().and_then(Weak::upgrade) {
            executor.async_padding();
        }
    }

    /// Number of slots in the ring.
    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Consumable distance below which `take` triggers padding.
    #[inline]
    pub fn padding_threshold(&self) -> i64 {
        self.padding_threshold
    }

    /// Sequence of the last produced slot (`-1` when nothing was put yet).
    #[inline]
    pub fn tail(&self) -> i64 {
        self.tail.load(Ordering::Acquire)
    }

    /// Sequence of the last consumed slot (`-1` when nothing was taken yet).
    #[inline]
    pub fn cursor(&self) -> i64 {
        self.cursor.load(Ordering::Acquire)
    }

    /// Number of UIDs currently consumable.
    #[inline]
    pub fn len(&self) -> usize {
        (self.tail() - self.cursor()).max(0) as usize
    }

    /// Returns `true` if no UID is consumable.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("buffer_size", &self.buffer_size)
            .field("tail", &self.tail())
            .field("cursor", &self.cursor())
            .field("padding_threshold", &self.padding_threshold)
            .finish_non_exhaustive()
    }
}
