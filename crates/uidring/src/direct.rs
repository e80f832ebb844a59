//! Per-call UID generator.

use crate::bits::BitsAllocator;
use crate::cached::format_uid_json;
use crate::config::{self, GeneratorConfig};
use crate::error::UidError;
use crate::worker::WorkerIdAssigner;
use crate::UidGenerator;
use std::sync::{Mutex, PoisonError};
use std::thread;

/// Bounded attempts before `must` gives up on transient refusals.
const MUST_RETRIES: u32 = 10_000;

/// Mutex-guarded generator synthesizing one UID per call.
///
/// Embeds the configured worker id in every UID and tracks the sequence
/// within the current wall-clock second; when the sequence wraps it waits
/// for the next second. A clock observed behind the last generation second
/// yields [`UidError::ClockMovedBackwards`] with no automatic recovery.
///
/// Cheaper to construct than the cached generator and the basis of the
/// short-URL presets; for sustained high rates prefer
/// [`CachedUidGenerator`](crate::CachedUidGenerator).
pub struct DirectUidGenerator {
    allocator: BitsAllocator,
    worker_id: i64,
    epoch_seconds: i64,
    state: Mutex<DirectState>,
}

#[derive(Debug, Default)]
struct DirectState {
    sequence: i64,
    last_second: i64,
}

impl DirectUidGenerator {
    /// Builds a generator from the layout and epoch in `config`.
    ///
    /// The cache tuning knobs in `config` are ignored here.
    pub fn new(config: &GeneratorConfig, worker_id: i64) -> Result<Self, UidError> {
        let allocator =
            BitsAllocator::new(config.time_bits, config.worker_bits, config.seq_bits)?;
        if worker_id < 0 || worker_id > allocator.max_worker_id() {
            return Err(UidError::WorkerIdOutOfRange {
                worker_id,
                max: allocator.max_worker_id(),
            });
        }
        let epoch_seconds = config::epoch_seconds(&config.epoch)?;

        Ok(Self {
            allocator,
            worker_id,
            epoch_seconds,
            state: Mutex::new(DirectState::default()),
        })
    }

    /// Builds a generator with a worker id drawn from `assigner`.
    pub fn with_assigner(
        config: &GeneratorConfig,
        assigner: &dyn WorkerIdAssigner,
    ) -> Result<Self, UidError> {
        Self::new(config, assigner.assign_worker_id())
    }

    /// The configured worker id.
    pub fn worker_id(&self) -> i64 {
        self.worker_id
    }

    /// The field layout in use.
    pub fn allocator(&self) -> &BitsAllocator {
        &self.allocator
    }

    fn next_id(&self, state: &mut DirectState) -> Result<i64, UidError> {
        let mut current_second = self.checked_current_second()?;

        if current_second < state.last_second {
            return Err(UidError::ClockMovedBackwards {
                refused_seconds: state.last_second - current_second,
            });
        }

        if current_second == state.last_second {
            state.sequence = (state.sequence + 1) & self.allocator.max_sequence();
            // Sequence exhausted within this second; wait out the clock.
            if state.sequence == 0 {
                current_second = wait_next_second(state.last_second);
            }
        } else {
            state.sequence = 0;
        }
        state.last_second = current_second;

        Ok(self.allocator.allocate(
            current_second - self.epoch_seconds,
            self.worker_id,
            state.sequence,
        ))
    }

    fn checked_current_second(&self) -> Result<i64, UidError> {
        let now = crate::current_second();
        let delta = now - self.epoch_seconds;
        if delta > self.allocator.max_delta_seconds() {
            return Err(UidError::TimestampExhausted {
                delta,
                max: self.allocator.max_delta_seconds(),
            });
        }
        Ok(now)
    }
}

/// Spins until the wall clock passes `last_second`.
fn wait_next_second(last_second: i64) -> i64 {
    loop {
        let now = crate::current_second();
        if now > last_second {
            return now;
        }
        thread::yield_now();
    }
}

impl UidGenerator for DirectUidGenerator {
    fn get(&self) -> Result<i64, UidError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.next_id(&mut state)
    }

    fn must(&self) -> i64 {
        for _ in 0..MUST_RETRIES {
            if let Ok(uid) = self.get() {
                return uid;
            }
        }
        panic!("uid generation failed after {MUST_RETRIES} attempts")
    }

    fn parse(&self, uid: i64) -> String {
        format_uid_json(&self.allocator, self.epoch_seconds, uid)
    }
}

impl std::fmt::Debug for DirectUidGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectUidGenerator")
            .field("worker_id", &self.worker_id)
            .field("epoch_seconds", &self.epoch_seconds)
            .field("allocator", &self.allocator)
            .finish_non_exhaustive()
    }
}
