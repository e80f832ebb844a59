//! Ring-buffer-cached 64-bit unique identifier generation.
//!
//! UIDs pack four fields into a positive `i64`, MSB to LSB: a zero sign
//! bit, delta-seconds since a configured epoch, an opaque worker id and a
//! per-second sequence. Two generators share that layout:
//!
//! - [`DirectUidGenerator`] synthesizes one UID per call under a mutex,
//!   reading the wall clock each time.
//! - [`CachedUidGenerator`] pre-fabricates whole second-batches into a
//!   lock-free ring buffer and serves them from memory, sustaining rates a
//!   per-tick generator cannot. A background padding executor keeps the
//!   buffer primed, triggered on demand and on a periodic schedule.
//!
//! # Example
//!
//! ```
//! use uidring::{CachedUidGenerator, GeneratorConfig, UidGenerator};
//!
//! let generator = CachedUidGenerator::new(GeneratorConfig::default(), 42).unwrap();
//! let uid = generator.must();
//! assert!(uid > 0);
//! println!("{}", generator.parse(uid));
//! ```

mod bits;
mod cached;
mod config;
mod direct;
mod error;
mod handler;
mod invariants;
mod padding;
mod provider;
mod ring;
mod worker;

pub use bits::{BitsAllocator, SIGN_BITS, TOTAL_BITS};
pub use cached::{CachedUidGenerator, CachedUidGeneratorBuilder};
pub use config::{
    epoch_seconds, GeneratorConfig, DEFAULT_BOOST_POWER, DEFAULT_EPOCH, DEFAULT_PADDING_FACTOR,
    DEFAULT_SCHEDULE_INTERVAL, DEFAULT_SEQ_BITS, DEFAULT_TIME_BITS, DEFAULT_WORKER_BITS,
};
pub use direct::DirectUidGenerator;
pub use error::UidError;
pub use handler::{DiscardPutHandler, LogTakeHandler, RejectedPutHandler, RejectedTakeHandler};
pub use padding::PaddingExecutor;
pub use provider::{CachedUidProvider, UidProvider};
pub use ring::{next_power_of_two, RingBuffer, CAN_PUT, CAN_TAKE, START_POINT};
pub use worker::{LocalAssigner, WorkerIdAssigner, LOCAL_WORKER_ID_BOUND};

use std::time::{SystemTime, UNIX_EPOCH};

/// Generates and parses unique identifiers.
pub trait UidGenerator {
    /// Generates a UID, or explains why one is not available right now.
    fn get(&self) -> Result<i64, UidError>;

    /// Generates a UID, panicking on failure. Convenience for callers that
    /// treat generation failure as fatal; library code should prefer
    /// [`get`](Self::get).
    fn must(&self) -> i64;

    /// Renders a UID's components as a JSON string.
    fn parse(&self, uid: i64) -> String;
}

/// Current wall-clock time in whole seconds since the Unix epoch.
pub(crate) fn current_second() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
