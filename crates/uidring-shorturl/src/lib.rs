//! Base-62 short-URL form of uidring identifiers.
//!
//! Wraps a [`DirectUidGenerator`] with preset field layouts sized for
//! short-URL keyspaces and serves each fresh UID in reversed-digit base-62.
//!
//! # Example
//!
//! ```
//! use uidring_shorturl::ShortUrlGenerator;
//!
//! let generator = ShortUrlGenerator::new().unwrap();
//! let short = generator.short_url().unwrap();
//! assert!(!short.is_empty());
//! ```

pub mod base62;

use rand::Rng;
use uidring::{DirectUidGenerator, GeneratorConfig, UidError, UidGenerator};

/// Epoch shared by the compact preset layouts.
const PRESET_EPOCH: &str = "2020-10-12";

/// Direct generator wrapped with base-62 output.
///
/// Worker ids are drawn randomly within the layout's worker field, so two
/// instances of the same preset collide only when the draw does.
#[derive(Debug)]
pub struct ShortUrlGenerator {
    inner: DirectUidGenerator,
}

impl ShortUrlGenerator {
    /// Default layout: 32-bit delta, 11-bit worker, 20-bit sequence.
    pub fn new() -> Result<Self, UidError> {
        Self::with_layout(32, 11, 20, uidring::DEFAULT_EPOCH)
    }

    /// Six-character-scale layout: 57-bit delta, 3-bit worker, 3-bit sequence.
    pub fn v6() -> Result<Self, UidError> {
        Self::with_layout(64 - 1 - 3 - 3, 3, 3, PRESET_EPOCH)
    }

    /// Seven-character-scale layout: 52-bit delta, 6-bit worker, 5-bit sequence.
    pub fn v7() -> Result<Self, UidError> {
        Self::with_layout(64 - 1 - 6 - 5, 6, 5, PRESET_EPOCH)
    }

    /// Eight-character-scale layout: 46-bit delta, 8-bit worker, 9-bit sequence.
    pub fn v8() -> Result<Self, UidError> {
        Self::with_layout(64 - 1 - 8 - 9, 8, 9, PRESET_EPOCH)
    }

    /// Builds a generator over an arbitrary layout, drawing a random worker
    /// id within the worker field.
    pub fn with_layout(
        time_bits: u32,
        worker_bits: u32,
        seq_bits: u32,
        epoch: &str,
    ) -> Result<Self, UidError> {
        let config = GeneratorConfig::default()
            .with_time_bits(time_bits)
            .with_worker_bits(worker_bits)
            .with_seq_bits(seq_bits)
            .with_epoch(epoch);

        let max_worker = (1_i64 << worker_bits) - 1;
        let worker_id = rand::thread_rng().gen_range(0..=max_worker);
        let inner = DirectUidGenerator::new(&config, worker_id)?;
        Ok(Self { inner })
    }

    /// Generates a fresh UID and returns its reversed-digit base-62 form.
    pub fn short_url(&self) -> Result<String, UidError> {
        Ok(base62::to_base62_reversed(self.inner.get()?))
    }
}

impl UidGenerator for ShortUrlGenerator {
    fn get(&self) -> Result<i64, UidError> {
        self.inner.get()
    }

    fn must(&self) -> i64 {
        self.inner.must()
    }

    fn parse(&self, uid: i64) -> String {
        self.inner.parse(uid)
    }
}
