//! Cache-backed UID generator.

use crate::bits::BitsAllocator;
use crate::config::{self, GeneratorConfig};
use crate::error::UidError;
use crate::handler::{RejectedPutHandler, RejectedTakeHandler};
use crate::padding::PaddingExecutor;
use crate::provider::CachedUidProvider;
use crate::ring::RingBuffer;
use crate::worker::{LocalAssigner, WorkerIdAssigner};
use crate::UidGenerator;
use chrono::{Local, TimeZone};
use std::sync::Arc;

/// Generator serving UIDs from a pre-fabricated ring buffer.
///
/// Construction sizes the ring at `(max_sequence + 1) << boost_power`
/// slots, pre-loads one second-batch and, when configured, starts the
/// padding schedule. `get` never blocks: it either serves a cached UID or
/// returns a recoverable [`UidError::BufferEmpty`] while padding catches
/// up in the background.
///
/// Dropping the generator (or calling [`destroy`](Self::destroy)) stops
/// the schedule and waits for in-flight padding passes.
pub struct CachedUidGenerator {
    allocator: BitsAllocator,
    worker_id: i64,
    epoch_seconds: i64,
    ring: Arc<RingBuffer>,
    padding: Arc<PaddingExecutor>,
}

impl CachedUidGenerator {
    /// Builds a generator with the default rejection policies.
    pub fn new(config: GeneratorConfig, worker_id: i64) -> Result<Self, UidError> {
        Self::builder(config).worker_id(worker_id).build()
    }

    /// Builds a generator with a worker id drawn from `assigner`.
    pub fn with_assigner(
        config: GeneratorConfig,
        assigner: &dyn WorkerIdAssigner,
    ) -> Result<Self, UidError> {
        Self::builder(config)
            .worker_id(assigner.assign_worker_id())
            .build()
    }

    /// Starts a builder for plugging in custom rejection policies.
    pub fn builder(config: GeneratorConfig) -> CachedUidGeneratorBuilder {
        CachedUidGeneratorBuilder {
            config,
            worker_id: None,
            rejected_put: None,
            rejected_take: None,
        }
    }

    /// The ring backing this generator.
    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// The padding executor backing this generator.
    pub fn padding_executor(&self) -> &Arc<PaddingExecutor> {
        &self.padding
    }

    /// The configured worker id.
    ///
    /// Note that cached UIDs carry the cache-mode marker (`max_worker_id`)
    /// in their worker field, not this value; see
    /// [`CachedUidProvider`](crate::CachedUidProvider).
    pub fn worker_id(&self) -> i64 {
        self.worker_id
    }

    /// The field layout in use.
    pub fn allocator(&self) -> &BitsAllocator {
        &self.allocator
    }

    /// Stops the padding schedule and waits for in-flight passes.
    pub fn destroy(&self) {
        self.padding.shutdown();
    }
}

impl UidGenerator for CachedUidGenerator {
    fn get(&self) -> Result<i64, UidError> {
        self.ring.take()
    }

    fn must(&self) -> i64 {
        match self.get() {
            Ok(uid) => uid,
            Err(err) => panic!("uid generation failed: {err}"),
        }
    }

    fn parse(&self, uid: i64) -> String {
        format_uid_json(&self.allocator, self.epoch_seconds, uid)
    }
}

impl Drop for CachedUidGenerator {
    fn drop(&mut self) {
        self.padding.shutdown();
    }
}

impl std::fmt::Debug for CachedUidGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedUidGenerator")
            .field("worker_id", &self.worker_id)
            .field("epoch_seconds", &self.epoch_seconds)
            .field("ring", &self.ring)
            .finish_non_exhaustive()
    }
}

/// Builder assembling a [`CachedUidGenerator`].
pub struct CachedUidGeneratorBuilder {
    config: GeneratorConfig,
    worker_id: Option<i64>,
    rejected_put: Option<Box<dyn RejectedPutHandler>>,
    rejected_take: Option<Box<dyn RejectedTakeHandler>>,
}

impl CachedUidGeneratorBuilder {
    /// Sets the worker id. Defaults to a [`LocalAssigner`] draw.
    pub fn worker_id(mut self, worker_id: i64) -> Self {
        self.worker_id = Some(worker_id);
        self
    }

    /// Replaces the rejected-put policy.
    pub fn rejected_put_handler(mut self, handler: Box<dyn RejectedPutHandler>) -> Self {
        self.rejected_put = Some(handler);
        self
    }

    /// Replaces the rejected-take policy.
    pub fn rejected_take_handler(mut self, handler: Box<dyn RejectedTakeHandler>) -> Self {
        self.rejected_take = Some(handler);
        self
    }

    /// Validates the configuration, assembles ring and executor, pre-loads
    /// the first batch and starts the schedule.
    pub fn build(self) -> Result<CachedUidGenerator, UidError> {
        self.config.validate()?;
        let allocator = BitsAllocator::new(
            self.config.time_bits,
            self.config.worker_bits,
            self.config.seq_bits,
        )?;

        let worker_id = self
            .worker_id
            .unwrap_or_else(|| LocalAssigner.assign_worker_id());
        if worker_id < 0 || worker_id > allocator.max_worker_id() {
            return Err(UidError::WorkerIdOutOfRange {
                worker_id,
                max: allocator.max_worker_id(),
            });
        }

        let epoch_seconds = config::epoch_seconds(&self.config.epoch)?;

        let batch_size = (allocator.max_sequence() + 1) as usize;
        let buffer_size = batch_size
            .checked_shl(self.config.boost_power)
            .ok_or(UidError::InvalidBoostPower(self.config.boost_power))?;
        let mut ring = RingBuffer::new(buffer_size, self.config.padding_factor)?;
        if let Some(handler) = self.rejected_put {
            ring.set_rejected_put_handler(handler);
        }
        if let Some(handler) = self.rejected_take {
            ring.set_rejected_take_handler(handler);
        }
        let ring = Arc::new(ring);
        tracing::debug!(
            buffer_size = ring.buffer_size(),
            padding_factor = self.config.padding_factor,
            "initialized ring buffer"
        );

        let padding = PaddingExecutor::new(
            Arc::clone(&ring),
            Box::new(CachedUidProvider::new(allocator)),
            epoch_seconds,
            self.config.schedule_interval,
        );
        padding.prime();
        Arc::clone(&padding).start_schedule();
        tracing::debug!(
            schedule = !self.config.schedule_interval.is_zero(),
            interval = ?self.config.schedule_interval,
            "initialized padding executor"
        );

        Ok(CachedUidGenerator {
            allocator,
            worker_id,
            epoch_seconds,
            ring,
            padding,
        })
    }
}

/// Renders a UID as the JSON object
/// `{"UID": "...", "timestamp": "...", "workerId": "...", "sequence": "..."}`
/// with the timestamp formatted in local time.
pub(crate) fn format_uid_json(allocator: &BitsAllocator, epoch_seconds: i64, uid: i64) -> String {
    let (delta, worker_id, sequence) = allocator.parse(uid);
    let timestamp = Local
        .timestamp_opt(epoch_seconds + delta, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    serde_json::json!({
        "UID": uid.to_string(),
        "timestamp": timestamp,
        "workerId": worker_id.to_string(),
        "sequence": sequence.to_string(),
    })
    .to_string()
}
