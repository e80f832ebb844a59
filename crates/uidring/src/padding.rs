//! Background filling of the UID ring buffer.

use crate::provider::UidProvider;
use crate::ring::RingBuffer;
use crossbeam_utils::sync::WaitGroup;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Fills the ring buffer one second-batch at a time.
///
/// Padding runs on demand (triggered by `take` below the threshold) and,
/// when an interval is configured, on a periodic schedule. At most one
/// padding pass runs at a time, admitted by the `running` flag.
///
/// `last_second` starts at the wall-clock second of construction and
/// advances strictly by one per batch, independent of the wall clock.
/// Clock rollback therefore cannot affect the cached path; a cache consumed
/// faster than real time runs ahead of the clock, bounded by the timestamp
/// field width.
pub struct PaddingExecutor {
    epoch_seconds: i64,
    /// Admits at most one padding pass; CASed false → true on entry.
    running: AtomicBool,
    /// Most recent second a full batch was produced for.
    last_second: AtomicI64,
    ring: Arc<RingBuffer>,
    provider: Box<dyn UidProvider>,
    schedule_interval: Duration,
    shut_down: AtomicBool,
    schedule: Mutex<Option<ScheduleHandle>>,
    /// Tracks in-flight async passes so shutdown can wait for them.
    in_flight: Mutex<Option<WaitGroup>>,
}

struct ScheduleHandle {
    stop_tx: mpsc::Sender<()>,
    thread: thread::JoinHandle<()>,
}

impl PaddingExecutor {
    /// Creates an executor over a shared ring and attaches itself as the
    /// ring's padding trigger. A zero `schedule_interval` disables the
    /// periodic timer.
    pub fn new(
        ring: Arc<RingBuffer>,
        provider: Box<dyn UidProvider>,
        epoch_seconds: i64,
        schedule_interval: Duration,
    ) -> Arc<Self> {
        let executor = Arc::new(Self {
            epoch_seconds,
            running: AtomicBool::new(false),
            last_second: AtomicI64::new(crate::current_second()),
            ring: Arc::clone(&ring),
            provider,
            schedule_interval,
            shut_down: AtomicBool::new(false),
            schedule: Mutex::new(None),
            in_flight: Mutex::new(Some(WaitGroup::new())),
        });
        ring.attach_padding_executor(Arc::downgrade(&executor));
        executor
    }

    /// Pre-loads exactly one second-batch. Called once at construction by
    /// the cached generator, before any consumer exists.
    pub fn prime(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        self.produce_next_batch();
        self.running.store(false, Ordering::Release);
    }

    /// Synchronous refill: produces batches until the ring rejects a put or
    /// the timestamp field is exhausted. Returns immediately if another
    /// pass is already running.
    pub fn padding_buffer(&self) {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("padding pass already in progress");
            return;
        }

        tracing::debug!(
            last_second = self.last_second.load(Ordering::Acquire),
            "padding pass started"
        );
        while self.produce_next_batch() {}
        tracing::debug!(
            last_second = self.last_second.load(Ordering::Acquire),
            tail = self.ring.tail(),
            "padding pass finished"
        );

        self.running.store(false, Ordering::Release);
    }

    /// One padding iteration: advance `last_second`, provide the batch for
    /// it and put every UID. Returns `false` once the ring is full or the
    /// provider refuses, ending the pass.
    fn produce_next_batch(&self) -> bool {
        let next_second = self.last_second.fetch_add(1, Ordering::AcqRel) + 1;
        let uids = match self.provider.provide(self.epoch_seconds, next_second) {
            Ok(uids) => uids,
            Err(err) => {
                tracing::error!(%err, next_second, "padding stopped");
                return false;
            }
        };

        for uid in uids {
            if !self.ring.put(uid) {
                return false;
            }
        }
        true
    }

    /// Spawns a background thread running one padding pass and returns
    /// immediately. No-op after shutdown.
    pub fn async_padding(self: Arc<Self>) {
        if self.shut_down.load(Ordering::Acquire) {
            return;
        }
        let Some(wg) = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(WaitGroup::clone)
        else {
            return;
        };

        let spawned = thread::Builder::new()
            .name("uidring-padding".into())
            .spawn(move || {
                self.padding_buffer();
                drop(wg);
            });
        if let Err(err) = spawned {
            tracing::warn!(%err, "failed to spawn padding thread");
        }
    }

    /// Starts the periodic schedule if an interval was configured.
    pub fn start_schedule(self: Arc<Self>) {
        if self.schedule_interval.is_zero() || self.shut_down.load(Ordering::Acquire) {
            return;
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let interval = self.schedule_interval;
        let executor = Arc::clone(&self);
        let spawned = thread::Builder::new()
            .name("uidring-schedule".into())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        Arc::clone(&executor).async_padding();
                    }
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                }
            });

        match spawned {
            Ok(thread) => {
                *self.schedule.lock().unwrap_or_else(PoisonError::into_inner) =
                    Some(ScheduleHandle { stop_tx, thread });
            }
            Err(err) => tracing::warn!(%err, "failed to spawn schedule thread"),
        }
    }

    /// Stops the periodic timer and waits for in-flight padding passes.
    /// Idempotent; later `async_padding` calls become no-ops.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(handle) = self
            .schedule
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = handle.stop_tx.send(());
            let _ = handle.thread.join();
        }

        if let Some(wg) = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            wg.wait();
        }
    }

    /// Most recent second a batch was produced for.
    pub fn last_second(&self) -> i64 {
        self.last_second.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for PaddingExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaddingExecutor")
            .field("epoch_seconds", &self.epoch_seconds)
            .field("last_second", &self.last_second())
            .field("schedule_interval", &self.schedule_interval)
            .finish_non_exhaustive()
    }
}
