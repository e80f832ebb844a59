//! Generator configuration.

use crate::error::UidError;
use std::time::Duration;

/// Default width of the delta-seconds field (about 8.5 years of seconds).
pub const DEFAULT_TIME_BITS: u32 = 28;

/// Default width of the worker field (about 4.2M generator constructions).
pub const DEFAULT_WORKER_BITS: u32 = 22;

/// Default width of the sequence field (8192 UIDs per second).
pub const DEFAULT_SEQ_BITS: u32 = 13;

/// Default epoch date.
pub const DEFAULT_EPOCH: &str = "2024-01-01";

/// Default ring size multiplier: buffer holds `batch << boost` slots.
pub const DEFAULT_BOOST_POWER: u32 = 3;

/// Default refill trigger, in percent of the buffer remaining.
pub const DEFAULT_PADDING_FACTOR: u32 = 50;

/// Default cadence of scheduled padding.
pub const DEFAULT_SCHEDULE_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration shared by the cached and direct generators.
///
/// The `with_*` methods allow fluent adjustment from the defaults:
///
/// ```
/// use uidring::GeneratorConfig;
/// use std::time::Duration;
///
/// let config = GeneratorConfig::default()
///     .with_epoch("2020-10-12")
///     .with_boost_power(1)
///     .with_schedule_interval(Duration::ZERO);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Width of the delta-seconds field.
    pub time_bits: u32,
    /// Width of the worker field.
    pub worker_bits: u32,
    /// Width of the sequence field.
    pub seq_bits: u32,
    /// Epoch date, `YYYY-MM-DD`, interpreted at midnight UTC.
    pub epoch: String,
    /// Ring size multiplier; the buffer holds `(max_sequence + 1) << boost_power` slots.
    pub boost_power: u32,
    /// Percent of the buffer remaining below which padding is triggered.
    pub padding_factor: u32,
    /// Cadence of scheduled padding; zero disables the timer.
    pub schedule_interval: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            time_bits: DEFAULT_TIME_BITS,
            worker_bits: DEFAULT_WORKER_BITS,
            seq_bits: DEFAULT_SEQ_BITS,
            epoch: DEFAULT_EPOCH.to_string(),
            boost_power: DEFAULT_BOOST_POWER,
            padding_factor: DEFAULT_PADDING_FACTOR,
            schedule_interval: DEFAULT_SCHEDULE_INTERVAL,
        }
    }
}

impl GeneratorConfig {
    /// Sets the delta-seconds width.
    pub fn with_time_bits(mut self, bits: u32) -> Self {
        self.time_bits = bits;
        self
    }

    /// Sets the worker width.
    pub fn with_worker_bits(mut self, bits: u32) -> Self {
        self.worker_bits = bits;
        self
    }

    /// Sets the sequence width.
    pub fn with_seq_bits(mut self, bits: u32) -> Self {
        self.seq_bits = bits;
        self
    }

    /// Sets the epoch date (`YYYY-MM-DD`).
    pub fn with_epoch(mut self, epoch: impl Into<String>) -> Self {
        self.epoch = epoch.into();
        self
    }

    /// Sets the ring size multiplier.
    pub fn with_boost_power(mut self, boost_power: u32) -> Self {
        self.boost_power = boost_power;
        self
    }

    /// Sets the padding factor in percent.
    pub fn with_padding_factor(mut self, padding_factor: u32) -> Self {
        self.padding_factor = padding_factor;
        self
    }

    /// Sets the scheduled padding cadence; `Duration::ZERO` disables it.
    pub fn with_schedule_interval(mut self, interval: Duration) -> Self {
        self.schedule_interval = interval;
        self
    }

    /// Validates the cache tuning knobs.
    ///
    /// Bit widths are validated by [`crate::BitsAllocator::new`] and the
    /// epoch by [`epoch_seconds`]; this covers the rest.
    pub fn validate(&self) -> Result<(), UidError> {
        if self.padding_factor == 0 || self.padding_factor >= 100 {
            return Err(UidError::InvalidPaddingFactor(self.padding_factor));
        }
        if self.boost_power == 0 || self.boost_power >= 32 {
            return Err(UidError::InvalidBoostPower(self.boost_power));
        }
        Ok(())
    }
}

/// Parses a `YYYY-MM-DD` epoch into seconds since the Unix epoch at
/// midnight UTC. Fails loudly on malformed input; minting IDs against a
/// fallback epoch the caller did not ask for is worse than an error.
pub fn epoch_seconds(epoch: &str) -> Result<i64, UidError> {
    let date = chrono::NaiveDate::parse_from_str(epoch, "%Y-%m-%d")
        .map_err(|_| UidError::InvalidEpoch(epoch.to_string()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| UidError::InvalidEpoch(epoch.to_string()))?;
    Ok(midnight.and_utc().timestamp())
}
