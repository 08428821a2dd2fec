#[cfg(feature = "tracing")]
use tracing::{error, trace};

use crate::{
    config::WorkerConfig,
    error::{Error, Result},
    id::SnowflakeId,
    rand::RandSource,
    time::TimeSource,
};

/// The validated, immutable half of a worker: everything needed to pack a
/// timestamp and sequence into an id.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Encoder {
    config: WorkerConfig,
    worker_id: u64,
    datacenter_id: u64,
}

impl Encoder {
    pub(crate) fn new(config: &WorkerConfig) -> Result<Self> {
        config.validate()?;

        #[cfg(feature = "tracing")]
        tracing::info!(
            timestamp_shift = config.layout.timestamp_shift(),
            datacenter_id_bits = config.layout.datacenter_id_bits(),
            worker_id_bits = config.layout.worker_id_bits(),
            sequence_bits = config.layout.sequence_bits(),
            worker_id = config.worker_id,
            datacenter_id = config.datacenter_id,
            epoch_ms = config.epoch_ms,
            "worker starting"
        );

        Ok(Self {
            config: *config,
            // Non-negative after validation.
            worker_id: config.worker_id as u64,
            datacenter_id: config.datacenter_id as u64,
        })
    }

    pub(crate) const fn config(&self) -> &WorkerConfig {
        &self.config
    }

    fn sequence_mask(&self) -> u64 {
        self.config.layout.sequence_mask()
    }

    /// `now` must not be earlier than the epoch.
    fn encode(&self, now: u64, sequence: u64) -> Result<SnowflakeId> {
        let offset_ms = now - self.config.epoch_ms;
        let max_ms = self.config.layout.max_timestamp();
        if offset_ms > max_ms {
            return Err(cold_timestamp_overflow(offset_ms, max_ms));
        }

        let raw = self.config.layout.compose(
            offset_ms,
            self.datacenter_id,
            self.worker_id,
            sequence,
        );
        Ok(SnowflakeId::from_raw(raw))
    }
}

/// The mutable half of a worker: the last issued millisecond and the
/// sequence within it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct WorkerState {
    /// `None` until the first id is issued.
    last_timestamp: Option<u64>,
    sequence: u64,
}

impl WorkerState {
    pub(crate) fn from_components(last_timestamp: u64, sequence: u64, encoder: &Encoder) -> Self {
        Self {
            last_timestamp: Some(last_timestamp),
            sequence: sequence & encoder.sequence_mask(),
        }
    }

    /// Reads the clock and issues the next id.
    ///
    /// Must be called with exclusive access to `self` for the whole call: the
    /// clock read and the branch taken on it have to agree with the state
    /// that is written back. On error the state is left untouched.
    pub(crate) fn next_id<T, R>(
        &mut self,
        encoder: &Encoder,
        time: &T,
        rng: &R,
    ) -> Result<SnowflakeId>
    where
        T: TimeSource,
        R: RandSource,
    {
        let mut now = time.current_millis();

        let sequence = match self.last_timestamp {
            Some(last) if now < last => return Err(Self::cold_clock_behind(now, last)),
            // The epoch is the floor, including for a resumed state.
            _ if now < encoder.config.epoch_ms => {
                return Err(Self::cold_clock_behind(now, encoder.config.epoch_ms));
            }
            Some(last) if now == last => {
                let sequence = (self.sequence + 1) & encoder.sequence_mask();
                if sequence == 0 {
                    now = Self::cold_wait_next_millis(time, last);
                }
                sequence
            }
            // Seed each new millisecond with 0 or 1 instead of 0.
            _ => rng.rand() & 1 & encoder.sequence_mask(),
        };

        let id = encoder.encode(now, sequence)?;
        self.last_timestamp = Some(now);
        self.sequence = sequence;
        Ok(id)
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        let behind_ms = last - now;

        #[cfg(feature = "tracing")]
        error!(
            behind_ms,
            "clock is moving backwards, rejecting requests until {last}"
        );

        Error::ClockMovedBackwards { behind_ms }
    }

    /// Spins until the clock passes `last`.
    #[cold]
    #[inline(never)]
    fn cold_wait_next_millis<T: TimeSource>(time: &T, last: u64) -> u64 {
        #[cfg(feature = "tracing")]
        trace!(last, "sequence exhausted, spinning until the next millisecond");

        loop {
            let now = time.current_millis();
            if now > last {
                break now;
            }
            core::hint::spin_loop();
        }
    }
}

#[cold]
#[inline(never)]
fn cold_timestamp_overflow(offset_ms: u64, max_ms: u64) -> Error {
    #[cfg(feature = "tracing")]
    error!(offset_ms, max_ms, "timestamp no longer fits the layout, refusing to issue ids");

    Error::TimestampOverflow { offset_ms, max_ms }
}
