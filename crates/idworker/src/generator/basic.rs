use core::{cell::Cell, fmt};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::WorkerConfig,
    error::Result,
    generator::{
        IdGenerator,
        state::{Encoder, WorkerState},
    },
    id::SnowflakeId,
    rand::{RandSource, ThreadRandom},
    time::{SystemClock, TimeSource},
};

/// A non-concurrent id worker suitable for single-threaded environments.
///
/// Runs the same state machine as [`IdWorker`] without a lock. It is `!Sync`,
/// so the compiler keeps it on one thread.
///
/// ## Features
/// - ❌ Not thread-safe
/// - ✅ No locking overhead
///
/// ## Recommended When
/// - Each thread or task owns its own worker id
///
/// ## See Also
/// - [`IdWorker`]
///
/// [`IdWorker`]: crate::IdWorker
pub struct BasicIdWorker<T = SystemClock, R = ThreadRandom>
where
    T: TimeSource,
    R: RandSource,
{
    state: Cell<WorkerState>,
    encoder: Encoder,
    time: T,
    rng: R,
}

impl BasicIdWorker {
    /// Creates a worker from a [`WorkerConfig`], reading the system clock and
    /// the thread-local CSPRNG.
    ///
    /// # Errors
    ///
    /// See [`WorkerConfig::validate`].
    ///
    /// # Example
    /// ```
    /// use idworker::{BasicIdWorker, WorkerConfig};
    ///
    /// let worker = BasicIdWorker::from_config(&WorkerConfig::new(0, 0)).unwrap();
    /// let id = worker.next_id().unwrap();
    /// assert!(id.to_raw() > 0);
    /// ```
    pub fn from_config(config: &WorkerConfig) -> Result<Self> {
        Self::with_sources(config, SystemClock, ThreadRandom)
    }
}

impl<T, R> BasicIdWorker<T, R>
where
    T: TimeSource,
    R: RandSource,
{
    /// # Errors
    ///
    /// See [`WorkerConfig::validate`].
    pub fn with_sources(config: &WorkerConfig, time: T, rng: R) -> Result<Self> {
        Ok(Self {
            state: Cell::new(WorkerState::default()),
            encoder: Encoder::new(config)?,
            time,
            rng,
        })
    }

    /// Creates a worker whose last issued id was at `last_timestamp_ms` with
    /// `sequence`. See [`IdWorker::from_components`].
    ///
    /// # Errors
    ///
    /// See [`WorkerConfig::validate`].
    ///
    /// [`IdWorker::from_components`]: crate::IdWorker::from_components
    pub fn from_components(
        config: &WorkerConfig,
        last_timestamp_ms: u64,
        sequence: u64,
        time: T,
        rng: R,
    ) -> Result<Self> {
        let encoder = Encoder::new(config)?;
        Ok(Self {
            state: Cell::new(WorkerState::from_components(
                last_timestamp_ms,
                sequence,
                &encoder,
            )),
            encoder,
            time,
            rng,
        })
    }

    /// Issues the next id. See [`IdWorker::next_id`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackwards`] if the clock reads earlier than
    /// the last issued timestamp, or [`Error::TimestampOverflow`] once the
    /// timestamp field is used up.
    ///
    /// [`IdWorker::next_id`]: crate::IdWorker::next_id
    /// [`Error::ClockMovedBackwards`]: crate::Error::ClockMovedBackwards
    /// [`Error::TimestampOverflow`]: crate::Error::TimestampOverflow
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut state = self.state.get();
        let id = state.next_id(&self.encoder, &self.time, &self.rng)?;
        self.state.set(state);
        Ok(id)
    }

    pub const fn config(&self) -> &WorkerConfig {
        self.encoder.config()
    }
}

impl<T, R> IdGenerator for BasicIdWorker<T, R>
where
    T: TimeSource,
    R: RandSource,
{
    fn next_id(&self) -> Result<SnowflakeId> {
        self.next_id()
    }

    fn config(&self) -> &WorkerConfig {
        self.config()
    }
}

impl<T, R> fmt::Debug for BasicIdWorker<T, R>
where
    T: TimeSource,
    R: RandSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicIdWorker")
            .field("config", self.config())
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}
