use core::fmt;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    config::WorkerConfig,
    error::Result,
    generator::{
        IdGenerator, Mutex,
        state::{Encoder, WorkerState},
    },
    id::SnowflakeId,
    layout::BitLayout,
    rand::{RandSource, ThreadRandom},
    time::{SystemClock, TimeSource},
};

/// A lock-based id worker suitable for multi-threaded environments.
///
/// The whole of id generation (clock read, branch on the previous timestamp,
/// state update) runs under a single mutex, so concurrent callers on one
/// instance never observe or write inconsistent state. Share it behind an
/// [`Arc`] or a `static`.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Any [`BitLayout`] up to 63 bits
/// - ✅ Pluggable [`TimeSource`] and [`RandSource`]
///
/// ## Recommended When
/// - Several threads issue ids from the same worker id
///
/// ## See Also
/// - [`BasicIdWorker`]
///
/// [`Arc`]: std::sync::Arc
/// [`BasicIdWorker`]: crate::BasicIdWorker
pub struct IdWorker<T = SystemClock, R = ThreadRandom>
where
    T: TimeSource,
    R: RandSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<WorkerState>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<WorkerState>,
    encoder: Encoder,
    time: T,
    rng: R,
}

impl IdWorker {
    /// Creates a worker with the default epoch and layout, reading the system
    /// clock and the thread-local CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either id does not fit the default
    /// 5-bit fields.
    ///
    /// # Example
    /// ```
    /// use idworker::IdWorker;
    ///
    /// let worker = IdWorker::new(5, 3).unwrap();
    /// let first = worker.next_id().unwrap();
    /// let second = worker.next_id().unwrap();
    /// assert_ne!(first, second);
    ///
    /// assert!(IdWorker::new(32, 0).is_err());
    /// ```
    pub fn new(worker_id: i64, datacenter_id: i64) -> Result<Self> {
        Self::from_config(&WorkerConfig::new(worker_id, datacenter_id))
    }

    /// Creates a worker with an explicit epoch and layout.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the layout leaves no timestamp bits,
    /// the epoch is too late to decode against, or either id does not fit
    /// its field.
    pub fn with_layout(
        worker_id: i64,
        datacenter_id: i64,
        epoch_ms: u64,
        layout: BitLayout,
    ) -> Result<Self> {
        let config = WorkerConfig::new(worker_id, datacenter_id)
            .with_epoch_ms(epoch_ms)
            .with_layout(layout);
        Self::from_config(&config)
    }

    /// Creates a worker from a [`WorkerConfig`].
    ///
    /// # Errors
    ///
    /// See [`WorkerConfig::validate`].
    pub fn from_config(config: &WorkerConfig) -> Result<Self> {
        Self::with_sources(config, SystemClock, ThreadRandom)
    }
}

impl<T, R> IdWorker<T, R>
where
    T: TimeSource,
    R: RandSource,
{
    /// Creates a worker reading time from `time` and seeding each new
    /// millisecond from `rng`.
    ///
    /// # Errors
    ///
    /// See [`WorkerConfig::validate`].
    pub fn with_sources(config: &WorkerConfig, time: T, rng: R) -> Result<Self> {
        let encoder = Encoder::new(config)?;
        Ok(Self::from_parts(encoder, WorkerState::default(), time, rng))
    }

    /// Creates a worker whose last issued id was at `last_timestamp_ms` with
    /// `sequence`.
    ///
    /// This constructor is primarily useful for advanced use cases such as
    /// resuming after a restart without reissuing ids from the same
    /// millisecond. `sequence` is truncated to the layout's sequence width.
    ///
    /// # ⚠️ Note
    /// In typical use cases, you should prefer [`IdWorker::with_sources`].
    ///
    /// # Errors
    ///
    /// See [`WorkerConfig::validate`].
    pub fn from_components(
        config: &WorkerConfig,
        last_timestamp_ms: u64,
        sequence: u64,
        time: T,
        rng: R,
    ) -> Result<Self> {
        let encoder = Encoder::new(config)?;
        let state = WorkerState::from_components(last_timestamp_ms, sequence, &encoder);
        Ok(Self::from_parts(encoder, state, time, rng))
    }

    fn from_parts(encoder: Encoder, state: WorkerState, time: T, rng: R) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(state)),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(state),
            encoder,
            time,
            rng,
        }
    }

    /// Issues the next id.
    ///
    /// If the current millisecond's sequence space is exhausted this spins,
    /// still holding the lock, until the clock moves on. That wait is bounded
    /// by about one millisecond on a live clock.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockMovedBackwards`] if the clock reads earlier than the
    ///   last issued timestamp (or the epoch, before the first id). Nothing is
    ///   issued and the worker's state is unchanged; whether to wait it out or
    ///   abort is up to the caller.
    /// - [`Error::TimestampOverflow`] if the clock is further past the epoch
    ///   than the layout's timestamp field can hold.
    /// - `Error::LockPoisoned` if another thread panicked inside the lock
    ///   (only without the `parking-lot` feature).
    ///
    /// # Example
    /// ```
    /// use idworker::{Error, IdWorker};
    ///
    /// let worker = IdWorker::new(1, 1).unwrap();
    /// match worker.next_id() {
    ///     Ok(id) => println!("issued {id}"),
    ///     Err(Error::ClockMovedBackwards { behind_ms }) => {
    ///         eprintln!("clock is {behind_ms}ms behind, retry later");
    ///     }
    ///     Err(e) => panic!("worker error: {e}"),
    /// }
    /// ```
    ///
    /// [`Error::ClockMovedBackwards`]: crate::Error::ClockMovedBackwards
    /// [`Error::TimestampOverflow`]: crate::Error::TimestampOverflow
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<SnowflakeId> {
        let mut state = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        state.next_id(&self.encoder, &self.time, &self.rng)
    }

    /// The configuration this worker was built with.
    pub const fn config(&self) -> &WorkerConfig {
        self.encoder.config()
    }
}

impl<T, R> IdGenerator for IdWorker<T, R>
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

impl<T, R> fmt::Debug for IdWorker<T, R>
where
    T: TimeSource,
    R: RandSource,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdWorker")
            .field("config", self.config())
            .finish_non_exhaustive()
    }
}
