use crate::{config::WorkerConfig, error::Result, id::SnowflakeId, layout::IdParts};

/// A minimal interface for issuing ids.
///
/// Implemented by [`IdWorker`] and [`BasicIdWorker`] so code can be written
/// against either.
///
/// [`IdWorker`]: crate::IdWorker
/// [`BasicIdWorker`]: crate::BasicIdWorker
pub trait IdGenerator {
    /// Issues the next id, spinning into the next millisecond if the current
    /// one's sequence space is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockMovedBackwards`] if the clock is behind the last issued
    ///   timestamp
    /// - [`Error::TimestampOverflow`] if the timestamp field is used up
    /// - [`Error::LockPoisoned`] if the implementation uses a std mutex and it
    ///   is poisoned
    ///
    /// [`Error::ClockMovedBackwards`]: crate::Error::ClockMovedBackwards
    /// [`Error::TimestampOverflow`]: crate::Error::TimestampOverflow
    /// [`Error::LockPoisoned`]: crate::Error
    fn next_id(&self) -> Result<SnowflakeId>;

    /// The configuration the generator was built with.
    fn config(&self) -> &WorkerConfig;

    /// Decodes an id using this generator's layout and epoch.
    fn decompose(&self, id: SnowflakeId) -> IdParts {
        let config = self.config();
        id.decompose(&config.layout, config.epoch_ms)
    }
}
