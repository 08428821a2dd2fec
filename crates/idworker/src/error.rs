/// A result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `idworker` can emit.
///
/// The configuration variants are raised at construction and are permanent:
/// the worker is never created. [`Error::ClockMovedBackwards`] is raised per
/// call and resolves once the clock catches up, but retry policy is left to
/// the caller. [`Error::TimestampOverflow`] means the layout's lifetime is
/// used up and never resolves on its own.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The worker id does not fit in the configured worker id field.
    #[error("worker id can't be greater than {max} or less than 0 (got {worker_id})")]
    WorkerIdOutOfRange {
        /// The rejected worker id.
        worker_id: i64,
        /// Largest worker id the layout can encode.
        max: i64,
    },

    /// The datacenter id does not fit in the configured datacenter id field.
    #[error("datacenter id can't be greater than {max} or less than 0 (got {datacenter_id})")]
    DatacenterIdOutOfRange {
        /// The rejected datacenter id.
        datacenter_id: i64,
        /// Largest datacenter id the layout can encode.
        max: i64,
    },

    /// The configured fields leave no timestamp bits below the sign bit.
    #[error("datacenter id, worker id and sequence use {total_bits} bits, at most 62 leave room for a timestamp")]
    LayoutTooWide {
        /// Sum of the datacenter id, worker id and sequence widths.
        total_bits: u32,
    },

    /// The epoch is so late that timestamps decoded with it would not fit in
    /// a `u64`.
    #[error("epoch {epoch_ms} is too late, the layout needs it to be at most {max_epoch_ms}")]
    EpochOutOfRange {
        /// The rejected epoch.
        epoch_ms: u64,
        /// Latest epoch the layout can decode against.
        max_epoch_ms: u64,
    },

    /// The clock reported a time earlier than the last issued timestamp.
    #[error("clock moved backwards, refusing to generate id for {behind_ms} milliseconds")]
    ClockMovedBackwards {
        /// How far the clock is behind, in milliseconds.
        behind_ms: u64,
    },

    /// The clock is further past the epoch than the timestamp field can
    /// encode. Issuing anyway would reuse earlier timestamps, so the worker
    /// stops until it is reconfigured with a later epoch or a wider
    /// timestamp.
    #[error("timestamp is {offset_ms}ms past the epoch, the layout encodes at most {max_ms}ms")]
    TimestampOverflow {
        /// Milliseconds between the epoch and the current clock reading.
        offset_ms: u64,
        /// Largest offset the timestamp field can hold.
        max_ms: u64,
    },

    /// The worker state lock was poisoned by a panicking thread.
    ///
    /// Mutexes from `parking_lot` do not poison, so this variant only exists
    /// when the `parking-lot` feature is disabled.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("worker state lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Returns `true` for errors raised while validating a worker's
    /// configuration.
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::WorkerIdOutOfRange { .. }
                | Self::DatacenterIdOutOfRange { .. }
                | Self::LayoutTooWide { .. }
                | Self::EpochOutOfRange { .. }
        )
    }

    /// Returns `true` if the error reports a clock regression.
    pub const fn is_clock_regression(&self) -> bool {
        matches!(self, Self::ClockMovedBackwards { .. })
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
