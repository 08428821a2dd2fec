use crate::{
    error::{Error, Result},
    layout::BitLayout,
    time::TWITTER_EPOCH_MS,
};

/// Everything needed to construct a worker.
///
/// Worker and datacenter ids are assigned by deployment tooling; the epoch and
/// layout must be identical across every worker in a fleet. With the `serde`
/// feature the struct can be loaded from any serde format, with `epoch_ms`
/// and `layout` falling back to [`TWITTER_EPOCH_MS`] and
/// [`BitLayout::TWITTER`].
///
/// ```
/// use idworker::{BitLayout, TWITTER_EPOCH_MS, WorkerConfig};
///
/// let config = WorkerConfig::new(5, 3);
/// assert_eq!(config.epoch_ms, TWITTER_EPOCH_MS);
/// assert_eq!(config.layout, BitLayout::TWITTER);
/// assert!(config.validate().is_ok());
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkerConfig {
    pub worker_id: i64,
    pub datacenter_id: i64,
    #[cfg_attr(feature = "serde", serde(default = "default_epoch_ms"))]
    pub epoch_ms: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub layout: BitLayout,
}

#[cfg(feature = "serde")]
const fn default_epoch_ms() -> u64 {
    TWITTER_EPOCH_MS
}

impl WorkerConfig {
    /// Config with the default epoch and layout.
    pub const fn new(worker_id: i64, datacenter_id: i64) -> Self {
        Self {
            worker_id,
            datacenter_id,
            epoch_ms: TWITTER_EPOCH_MS,
            layout: BitLayout::TWITTER,
        }
    }

    #[must_use]
    pub const fn with_epoch_ms(mut self, epoch_ms: u64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }

    #[must_use]
    pub const fn with_layout(mut self, layout: BitLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Checks the layout width, the epoch and that both ids fit their fields.
    ///
    /// # Errors
    ///
    /// - [`Error::LayoutTooWide`] if the layout leaves no timestamp bits
    /// - [`Error::EpochOutOfRange`] if `epoch_ms` plus the largest timestamp
    ///   offset does not fit in a `u64`
    /// - [`Error::WorkerIdOutOfRange`] if `worker_id` is negative or too large
    /// - [`Error::DatacenterIdOutOfRange`] if `datacenter_id` is negative or
    ///   too large
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;

        let max_epoch_ms = u64::MAX - self.layout.max_timestamp();
        if self.epoch_ms > max_epoch_ms {
            return Err(Error::EpochOutOfRange {
                epoch_ms: self.epoch_ms,
                max_epoch_ms,
            });
        }

        // Validated layouts are at most 63 bits wide, so every max fits in an
        // i64.
        let max_worker_id = self.layout.max_worker_id() as i64;
        if !(0..=max_worker_id).contains(&self.worker_id) {
            return Err(Error::WorkerIdOutOfRange {
                worker_id: self.worker_id,
                max: max_worker_id,
            });
        }

        let max_datacenter_id = self.layout.max_datacenter_id() as i64;
        if !(0..=max_datacenter_id).contains(&self.datacenter_id) {
            return Err(Error::DatacenterIdOutOfRange {
                datacenter_id: self.datacenter_id,
                max: max_datacenter_id,
            });
        }

        Ok(())
    }
}
