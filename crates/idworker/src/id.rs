use core::fmt;

use crate::layout::{BitLayout, IdParts};

/// A 64-bit signed identifier produced by an [`IdWorker`].
///
/// The value is always non-negative: the sign bit is reserved by every
/// [`BitLayout`]. Ids from one worker order by timestamp first, so sorting
/// raw values sorts by issue time at millisecond granularity.
///
/// ```
/// use idworker::{BitLayout, SnowflakeId, TWITTER_EPOCH_MS};
///
/// let layout = BitLayout::TWITTER;
/// let id = SnowflakeId::from_raw(layout.compose(1_000, 3, 5, 1));
///
/// let parts = id.decompose(&layout, TWITTER_EPOCH_MS);
/// assert_eq!(parts.datacenter_id, 3);
/// assert_eq!(parts.worker_id, 5);
/// assert_eq!(parts.sequence, 1);
/// assert_eq!(parts.timestamp_ms, TWITTER_EPOCH_MS + 1_000);
/// ```
///
/// [`IdWorker`]: crate::IdWorker
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: i64,
}

impl SnowflakeId {
    /// Wraps a raw integer, e.g. one read back from a database column.
    pub const fn from_raw(raw: i64) -> Self {
        Self { id: raw }
    }

    /// Returns the raw integer.
    pub const fn to_raw(&self) -> i64 {
        self.id
    }

    /// Splits the id into its fields using `layout` and `epoch_ms`.
    ///
    /// The result is only meaningful when both match what the issuing worker
    /// was configured with.
    pub const fn decompose(&self, layout: &BitLayout, epoch_ms: u64) -> IdParts {
        layout.decompose(self.id, epoch_ms)
    }

    /// Returns the id as a zero-padded 19-digit string, the width of
    /// `i64::MAX`. Padded strings sort the same way the integers do.
    pub fn to_padded_string(&self) -> String {
        format!("{:019}", self.id)
    }
}

impl From<SnowflakeId> for i64 {
    fn from(id: SnowflakeId) -> Self {
        id.id
    }
}

impl From<i64> for SnowflakeId {
    fn from(raw: i64) -> Self {
        Self::from_raw(raw)
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SnowflakeId")
            .field(&format_args!("0x{:016x}", self.id))
            .finish()
    }
}
