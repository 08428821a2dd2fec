use core::fmt;

use crate::error::{Error, Result};

/// Number of bits an id may occupy. The sign bit of the `i64` is reserved so
/// ids are never negative.
pub const MAX_LAYOUT_BITS: u32 = 63;

/// Bit widths of the fields packed into a [`SnowflakeId`].
///
/// The datacenter id, worker id and sequence widths are configured; the
/// timestamp takes every remaining non-sign bit above them. Fields are laid
/// out from the most significant non-sign bit down:
///
/// ```text
///  Bit Index:  63          63 62            22 21               17 16           12 11            0
///              +--------------+----------------+-------------------+---------------+---------------+
///  Field:      | reserved (1) | timestamp (41) | datacenter ID (5) | worker ID (5) | sequence (12) |
///              +--------------+----------------+-------------------+---------------+---------------+
/// ```
///
/// Every worker in a deployment must share the same layout (and epoch) for
/// their ids to be comparable.
///
/// [`SnowflakeId`]: crate::SnowflakeId
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitLayout {
    datacenter_id_bits: u32,
    worker_id_bits: u32,
    sequence_bits: u32,
}

impl Default for BitLayout {
    fn default() -> Self {
        Self::TWITTER
    }
}

impl BitLayout {
    /// The classic 41/5/5/12 layout.
    pub const TWITTER: Self = Self::new(5, 5, 12);

    /// Creates a layout from its field widths. The timestamp gets the rest.
    ///
    /// The widths are not checked here; see [`BitLayout::validate`].
    pub const fn new(datacenter_id_bits: u32, worker_id_bits: u32, sequence_bits: u32) -> Self {
        Self {
            datacenter_id_bits,
            worker_id_bits,
            sequence_bits,
        }
    }

    /// Checks that the configured fields leave at least one timestamp bit
    /// below the sign bit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LayoutTooWide`] when the configured widths sum to 63
    /// or more.
    pub const fn validate(&self) -> Result<()> {
        let total_bits = self.configured_bits();
        if total_bits >= MAX_LAYOUT_BITS {
            return Err(Error::LayoutTooWide { total_bits });
        }
        Ok(())
    }

    /// Sum of the datacenter id, worker id and sequence widths.
    pub const fn configured_bits(&self) -> u32 {
        // Saturating so an absurd layout reports as too wide instead of
        // wrapping back into range.
        self.datacenter_id_bits
            .saturating_add(self.worker_id_bits)
            .saturating_add(self.sequence_bits)
    }

    /// Width of the timestamp field: every non-sign bit left over.
    pub const fn timestamp_bits(&self) -> u32 {
        MAX_LAYOUT_BITS.saturating_sub(self.configured_bits())
    }

    pub const fn datacenter_id_bits(&self) -> u32 {
        self.datacenter_id_bits
    }

    pub const fn worker_id_bits(&self) -> u32 {
        self.worker_id_bits
    }

    pub const fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    /// Largest encodable timestamp offset from the epoch, in milliseconds.
    pub const fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits())
    }

    /// Largest encodable datacenter id.
    pub const fn max_datacenter_id(&self) -> u64 {
        mask(self.datacenter_id_bits)
    }

    /// Largest encodable worker id.
    pub const fn max_worker_id(&self) -> u64 {
        mask(self.worker_id_bits)
    }

    /// Mask applied to the sequence on every increment.
    pub const fn sequence_mask(&self) -> u64 {
        mask(self.sequence_bits)
    }

    pub const fn worker_id_shift(&self) -> u32 {
        self.sequence_bits
    }

    pub const fn datacenter_id_shift(&self) -> u32 {
        self.sequence_bits + self.worker_id_bits
    }

    pub const fn timestamp_shift(&self) -> u32 {
        self.sequence_bits + self.worker_id_bits + self.datacenter_id_bits
    }

    /// Packs the four fields into a raw id.
    ///
    /// `timestamp` is the offset from the epoch, not an absolute time, and
    /// must not exceed [`BitLayout::max_timestamp`]; workers refuse to issue
    /// ids past it. Each field is truncated to its width so an oversized
    /// value can never bleed into a neighbouring field or the sign bit.
    pub const fn compose(
        &self,
        timestamp: u64,
        datacenter_id: u64,
        worker_id: u64,
        sequence: u64,
    ) -> i64 {
        debug_assert!(timestamp <= self.max_timestamp(), "timestamp overflow");
        debug_assert!(datacenter_id <= self.max_datacenter_id(), "datacenter_id overflow");
        debug_assert!(worker_id <= self.max_worker_id(), "worker_id overflow");
        debug_assert!(sequence <= self.sequence_mask(), "sequence overflow");

        let timestamp = shl(timestamp & self.max_timestamp(), self.timestamp_shift());
        let datacenter_id = shl(
            datacenter_id & self.max_datacenter_id(),
            self.datacenter_id_shift(),
        );
        let worker_id = shl(worker_id & self.max_worker_id(), self.worker_id_shift());
        let sequence = sequence & self.sequence_mask();

        (timestamp | datacenter_id | worker_id | sequence) as i64
    }

    /// Splits a raw id back into its fields.
    ///
    /// `epoch_ms` is added back onto the timestamp field so the returned
    /// [`IdParts::timestamp_ms`] is milliseconds since the Unix epoch. The
    /// sum saturates at `u64::MAX` for epochs no validated config accepts.
    pub const fn decompose(&self, raw: i64, epoch_ms: u64) -> IdParts {
        let raw = raw as u64;
        let offset = shr(raw, self.timestamp_shift()) & self.max_timestamp();
        IdParts {
            timestamp_ms: offset.saturating_add(epoch_ms),
            datacenter_id: shr(raw, self.datacenter_id_shift()) & self.max_datacenter_id(),
            worker_id: shr(raw, self.worker_id_shift()) & self.max_worker_id(),
            sequence: raw & self.sequence_mask(),
        }
    }
}

/// The decoded fields of a [`SnowflakeId`].
///
/// [`SnowflakeId`]: crate::SnowflakeId
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdParts {
    /// Milliseconds since the Unix epoch at which the id was issued.
    pub timestamp_ms: u64,
    pub datacenter_id: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

impl fmt::Display for IdParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp_ms={} datacenter_id={} worker_id={} sequence={}",
            self.timestamp_ms, self.datacenter_id, self.worker_id, self.sequence
        )
    }
}

const fn mask(bits: u32) -> u64 {
    if bits == 0 {
        0
    } else if bits >= u64::BITS {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

// Layouts reaching compose/decompose are not necessarily validated.
const fn shl(value: u64, shift: u32) -> u64 {
    if shift >= u64::BITS { 0 } else { value << shift }
}

const fn shr(value: u64, shift: u32) -> u64 {
    if shift >= u64::BITS { 0 } else { value >> shift }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twitter_layout_shifts_and_masks() {
        let layout = BitLayout::TWITTER;
        assert!(layout.validate().is_ok());
        assert_eq!(layout.configured_bits(), 22);
        assert_eq!(layout.timestamp_bits(), 41);
        assert_eq!(layout.sequence_mask(), 4095);
        assert_eq!(layout.max_worker_id(), 31);
        assert_eq!(layout.max_datacenter_id(), 31);
        assert_eq!(layout.max_timestamp(), (1 << 41) - 1);
        assert_eq!(layout.worker_id_shift(), 12);
        assert_eq!(layout.datacenter_id_shift(), 17);
        assert_eq!(layout.timestamp_shift(), 22);
    }

    #[test]
    fn layout_without_timestamp_bits_is_rejected() {
        let layout = BitLayout::new(20, 20, 23);
        assert_eq!(layout.timestamp_bits(), 0);
        assert_eq!(
            layout.validate(),
            Err(Error::LayoutTooWide { total_bits: 63 })
        );

        let absurd = BitLayout::new(u32::MAX, 1, 0);
        assert_eq!(absurd.timestamp_bits(), 0);
        assert!(absurd.validate().is_err());

        let narrowest = BitLayout::new(20, 20, 22);
        assert!(narrowest.validate().is_ok());
        assert_eq!(narrowest.timestamp_bits(), 1);
        assert_eq!(narrowest.max_timestamp(), 1);
    }

    #[test]
    fn timestamp_takes_the_bits_left_over() {
        let layout = BitLayout::new(2, 8, 12);
        assert_eq!(layout.timestamp_bits(), 41);
        assert_eq!(layout.timestamp_shift(), 22);

        let layout = BitLayout::new(0, 10, 0);
        assert_eq!(layout.timestamp_bits(), 53);
        assert_eq!(layout.max_timestamp(), (1 << 53) - 1);
    }

    #[test]
    fn compose_places_fields_at_their_shifts() {
        let layout = BitLayout::TWITTER;
        let raw = layout.compose(1, 3, 5, 7);
        assert_eq!(raw, (1 << 22) | (3 << 17) | (5 << 12) | 7);
    }

    #[test]
    fn compose_never_sets_the_sign_bit() {
        let layout = BitLayout::TWITTER;
        let raw = layout.compose(
            layout.max_timestamp(),
            layout.max_datacenter_id(),
            layout.max_worker_id(),
            layout.sequence_mask(),
        );
        assert_eq!(raw, i64::MAX);
    }

    #[test]
    fn decompose_recovers_fields_and_adds_epoch() {
        let layout = BitLayout::TWITTER;
        let raw = layout.compose(1_000, 3, 5, 4095);
        let parts = layout.decompose(raw, 1_288_834_974_657);
        assert_eq!(
            parts,
            IdParts {
                timestamp_ms: 1_288_834_975_657,
                datacenter_id: 3,
                worker_id: 5,
                sequence: 4095,
            }
        );
    }

    #[test]
    fn decompose_saturates_instead_of_overflowing_a_huge_epoch() {
        let layout = BitLayout::TWITTER;
        let parts = layout.decompose(1 << 22, u64::MAX);
        assert_eq!(parts.timestamp_ms, u64::MAX);
        assert_eq!(parts.sequence, 0);
    }

    #[test]
    fn zero_width_fields_encode_nothing() {
        let layout = BitLayout::new(0, 0, 12);
        assert!(layout.validate().is_ok());
        assert_eq!(layout.max_worker_id(), 0);
        assert_eq!(layout.max_datacenter_id(), 0);
        assert_eq!(layout.timestamp_shift(), 12);

        let raw = layout.compose(9, 0, 0, 2);
        let parts = layout.decompose(raw, 0);
        assert_eq!(parts.timestamp_ms, 9);
        assert_eq!(parts.sequence, 2);
        assert_eq!(parts.worker_id, 0);
        assert_eq!(parts.datacenter_id, 0);
    }

    #[test]
    fn id_parts_display() {
        let parts = IdParts {
            timestamp_ms: 10,
            datacenter_id: 1,
            worker_id: 2,
            sequence: 3,
        };
        assert_eq!(
            parts.to_string(),
            "timestamp_ms=10 datacenter_id=1 worker_id=2 sequence=3"
        );
    }
}
