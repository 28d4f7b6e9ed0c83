//! Dual-width key slots shared by the int hash sets.
//!
//! While every key lies within a signed-short window around `offset`, keys
//! are stored as `i16` (half the memory). The stored short is the key minus
//! the offset, moved one further from zero when not positive, so the
//! stored value is never 0 (the empty marker) and never `i16::MIN`. A key
//! outside the window switches the table to `i32` slots for good.

use crate::hashing::hash_int;

/// Offset value that forces `i32` slots from the start.
pub const FORCE_INT_OFFSET: i32 = i32::MIN;

/// Tables at or above this capacity always use `i32` slots: a short table
/// could never fill that many slots with distinct keys.
pub(crate) const SHORT_CAPACITY_LIMIT: usize = 65536;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum IntKeys {
    Short(Vec<i16>),
    Int(Vec<i32>),
}

impl IntKeys {
    pub fn new(capacity: usize, short: bool) -> Self {
        if short {
            IntKeys::Short(vec![0; capacity])
        } else {
            IntKeys::Int(vec![0; capacity])
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self {
            IntKeys::Short(k) => k.len(),
            IntKeys::Int(k) => k.len(),
        }
    }

    #[inline]
    pub fn is_short(&self) -> bool {
        matches!(self, IntKeys::Short(_))
    }

    pub fn clear(&mut self) {
        match self {
            IntKeys::Short(k) => k.fill(0),
            IntKeys::Int(k) => k.fill(0),
        }
    }

    /// Stored slot value widened to `i32`; 0 for an empty slot.
    #[inline]
    pub fn stored(&self, pos: usize) -> i32 {
        match self {
            IntKeys::Short(k) => k[pos] as i32,
            IntKeys::Int(k) => k[pos],
        }
    }

    /// Writes a stored value; for short slots it must fit in `i16`.
    #[inline]
    pub fn set(&mut self, pos: usize, stored: i32) {
        match self {
            IntKeys::Short(k) => {
                debug_assert!(i16::try_from(stored).is_ok());
                k[pos] = stored as i16;
            }
            IntKeys::Int(k) => k[pos] = stored,
        }
    }

    /// Heap words (32-bit) the slots take.
    pub fn space_used_in_words(&self) -> usize {
        match self {
            IntKeys::Short(k) => k.len() >> 1,
            IntKeys::Int(k) => k.len(),
        }
    }
}

/// Offset-adjusted form of `raw`, before the short range check.
#[inline]
pub(crate) fn adjust(raw: i32, offset: i32) -> i64 {
    let adj = raw as i64 - offset as i64;
    if adj <= 0 {
        adj - 1
    } else {
        adj
    }
}

/// The short to store for `raw`, or `None` if it is outside the window.
#[inline]
pub(crate) fn to_short(raw: i32, offset: i32) -> Option<i16> {
    let adj = adjust(raw, offset);
    if adj > i16::MAX as i64 || adj <= i16::MIN as i64 {
        None
    } else {
        Some(adj as i16)
    }
}

/// The key a stored short stands for.
#[inline]
pub(crate) fn from_short(adj: i16, offset: i32) -> i32 {
    let adj = adj as i64;
    let raw = adj + offset as i64 + if adj < 0 { 1 } else { 0 };
    raw as i32
}

/// Hash of a stored value. Shorts hash their adjusted form, so a table's
/// probe order does not depend on the offset.
#[inline]
pub(crate) fn hash_stored(stored: i32) -> u32 {
    hash_int(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_encoding_skips_zero_and_min() {
        for offset in [0, 100, -5000, 1_000_000] {
            for raw in [offset - 32766, offset - 1, offset, offset + 1, offset + 32767] {
                let s = to_short(raw, offset).unwrap();
                assert_ne!(s, 0);
                assert_ne!(s, i16::MIN);
                assert_eq!(from_short(s, offset), raw);
            }
        }
    }

    #[test]
    fn window_edges() {
        assert_eq!(to_short(32767, 0), Some(32767));
        assert_eq!(to_short(32768, 0), None);
        // raw == offset maps to -1, so the low edge sits one lower
        assert_eq!(to_short(-32766, 0), Some(-32767));
        assert_eq!(to_short(-32767, 0), None);
    }

    #[test]
    fn extreme_offsets_do_not_overflow() {
        assert_eq!(to_short(i32::MAX, i32::MIN), None);
        assert_eq!(to_short(1, FORCE_INT_OFFSET), None);
    }

    #[test]
    fn space_is_halved_for_shorts() {
        assert_eq!(IntKeys::new(64, true).space_used_in_words(), 32);
        assert_eq!(IntKeys::new(64, false).space_used_in_words(), 64);
    }
}
