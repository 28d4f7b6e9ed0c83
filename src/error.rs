//! Error type shared by every table in the crate.

/// Errors raised by table operations.
///
/// Caller misuse (`ZeroKey`, `ReservedKey`, `NotPositive`,
/// `InvalidEstimate`, `InvalidLoadFactor`) is reported before any slot is
/// written, so a failed call leaves the structure unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Zero marks an empty slot and can never be stored.
    #[error("0 is an invalid key")]
    ZeroKey,

    /// The value is used internally as the removed-slot marker.
    #[error("{0} is reserved as the removed-slot marker and is an invalid key")]
    ReservedKey(i32),

    /// Positive int sets only hold keys greater than zero.
    #[error("{0} is not a positive key")]
    NotPositive(i32),

    /// A bit set holds no keys below its offset.
    #[error("key {key} is below the bit set offset {offset}")]
    BelowOffset { key: i32, offset: i32 },

    /// A size estimate was malformed.
    #[error(
        "invalid size estimate: initial size {initial_size}, \
    estimated min {est_min}, estimated max {est_max}"
    )]
    InvalidEstimate {
        initial_size: i32,
        est_min: i32,
        est_max: i32,
    },

    /// Load factors must lie strictly between 0 and 1.
    #[error("load factor {0} must be greater than 0 and less than 1")]
    InvalidLoadFactor(f32),

    /// A cursor moved past either end, or a position held no element.
    #[error("no such element")]
    NoSuchElement,

    /// An internal table invariant was found broken. This is a bug in the
    /// crate, never caller misuse.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Rejects the empty-slot marker.
#[inline]
pub(crate) fn check_non_zero(key: i32) -> Result<()> {
    if key == 0 {
        return Err(Error::ZeroKey);
    }
    Ok(())
}
