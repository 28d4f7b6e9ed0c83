//! Sizing configuration for the hash tables and the positive-int set.

use crate::error::{Error, Result};

/// Load factor used when none is given.
pub const DEFAULT_LOAD_FACTOR: f32 = 0.66;

/// Smallest table capacity; every table is a power of two at least this big.
pub const MIN_CAPACITY: usize = 16;

/// Removal-triggered rebalancing never shrinks a table at or below this.
pub const MIN_CAPACITY_SHRINK: usize = 64;

/// Number of entries a table made with `new()` holds before expanding.
pub const DEFAULT_SIZE_BEFORE_EXPANSION: usize = 10;

/// How big a hash table starts and how full it may get.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableConfig {
    /// Entries that fit before the first expansion.
    pub size_before_expansion: usize,
    /// Fraction of slots that may be occupied (tombstones included)
    /// before the table grows.
    pub load_factor: f32,
}

impl TableConfig {
    pub fn new(size_before_expansion: usize) -> Self {
        Self {
            size_before_expansion,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }

    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.load_factor > 0.0 && self.load_factor < 1.0) {
            return Err(Error::InvalidLoadFactor(self.load_factor));
        }
        Ok(())
    }

    /// Capacity of the initial table.
    pub fn initial_capacity(&self) -> usize {
        crate::hashing::table_space(self.size_before_expansion, self.load_factor)
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_BEFORE_EXPANSION)
    }
}

/// Cost-model knobs for [`PositiveIntSet`](crate::PositiveIntSet)
/// representation switching.
///
/// These are tuning values, not correctness constraints. Any setting keeps
/// the refusal to switch back and forth near a break-even point, because a
/// switch away from the current representation must save at least
/// `hysteresis` words.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwitchPolicy {
    /// Words an alternative must save before a switch happens.
    pub hysteresis: usize,
    /// Extra bits allocated past the largest key when a bit set is made.
    pub bit_set_overallocate: usize,
    /// A hash set made from another representation is sized for
    /// `n + (n >> shift)` entries.
    pub hash_set_overallocate_shift: u32,
    /// Largest element count kept in the linear-scan tiny set.
    pub tiny_set_max_size: usize,
}

impl Default for SwitchPolicy {
    fn default() -> Self {
        Self {
            hysteresis: 16,
            bit_set_overallocate: 64 * 4,
            hash_set_overallocate_shift: 1,
            tiny_set_max_size: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = TableConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.initial_capacity(), MIN_CAPACITY);
    }

    #[test]
    fn load_factor_bounds_are_checked() {
        for lf in [0.0f32, 1.0, -0.5, 1.5, f32::NAN] {
            let c = TableConfig::new(10).with_load_factor(lf);
            assert!(matches!(c.validate(), Err(Error::InvalidLoadFactor(_))));
        }
        assert!(TableConfig::new(10).with_load_factor(0.5).validate().is_ok());
    }

    #[test]
    fn initial_capacity_holds_requested_size() {
        let c = TableConfig::new(1000);
        let cap = c.initial_capacity();
        assert!(cap.is_power_of_two());
        assert!((cap as f32 * c.load_factor) as usize >= 1000);
    }
}
