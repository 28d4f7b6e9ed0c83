//! Int-to-int hash map where 0 doubles as "no value".

use crate::config::TableConfig;
use crate::cursor::IntPositions;
use crate::error::Result;
use crate::int_map_core::{check_map_key, IntMapCore};
use crate::snapshot::ReadOnly;

/// Maps non-zero int keys (other than `i32::MIN`) to ints.
///
/// `get` of a missing key returns 0, like a default-valued array, so a
/// stored 0 and an absent key read the same; use
/// [`contains_key`](Self::contains_key) to tell them apart.
#[derive(Clone, Debug)]
pub struct Int2IntHashMap {
    core: IntMapCore<i32>,
}

impl Default for Int2IntHashMap {
    fn default() -> Self {
        Self::new()
    }
}

impl Int2IntHashMap {
    pub fn new() -> Self {
        Self::with_size(crate::config::DEFAULT_SIZE_BEFORE_EXPANSION)
    }

    pub fn with_size(size_before_expansion: usize) -> Self {
        Int2IntHashMap {
            core: IntMapCore::new(&TableConfig::new(size_before_expansion)),
        }
    }

    pub fn with_config(config: &TableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Int2IntHashMap {
            core: IntMapCore::new(config),
        })
    }

    /// Stores `value` under `key`; returns the previous value, or 0.
    pub fn put(&mut self, key: i32, value: i32) -> Result<i32> {
        check_map_key(key)?;
        Ok(self.core.insert(key, value).unwrap_or(0))
    }

    /// Adds `delta` to the value under `key` (0 if absent) and returns the
    /// new value.
    pub fn add_to(&mut self, key: i32, delta: i32) -> Result<i32> {
        check_map_key(key)?;
        match self.core.find(key) {
            Some(pos) => {
                let v = self.core.value_at_mut(pos);
                *v = v.wrapping_add(delta);
                Ok(*v)
            }
            None => {
                self.core.insert_new(key, delta);
                Ok(delta)
            }
        }
    }

    pub fn get(&self, key: i32) -> i32 {
        self.core.find(key).map_or(0, |p| *self.core.value_at(p))
    }

    pub fn contains_key(&self, key: i32) -> bool {
        self.core.find(key).is_some()
    }

    /// Removes `key`; returns its value, or 0 if absent.
    pub fn remove(&mut self, key: i32) -> Result<i32> {
        check_map_key(key)?;
        Ok(self.core.remove(key).unwrap_or(0))
    }

    pub fn clear(&mut self) {
        self.core.clear();
    }

    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    pub fn sorted_keys(&self) -> Vec<i32> {
        self.core.sorted_keys()
    }

    /// `(key, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.core
            .live_positions()
            .map(move |p| (self.core.key_at(p), *self.core.value_at(p)))
    }

    pub fn snapshot(&self) -> ReadOnly<Self> {
        ReadOnly::new(self.clone())
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.core.check_invariants()
    }
}

/// Positions walk the keys.
impl IntPositions for Int2IntHashMap {
    fn move_to_first(&self) -> Option<usize> {
        self.core.first()
    }

    fn move_to_last(&self) -> Option<usize> {
        self.core.last()
    }

    fn move_to_next(&self, pos: usize) -> Option<usize> {
        self.core.next_after(pos)
    }

    fn move_to_previous(&self, pos: usize) -> Option<usize> {
        self.core.previous_before(pos)
    }

    fn key_at(&self, pos: usize) -> Result<i32> {
        self.core.checked_key_at(pos)
    }
}
