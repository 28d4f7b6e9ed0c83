//! Int-to-object hash map.

use crate::config::TableConfig;
use crate::cursor::IntPositions;
use crate::error::Result;
use crate::int_map_core::{check_map_key, IntMapCore};
use crate::snapshot::ReadOnly;

/// Maps non-zero int keys (other than `i32::MIN`) to values of `V`.
#[derive(Clone, Debug)]
pub struct Int2ObjHashMap<V> {
    core: IntMapCore<Option<V>>,
}

impl<V> Default for Int2ObjHashMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Int2ObjHashMap<V> {
    pub fn new() -> Self {
        Self::with_size(crate::config::DEFAULT_SIZE_BEFORE_EXPANSION)
    }

    pub fn with_size(size_before_expansion: usize) -> Self {
        Int2ObjHashMap {
            core: IntMapCore::new(&TableConfig::new(size_before_expansion)),
        }
    }

    pub fn with_config(config: &TableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Int2ObjHashMap {
            core: IntMapCore::new(config),
        })
    }

    /// Stores `value` under `key`; returns the value it replaced.
    pub fn put(&mut self, key: i32, value: V) -> Result<Option<V>> {
        check_map_key(key)?;
        Ok(self.core.insert(key, Some(value)).flatten())
    }

    /// Stores `value` only if `key` is absent. Returns the existing value
    /// when there was one (and drops `value`).
    pub fn put_if_absent(&mut self, key: i32, value: V) -> Result<Option<&V>> {
        check_map_key(key)?;
        if let Some(pos) = self.core.find(key) {
            return Ok(self.core.value_at(pos).as_ref());
        }
        self.core.insert_new(key, Some(value));
        Ok(None)
    }

    /// The value under `key`, made by `make` first if absent.
    pub fn compute_if_absent(&mut self, key: i32, make: impl FnOnce(i32) -> V) -> Result<&mut V> {
        check_map_key(key)?;
        let pos = match self.core.find(key) {
            Some(pos) => pos,
            None => self.core.insert_new(key, Some(make(key))),
        };
        // live slots always hold a value
        self.core
            .value_at_mut(pos)
            .as_mut()
            .ok_or_else(|| crate::error::Error::Internal(format!("slot {pos} has no value")))
    }

    pub fn get(&self, key: i32) -> Option<&V> {
        let pos = self.core.find(key)?;
        self.core.value_at(pos).as_ref()
    }

    pub fn get_mut(&mut self, key: i32) -> Option<&mut V> {
        let pos = self.core.find(key)?;
        self.core.value_at_mut(pos).as_mut()
    }

    pub fn contains_key(&self, key: i32) -> bool {
        self.core.find(key).is_some()
    }

    pub fn remove(&mut self, key: i32) -> Result<Option<V>> {
        check_map_key(key)?;
        Ok(self.core.remove(key).flatten())
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

    /// Values in slot order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.core
            .live_positions()
            .filter_map(move |p| self.core.value_at(p).as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &V)> + '_ {
        self.core.live_positions().filter_map(move |p| {
            self.core
                .value_at(p)
                .as_ref()
                .map(|v| (self.core.key_at(p), v))
        })
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.core.check_invariants()
    }
}

impl<V: Clone> Int2ObjHashMap<V> {
    pub fn snapshot(&self) -> ReadOnly<Self> {
        ReadOnly::new(self.clone())
    }
}

impl<V> IntPositions for Int2ObjHashMap<V> {
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
