//! Int hash set on the robin-hood engine.

use crate::config::TableConfig;
use crate::cursor::{next_live, previous_live, IntPositions};
use crate::error::{check_non_zero, Error, Result};
use crate::int_keys::{
    from_short, hash_stored, to_short, IntKeys, FORCE_INT_OFFSET, SHORT_CAPACITY_LIMIT,
};
use crate::robin_hood::{Cleared, RhProbe, RobinHood, LHB_EMPTY};
use crate::snapshot::ReadOnly;
use core::mem;
use log::debug;

/// A set of non-zero ints with no tombstones.
///
/// Slot emptiness lives in the engine's hash-byte array, so every non-zero
/// `i32` is a valid key, `i32::MIN` included. Keys use `i16` slots relative
/// to an offset until one falls outside the short window or the table
/// reaches 65536 slots; the switch to `i32` slots is one-way.
#[derive(Clone, Debug)]
pub struct IntHashSetRh {
    rh: RobinHood,
    keys: IntKeys,
    offset: i32,
    most_positive: i32,
    most_negative: i32,
}

impl Default for IntHashSetRh {
    fn default() -> Self {
        Self::new()
    }
}

impl IntHashSetRh {
    pub fn new() -> Self {
        Self::build(&TableConfig::default(), 0)
    }

    pub fn with_size(size_before_expansion: usize) -> Self {
        Self::build(&TableConfig::new(size_before_expansion), 0)
    }

    pub fn with_offset(size_before_expansion: usize, offset: i32) -> Self {
        Self::build(&TableConfig::new(size_before_expansion), offset)
    }

    pub fn with_config(config: &TableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, 0))
    }

    pub fn with_config_and_offset(config: &TableConfig, offset: i32) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, offset))
    }

    fn build(config: &TableConfig, offset: i32) -> Self {
        let rh = RobinHood::new(config);
        let capacity = rh.capacity();
        let short = offset != FORCE_INT_OFFSET && capacity < SHORT_CAPACITY_LIMIT;
        IntHashSetRh {
            rh,
            keys: IntKeys::new(capacity, short),
            offset,
            most_positive: i32::MIN,
            most_negative: i32::MAX,
        }
    }

    #[inline]
    fn stored_form(&self, raw: i32) -> Option<i32> {
        match self.keys {
            IntKeys::Short(_) => to_short(raw, self.offset).map(i32::from),
            IntKeys::Int(_) => Some(raw),
        }
    }

    #[inline]
    fn raw_at(&self, pos: usize) -> i32 {
        match &self.keys {
            IntKeys::Short(k) => from_short(k[pos], self.offset),
            IntKeys::Int(k) => k[pos],
        }
    }

    #[inline]
    fn probe(&self, stored: i32, hash: u32) -> RhProbe {
        let keys = &self.keys;
        self.rh.find_position(hash, |p| keys.stored(p) == stored)
    }

    fn insert_stored(&mut self, pos: usize, stored: i32, hash: u32) {
        match &mut self.keys {
            IntKeys::Short(k) => self.rh.insert_at(k, pos, stored as i16, hash),
            IntKeys::Int(k) => self.rh.insert_at(k, pos, stored, hash),
        }
    }

    /// Adds `key`. Returns `Ok(false)` if it was already present.
    pub fn add(&mut self, key: i32) -> Result<bool> {
        check_non_zero(key)?;
        let stored = match self.stored_form(key) {
            Some(s) => s,
            None => {
                self.switch_to_4_byte();
                key
            }
        };
        let hash = hash_stored(stored);
        let probe = self.probe(stored, hash);
        if probe.found {
            return Ok(false);
        }
        self.insert_stored(probe.pos, stored, hash);
        if self.rh.added() {
            self.expand_table();
        }
        if key > self.most_positive {
            self.most_positive = key;
        }
        if key < self.most_negative {
            self.most_negative = key;
        }
        Ok(true)
    }

    /// Removes `key`. Returns `Ok(false)` if it was absent.
    pub fn remove(&mut self, key: i32) -> Result<bool> {
        check_non_zero(key)?;
        let Some(pos) = self.find(key) else {
            return Ok(false);
        };
        match &mut self.keys {
            IntKeys::Short(k) => {
                self.rh.remove_at(k, pos);
            }
            IntKeys::Int(k) => {
                self.rh.remove_at(k, pos);
            }
        }
        if key == self.most_positive {
            self.most_positive = self.most_positive.saturating_sub(1);
        }
        if key == self.most_negative {
            self.most_negative = self.most_negative.saturating_add(1);
        }
        Ok(true)
    }

    pub fn contains(&self, key: i32) -> bool {
        self.find(key).is_some()
    }

    /// Slot holding `key`.
    pub fn find(&self, key: i32) -> Option<usize> {
        if key == 0 {
            return None;
        }
        let stored = self.stored_form(key)?;
        let probe = self.probe(stored, hash_stored(stored));
        probe.found.then_some(probe.pos)
    }

    fn expand_table(&mut self) {
        let new_capacity = self.capacity() * 2;
        let short = self.keys.is_short() && new_capacity < SHORT_CAPACITY_LIMIT;
        if self.keys.is_short() && !short {
            debug!("robin-hood int set reached capacity {new_capacity}, switching to 4-byte keys");
        }
        self.rebuild(new_capacity, short);
    }

    fn switch_to_4_byte(&mut self) {
        debug!(
            "robin-hood int set switching to 4-byte keys (size {}, capacity {})",
            self.len(),
            self.capacity()
        );
        let capacity = self.capacity();
        self.rebuild(capacity, false);
    }

    fn rebuild(&mut self, capacity: usize, short: bool) {
        let old_lhb = self.rh.new_table(capacity);
        let old_keys = mem::replace(&mut self.keys, IntKeys::new(self.rh.capacity(), short));
        for (pos, &b) in old_lhb.iter().enumerate() {
            if b == LHB_EMPTY {
                continue;
            }
            let stored = match (&old_keys, short) {
                (IntKeys::Short(o), false) => from_short(o[pos], self.offset),
                _ => old_keys.stored(pos),
            };
            let hash = hash_stored(stored);
            let at = self.rh.find_position_new(hash);
            self.insert_stored(at, stored, hash);
        }
    }

    pub fn clear(&mut self) {
        match self.rh.clear() {
            Cleared::InPlace => self.keys.clear(),
            Cleared::Resized(capacity) => {
                self.keys = IntKeys::new(capacity, self.keys.is_short());
            }
        }
        self.most_positive = i32::MIN;
        self.most_negative = i32::MAX;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rh.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rh.size() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.rh.capacity()
    }

    pub fn is_short_hash_set(&self) -> bool {
        self.keys.is_short()
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn most_positive(&self) -> i32 {
        self.most_positive
    }

    pub fn most_negative(&self) -> i32 {
        self.most_negative
    }

    pub fn wont_expand(&self, n: usize) -> bool {
        self.rh.wont_expand(n)
    }

    /// Words the key slots and hash bytes take.
    pub fn space_used_in_words(&self) -> usize {
        self.keys.space_used_in_words() + (self.capacity() >> 2)
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.capacity())
            .filter(move |&p| self.rh.is_live(p))
            .map(move |p| self.raw_at(p))
    }

    pub fn to_int_array(&self) -> Vec<i32> {
        self.iter().collect()
    }

    pub fn bulk_add_to(&self, out: &mut Vec<i32>) {
        out.extend(self.iter());
    }

    pub fn snapshot(&self) -> ReadOnly<Self> {
        ReadOnly::new(self.clone())
    }

    /// Checks every slot's recorded probe distance against the distance a
    /// lookup actually walks, and the element bounds.
    pub fn check_invariants(&self) -> Result<()> {
        self.rh
            .check_invariants(|p| hash_stored(self.keys.stored(p)))?;
        for key in self.iter() {
            if key > self.most_positive || key < self.most_negative {
                return Err(Error::Internal(format!(
                    "key {key} is outside the bounds [{}, {}]",
                    self.most_negative, self.most_positive
                )));
            }
        }
        Ok(())
    }
}

impl IntPositions for IntHashSetRh {
    fn move_to_first(&self) -> Option<usize> {
        next_live(self.capacity(), 0, |p| self.rh.is_live(p))
    }

    fn move_to_last(&self) -> Option<usize> {
        previous_live(self.capacity(), |p| self.rh.is_live(p))
    }

    fn move_to_next(&self, pos: usize) -> Option<usize> {
        next_live(self.capacity(), pos + 1, |p| self.rh.is_live(p))
    }

    fn move_to_previous(&self, pos: usize) -> Option<usize> {
        previous_live(pos.min(self.capacity()), |p| self.rh.is_live(p))
    }

    fn key_at(&self, pos: usize) -> Result<i32> {
        if pos < self.capacity() && self.rh.is_live(pos) {
            Ok(self.raw_at(pos))
        } else {
            Err(Error::NoSuchElement)
        }
    }
}
