//! Int hash set on the linear-probe engine, with short-slot compression.

use crate::config::TableConfig;
use crate::cursor::{next_live, previous_live, IntPositions};
use crate::error::{check_non_zero, Error, Result};
use crate::int_keys::{
    from_short, hash_stored, to_short, IntKeys, FORCE_INT_OFFSET, SHORT_CAPACITY_LIMIT,
};
use crate::linear_probe::{find_position, LinearProbe, Probe, ProbeTable};
use crate::snapshot::ReadOnly;
use core::mem;
use log::debug;

const REMOVED_SHORT: i32 = i16::MIN as i32;
const REMOVED_INT: i32 = i32::MIN;

/// Words of fixed overhead an int hash set carries besides its slots.
pub const SPACE_OVERHEAD_IN_WORDS: usize = 11;

#[derive(Clone, Debug)]
struct IntTable {
    keys: IntKeys,
    offset: i32,
    force_int: bool,
}

impl IntTable {
    #[inline]
    fn removed_marker(keys: &IntKeys) -> i32 {
        if keys.is_short() {
            REMOVED_SHORT
        } else {
            REMOVED_INT
        }
    }

    #[inline]
    fn live_in(keys: &IntKeys, pos: usize) -> bool {
        let s = keys.stored(pos);
        s != 0 && s != Self::removed_marker(keys)
    }

    /// Slot value for `raw`, or `None` if short slots cannot hold it.
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

    fn probe(&self, stored: i32) -> Probe {
        let keys = &self.keys;
        let removed = Self::removed_marker(keys);
        find_position(
            keys.len(),
            hash_stored(stored),
            |p| {
                let s = keys.stored(p);
                s == 0 || s == stored
            },
            |p| keys.stored(p) == removed,
        )
    }
}

impl ProbeTable for IntTable {
    type Slots = IntKeys;

    fn capacity(&self) -> usize {
        self.keys.len()
    }

    fn is_live(&self, pos: usize) -> bool {
        Self::live_in(&self.keys, pos)
    }

    fn install_slots(&mut self, capacity: usize) -> IntKeys {
        if !self.force_int && capacity >= SHORT_CAPACITY_LIMIT {
            debug!("int hash set reached capacity {capacity}, switching to 4-byte keys");
            self.force_int = true;
        }
        mem::replace(&mut self.keys, IntKeys::new(capacity, !self.force_int))
    }

    fn clear_slots(&mut self) {
        self.keys.clear();
    }

    fn old_len(old: &IntKeys) -> usize {
        old.len()
    }

    fn old_is_live(old: &IntKeys, pos: usize) -> bool {
        Self::live_in(old, pos)
    }

    fn move_from_old(&mut self, old: &mut IntKeys, pos: usize) {
        let stored = match (&*old, &self.keys) {
            (IntKeys::Short(o), IntKeys::Int(_)) => from_short(o[pos], self.offset),
            _ => old.stored(pos),
        };
        let probe = self.probe(stored);
        self.keys.set(probe.pos, stored);
    }
}

/// A set of non-zero ints other than `i32::MIN`.
///
/// Keys are kept in `i16` slots relative to an offset until a key falls
/// outside the short window or the table grows past 65535 slots; then the
/// set converts once to `i32` slots. Removes leave tombstones that the
/// engine compacts when they pile up.
///
/// `most_positive` and `most_negative` are maintained weakly: a remove of
/// the extreme only moves the bound by one, so they are bounds on the
/// elements, not exact extremes.
#[derive(Clone, Debug)]
pub struct IntHashSet {
    probe: LinearProbe,
    table: IntTable,
    most_positive: i32,
    most_negative: i32,
}

impl Default for IntHashSet {
    fn default() -> Self {
        Self::new()
    }
}

impl IntHashSet {
    pub fn new() -> Self {
        Self::build(&TableConfig::default(), 0)
    }

    pub fn with_size(size_before_expansion: usize) -> Self {
        Self::build(&TableConfig::new(size_before_expansion), 0)
    }

    /// A set whose short window is centered near `offset`.
    /// [`FORCE_INT_OFFSET`] starts with `i32` slots.
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
        let probe = LinearProbe::new(config);
        let capacity = probe.initial_capacity();
        let force_int = offset == FORCE_INT_OFFSET || capacity >= SHORT_CAPACITY_LIMIT;
        IntHashSet {
            probe,
            table: IntTable {
                keys: IntKeys::new(capacity, !force_int),
                offset,
                force_int,
            },
            most_positive: i32::MIN,
            most_negative: i32::MAX,
        }
    }

    fn check_key(key: i32) -> Result<()> {
        check_non_zero(key)?;
        if key == REMOVED_INT {
            return Err(Error::ReservedKey(key));
        }
        Ok(())
    }

    /// Adds `key`. Returns `Ok(false)` if it was already present.
    pub fn add(&mut self, key: i32) -> Result<bool> {
        Self::check_key(key)?;
        let stored = match self.table.stored_form(key) {
            Some(s) => s,
            None => {
                self.switch_to_4_byte();
                key
            }
        };
        let probe = self.table.probe(stored);
        if self.table.keys.stored(probe.pos) == stored {
            return Ok(false);
        }
        self.table.keys.set(probe.insert_pos(), stored);
        self.probe.added(&mut self.table, &probe);
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
        Self::check_key(key)?;
        let Some(stored) = self.table.stored_form(key) else {
            return Ok(false);
        };
        let probe = self.table.probe(stored);
        if self.table.keys.stored(probe.pos) != stored {
            return Ok(false);
        }
        let marker = IntTable::removed_marker(&self.table.keys);
        self.table.keys.set(probe.pos, marker);
        self.probe.removed_one(&mut self.table);
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
        if key == 0 || key == REMOVED_INT {
            return None;
        }
        let stored = self.table.stored_form(key)?;
        let pos = self.table.probe(stored).pos;
        (self.table.keys.stored(pos) == stored).then_some(pos)
    }

    fn switch_to_4_byte(&mut self) {
        debug!(
            "int hash set switching to 4-byte keys (size {}, capacity {})",
            self.probe.size(),
            self.capacity()
        );
        self.table.force_int = true;
        let capacity = self.capacity();
        self.probe.rebuild(&mut self.table, capacity);
    }

    pub fn clear(&mut self) {
        self.probe.clear(&mut self.table);
        self.most_positive = i32::MIN;
        self.most_negative = i32::MAX;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.probe.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.probe.size() == 0
    }

    /// Number of slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.keys.len()
    }

    pub fn is_short_hash_set(&self) -> bool {
        self.table.keys.is_short()
    }

    pub fn offset(&self) -> i32 {
        self.table.offset
    }

    /// Upper bound on the elements; `i32::MIN` when nothing was added.
    pub fn most_positive(&self) -> i32 {
        self.most_positive
    }

    /// Lower bound on the elements; `i32::MAX` when nothing was added.
    pub fn most_negative(&self) -> i32 {
        self.most_negative
    }

    pub fn wont_expand(&self, n: usize) -> bool {
        self.probe.wont_expand(n)
    }

    /// Words the slot array takes, without [`SPACE_OVERHEAD_IN_WORDS`].
    pub fn space_used_in_words(&self) -> usize {
        self.table.keys.space_used_in_words()
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.capacity())
            .filter(move |&p| self.table.is_live(p))
            .map(move |p| self.table.raw_at(p))
    }

    /// Elements in slot order.
    pub fn to_int_array(&self) -> Vec<i32> {
        self.iter().collect()
    }

    pub fn bulk_add_to(&self, out: &mut Vec<i32>) {
        out.extend(self.iter());
    }

    pub fn snapshot(&self) -> ReadOnly<Self> {
        ReadOnly::new(self.clone())
    }

    /// Verifies counters, capacity and that each element is found where
    /// it sits.
    pub fn check_invariants(&self) -> Result<()> {
        self.probe.check_invariants(&self.table)?;
        for pos in (0..self.capacity()).filter(|&p| self.table.is_live(p)) {
            let key = self.table.raw_at(pos);
            if self.find(key) != Some(pos) {
                return Err(Error::Internal(format!(
                    "key {key} at slot {pos} is not found by lookup"
                )));
            }
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

impl IntPositions for IntHashSet {
    fn move_to_first(&self) -> Option<usize> {
        next_live(self.capacity(), 0, |p| self.table.is_live(p))
    }

    fn move_to_last(&self) -> Option<usize> {
        previous_live(self.capacity(), |p| self.table.is_live(p))
    }

    fn move_to_next(&self, pos: usize) -> Option<usize> {
        next_live(self.capacity(), pos + 1, |p| self.table.is_live(p))
    }

    fn move_to_previous(&self, pos: usize) -> Option<usize> {
        previous_live(pos.min(self.capacity()), |p| self.table.is_live(p))
    }

    fn key_at(&self, pos: usize) -> Result<i32> {
        if pos < self.capacity() && self.table.is_live(pos) {
            Ok(self.table.raw_at(pos))
        } else {
            Err(Error::NoSuchElement)
        }
    }
}
