//! Int-keyed map storage shared by the int-to-int and int-to-object maps.

use crate::config::TableConfig;
use crate::cursor::{next_live, previous_live};
use crate::error::{check_non_zero, Error, Result};
use crate::hashing::hash_int;
use crate::linear_probe::{find_position, LinearProbe, Probe, ProbeTable};
use core::mem;

pub(crate) const REMOVED_KEY: i32 = i32::MIN;

/// Rejects the empty and removed markers.
pub(crate) fn check_map_key(key: i32) -> Result<()> {
    check_non_zero(key)?;
    if key == REMOVED_KEY {
        return Err(Error::ReservedKey(key));
    }
    Ok(())
}

/// Parallel key and value slots.
#[derive(Clone, Debug)]
pub(crate) struct IntMapTable<V> {
    keys: Vec<i32>,
    values: Vec<V>,
}

fn default_values<V: Default>(capacity: usize) -> Vec<V> {
    (0..capacity).map(|_| V::default()).collect()
}

impl<V: Default> IntMapTable<V> {
    fn with_capacity(capacity: usize) -> Self {
        IntMapTable {
            keys: vec![0; capacity],
            values: default_values(capacity),
        }
    }

    #[inline]
    fn probe(&self, key: i32) -> Probe {
        let keys = &self.keys;
        find_position(
            keys.len(),
            hash_int(key),
            |p| keys[p] == 0 || keys[p] == key,
            |p| keys[p] == REMOVED_KEY,
        )
    }
}

#[inline]
fn live_key(k: i32) -> bool {
    k != 0 && k != REMOVED_KEY
}

impl<V: Default> ProbeTable for IntMapTable<V> {
    type Slots = (Vec<i32>, Vec<V>);

    fn capacity(&self) -> usize {
        self.keys.len()
    }

    fn is_live(&self, pos: usize) -> bool {
        live_key(self.keys[pos])
    }

    fn install_slots(&mut self, capacity: usize) -> Self::Slots {
        (
            mem::replace(&mut self.keys, vec![0; capacity]),
            mem::replace(&mut self.values, default_values(capacity)),
        )
    }

    fn clear_slots(&mut self) {
        self.keys.fill(0);
        self.values.iter_mut().for_each(|v| *v = V::default());
    }

    fn old_len(old: &Self::Slots) -> usize {
        old.0.len()
    }

    fn old_is_live(old: &Self::Slots, pos: usize) -> bool {
        live_key(old.0[pos])
    }

    fn move_from_old(&mut self, old: &mut Self::Slots, pos: usize) {
        let key = old.0[pos];
        let at = self.probe(key).pos;
        self.keys[at] = key;
        self.values[at] = mem::take(&mut old.1[pos]);
    }
}

/// Linear-probe map from non-zero int keys to `V` slots. Keys are assumed
/// validated by the public wrapper.
#[derive(Clone, Debug)]
pub(crate) struct IntMapCore<V> {
    probe: LinearProbe,
    table: IntMapTable<V>,
}

impl<V: Default> IntMapCore<V> {
    pub fn new(config: &TableConfig) -> Self {
        let probe = LinearProbe::new(config);
        let table = IntMapTable::with_capacity(probe.initial_capacity());
        IntMapCore { probe, table }
    }

    #[inline]
    pub fn find(&self, key: i32) -> Option<usize> {
        if !live_key(key) {
            return None;
        }
        let pos = self.table.probe(key).pos;
        (self.table.keys[pos] == key).then_some(pos)
    }

    /// Stores `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: i32, value: V) -> Option<V> {
        debug_assert!(live_key(key));
        let probe = self.table.probe(key);
        if self.table.keys[probe.pos] == key {
            return Some(mem::replace(&mut self.table.values[probe.pos], value));
        }
        let at = probe.insert_pos();
        self.table.keys[at] = key;
        self.table.values[at] = value;
        self.probe.added(&mut self.table, &probe);
        None
    }

    /// Inserts a key known to be absent and returns where it ended up,
    /// after any resize the insert caused.
    pub fn insert_new(&mut self, key: i32, value: V) -> usize {
        let replaced = self.insert(key, value);
        debug_assert!(replaced.is_none());
        self.table.probe(key).pos
    }

    pub fn remove(&mut self, key: i32) -> Option<V> {
        let pos = self.find(key)?;
        self.table.keys[pos] = REMOVED_KEY;
        let value = mem::take(&mut self.table.values[pos]);
        self.probe.removed_one(&mut self.table);
        Some(value)
    }

    pub fn clear(&mut self) {
        self.probe.clear(&mut self.table);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.probe.size()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.table.keys.len()
    }

    #[inline]
    pub fn is_live(&self, pos: usize) -> bool {
        live_key(self.table.keys[pos])
    }

    #[inline]
    pub fn key_at(&self, pos: usize) -> i32 {
        self.table.keys[pos]
    }

    #[inline]
    pub fn value_at(&self, pos: usize) -> &V {
        &self.table.values[pos]
    }

    #[inline]
    pub fn value_at_mut(&mut self, pos: usize) -> &mut V {
        &mut self.table.values[pos]
    }

    pub fn live_positions(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.capacity()).filter(move |&p| self.is_live(p))
    }

    pub fn first(&self) -> Option<usize> {
        next_live(self.capacity(), 0, |p| self.is_live(p))
    }

    pub fn last(&self) -> Option<usize> {
        previous_live(self.capacity(), |p| self.is_live(p))
    }

    pub fn next_after(&self, pos: usize) -> Option<usize> {
        next_live(self.capacity(), pos + 1, |p| self.is_live(p))
    }

    pub fn previous_before(&self, pos: usize) -> Option<usize> {
        previous_live(pos.min(self.capacity()), |p| self.is_live(p))
    }

    pub fn checked_key_at(&self, pos: usize) -> Result<i32> {
        if pos < self.capacity() && self.is_live(pos) {
            Ok(self.key_at(pos))
        } else {
            Err(Error::NoSuchElement)
        }
    }

    pub fn sorted_keys(&self) -> Vec<i32> {
        let mut keys: Vec<i32> = self.live_positions().map(|p| self.key_at(p)).collect();
        keys.sort_unstable();
        keys
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.probe.check_invariants(&self.table)?;
        for pos in self.live_positions() {
            let key = self.key_at(pos);
            if self.find(key) != Some(pos) {
                return Err(Error::Internal(format!(
                    "key {key} at slot {pos} is not found by lookup"
                )));
            }
        }
        Ok(())
    }
}
