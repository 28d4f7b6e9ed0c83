//! Robin-hood engine: linear probing with displacement on insert and
//! backward-shift deletion.
//!
//! Besides the table's key slots, the engine keeps one byte per slot: the
//! low 7 bits of the key's hash, or `LHB_EMPTY` for an empty slot. The
//! byte marks emptiness without a sentinel key, and its difference to the
//! slot index gives the entry's distance from its ideal slot without
//! touching the key. The distance is taken modulo `min(128, capacity)`, so
//! every live distance must stay below that bound.
//!
//! Runs of occupied slots are kept ordered by ideal slot. A lookup can
//! therefore stop as soon as it meets an entry closer to home than the
//! number of probes already taken: the key, if present, would sit there.
//! Deletion pulls the rest of the run back by one slot until it meets an
//! empty slot or an entry already at home, so no tombstones exist.

use crate::config::{TableConfig, MIN_CAPACITY};
use crate::error::{Error, Result};
use crate::hashing::{expansion_threshold, next_power_of_two};
use core::mem;
use log::{debug, trace};

pub(crate) const LHB_EMPTY: u8 = 0x80;

#[inline]
pub(crate) fn lhb_of(hash: u32) -> u8 {
    (hash & 0x7f) as u8
}

/// Result of a robin-hood lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RhProbe {
    /// Slot holding the key, or the slot a missing key should take.
    pub pos: usize,
    pub found: bool,
}

/// What a clear needs the table to do with its key slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Cleared {
    /// Reset the existing slots.
    InPlace,
    /// Allocate fresh slots of this capacity.
    Resized(usize),
}

#[derive(Clone, Debug)]
pub(crate) struct RobinHood {
    load_factor: f32,
    initial_capacity: usize,
    size_which_triggers_expansion: usize,
    size: usize,
    second_time_shrinkable: bool,
    lhb: Vec<u8>,
}

impl RobinHood {
    /// `config` must already be validated.
    pub fn new(config: &TableConfig) -> Self {
        let initial_capacity = config.initial_capacity();
        Self {
            load_factor: config.load_factor,
            initial_capacity,
            size_which_triggers_expansion: expansion_threshold(
                initial_capacity,
                config.load_factor,
            ),
            size: 0,
            second_time_shrinkable: false,
            lhb: vec![LHB_EMPTY; initial_capacity],
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.lhb.len()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    #[inline]
    pub fn is_live(&self, pos: usize) -> bool {
        self.lhb[pos] != LHB_EMPTY
    }

    /// True if `n` more adds cannot trigger an expansion.
    #[inline]
    pub fn wont_expand(&self, n: usize) -> bool {
        self.size + n < self.size_which_triggers_expansion
    }

    #[inline]
    fn mask(&self) -> usize {
        self.lhb.len() - 1
    }

    /// Distance of the entry at `pos` from its ideal slot.
    #[inline]
    fn distance(&self, pos: usize) -> usize {
        let smaller_of_mask = self.lhb.len().min(128) - 1;
        pos.wrapping_sub(self.lhb[pos] as usize) & smaller_of_mask
    }

    /// Looks for a key with `hash`; `is_eq` is only asked about slots whose
    /// hash byte matches.
    #[inline]
    pub fn find_position(&self, hash: u32, mut is_eq: impl FnMut(usize) -> bool) -> RhProbe {
        let mask = self.mask();
        let lhb = lhb_of(hash);
        let mut pos = hash as usize & mask;
        let mut probes = 0;
        loop {
            let slot = self.lhb[pos];
            if slot == LHB_EMPTY || self.distance(pos) < probes {
                return RhProbe { pos, found: false };
            }
            if slot == lhb && is_eq(pos) {
                return RhProbe { pos, found: true };
            }
            probes += 1;
            pos = (pos + 1) & mask;
        }
    }

    /// Insertion slot for a key known to be absent.
    #[inline]
    pub fn find_position_new(&self, hash: u32) -> usize {
        let mask = self.mask();
        let mut pos = hash as usize & mask;
        let mut probes = 0;
        while self.lhb[pos] != LHB_EMPTY && self.distance(pos) >= probes {
            probes += 1;
            pos = (pos + 1) & mask;
        }
        pos
    }

    /// Stores `key` at `pos`, pushing the run that starts there forward by
    /// one slot. Does not count the key; see [`added`](Self::added).
    pub fn insert_at<K>(&mut self, keys: &mut [K], pos: usize, key: K, hash: u32) {
        debug_assert_eq!(keys.len(), self.lhb.len());
        let mask = self.mask();
        let mut pos = pos;
        let mut key = key;
        let mut lhb = lhb_of(hash);
        loop {
            let was_empty = self.lhb[pos] == LHB_EMPTY;
            key = mem::replace(&mut keys[pos], key);
            lhb = mem::replace(&mut self.lhb[pos], lhb);
            if was_empty {
                return;
            }
            pos = (pos + 1) & mask;
        }
    }

    /// Counts an insert. Returns true when the table must now expand.
    #[inline]
    pub fn added(&mut self) -> bool {
        self.size += 1;
        self.size >= self.size_which_triggers_expansion
    }

    /// Takes the key at `pos` out and closes the gap by backward shift.
    pub fn remove_at<K: Default>(&mut self, keys: &mut [K], pos: usize) -> K {
        debug_assert!(self.is_live(pos));
        self.size -= 1;
        let removed = mem::take(&mut keys[pos]);
        self.shift_back(keys, pos);
        removed
    }

    // keys[gap] is already default on entry
    fn shift_back<K: Default>(&mut self, keys: &mut [K], gap: usize) {
        let mask = self.mask();
        let mut prev = gap;
        loop {
            let next = (prev + 1) & mask;
            if self.lhb[next] == LHB_EMPTY || self.distance(next) == 0 {
                self.lhb[prev] = LHB_EMPTY;
                return;
            }
            self.lhb[prev] = self.lhb[next];
            keys.swap(prev, next);
            prev = next;
        }
    }

    /// Removes every entry `keep` rejects, asking about each entry once.
    /// Returns the number removed.
    ///
    /// The walk starts just past an empty slot. Backward shifts only pull
    /// entries from ahead of the walk, and never across that empty slot,
    /// so a shifted-in entry is simply examined where it lands.
    pub fn retain<K: Default>(&mut self, keys: &mut [K], mut keep: impl FnMut(&K) -> bool) -> usize {
        let capacity = self.capacity();
        let Some(start) = (0..capacity).find(|&p| self.lhb[p] == LHB_EMPTY) else {
            return 0;
        };
        let mask = self.mask();
        let mut removed = 0;
        for step in 1..=capacity {
            let pos = (start + step) & mask;
            while self.is_live(pos) && !keep(&keys[pos]) {
                self.size -= 1;
                keys[pos] = K::default();
                self.shift_back(keys, pos);
                removed += 1;
            }
        }
        removed
    }

    /// Swaps in an empty hash-byte array of at least `capacity` slots and
    /// returns the old one. The caller re-inserts every live key of the old
    /// slots with [`find_position_new`](Self::find_position_new) and
    /// [`insert_at`](Self::insert_at); the size is unchanged.
    pub fn new_table(&mut self, capacity: usize) -> Vec<u8> {
        let capacity = next_power_of_two(capacity).max(MIN_CAPACITY);
        debug!(
            "robin-hood table capacity {} -> {} (size {})",
            self.lhb.len(),
            capacity,
            self.size
        );
        self.size_which_triggers_expansion = expansion_threshold(capacity, self.load_factor);
        mem::replace(&mut self.lhb, vec![LHB_EMPTY; capacity])
    }

    /// Empties the table with the same two-step shrink as the linear-probe
    /// engine.
    pub fn clear(&mut self) -> Cleared {
        let mut result = Cleared::InPlace;
        if self.size < (self.size_which_triggers_expansion >> 1) {
            if self.second_time_shrinkable {
                self.second_time_shrinkable = false;
                let capacity = self.capacity();
                let new_capacity = self.initial_capacity.max(capacity >> 1);
                if new_capacity < capacity {
                    trace!(
                        "clear: second low-occupancy clear, shrinking {} -> {}",
                        capacity,
                        new_capacity
                    );
                    self.new_table(new_capacity);
                    result = Cleared::Resized(self.capacity());
                }
            } else {
                trace!("clear: low occupancy, shrinkable on the next clear");
                self.second_time_shrinkable = true;
            }
        } else {
            self.second_time_shrinkable = false;
        }
        if result == Cleared::InPlace {
            self.lhb.fill(LHB_EMPTY);
        }
        self.size = 0;
        result
    }

    /// Checks every live slot: its hash byte, its distance from home, and
    /// that a lookup walks exactly that distance to reach it.
    pub fn check_invariants(&self, hash_at: impl Fn(usize) -> u32) -> Result<()> {
        let capacity = self.capacity();
        if !capacity.is_power_of_two() || capacity < MIN_CAPACITY {
            return Err(Error::Internal(format!(
                "capacity {capacity} is not a power of two >= {MIN_CAPACITY}"
            )));
        }
        let mask = self.mask();
        let bound = capacity.min(128);
        let mut live = 0;
        for pos in 0..capacity {
            if !self.is_live(pos) {
                continue;
            }
            live += 1;
            let hash = hash_at(pos);
            if self.lhb[pos] != lhb_of(hash) {
                return Err(Error::Internal(format!("stale hash byte at slot {pos}")));
            }
            let actual = pos.wrapping_sub(hash as usize) & mask;
            if actual >= bound {
                return Err(Error::Internal(format!(
                    "slot {pos} is {actual} probes from home, limit is {}",
                    bound - 1
                )));
            }
            if actual != self.distance(pos) {
                return Err(Error::Internal(format!(
                    "slot {pos} records distance {} but is {actual} from home",
                    self.distance(pos)
                )));
            }
            if self.find_position(hash, |p| p == pos) != (RhProbe { pos, found: true }) {
                return Err(Error::Internal(format!(
                    "lookup for slot {pos} stops before reaching it"
                )));
            }
        }
        if live != self.size {
            return Err(Error::Internal(format!(
                "{live} live slots but size is {}",
                self.size
            )));
        }
        if self.size >= self.size_which_triggers_expansion {
            return Err(Error::Internal(format!(
                "size {} reached the expansion threshold {}",
                self.size, self.size_which_triggers_expansion
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hash_int;

    struct Table {
        rh: RobinHood,
        keys: Vec<i32>,
    }

    impl Table {
        fn new() -> Self {
            let rh = RobinHood::new(&TableConfig::default());
            let keys = vec![0; rh.capacity()];
            Table { rh, keys }
        }

        fn find(&self, key: i32) -> RhProbe {
            self.rh.find_position(hash_int(key), |p| self.keys[p] == key)
        }

        fn add(&mut self, key: i32) -> bool {
            let probe = self.find(key);
            if probe.found {
                return false;
            }
            self.rh.insert_at(&mut self.keys, probe.pos, key, hash_int(key));
            if self.rh.added() {
                let cap = self.rh.capacity() * 2;
                let old_lhb = self.rh.new_table(cap);
                let old = mem::replace(&mut self.keys, vec![0; self.rh.capacity()]);
                for (pos, &b) in old_lhb.iter().enumerate() {
                    if b != LHB_EMPTY {
                        let h = hash_int(old[pos]);
                        let at = self.rh.find_position_new(h);
                        self.rh.insert_at(&mut self.keys, at, old[pos], h);
                    }
                }
            }
            true
        }

        fn remove(&mut self, key: i32) -> bool {
            let probe = self.find(key);
            if !probe.found {
                return false;
            }
            assert_eq!(self.rh.remove_at(&mut self.keys, probe.pos), key);
            true
        }

        fn check(&self) {
            self.rh
                .check_invariants(|p| hash_int(self.keys[p]))
                .unwrap();
        }
    }

    #[test]
    fn adds_grow_and_stay_consistent() {
        let mut t = Table::new();
        for k in 1..=500 {
            assert!(t.add(k));
            assert!(!t.add(k));
        }
        t.check();
        assert_eq!(t.rh.size(), 500);
        for k in 1..=500 {
            assert!(t.find(k).found, "{k} missing");
        }
        assert!(!t.find(501).found);
    }

    #[test]
    fn backward_shift_keeps_runs_findable() {
        let mut t = Table::new();
        for k in 1..=300 {
            t.add(k);
        }
        for k in (1..=300).filter(|k| k % 3 == 0) {
            assert!(t.remove(k));
            t.check();
        }
        for k in 1..=300 {
            assert_eq!(t.find(k).found, k % 3 != 0);
        }
        // no tombstones: live slots equal size
        assert_eq!(t.rh.size(), 200);
    }

    #[test]
    fn retain_visits_each_entry_once() {
        let mut t = Table::new();
        for k in 1..=400 {
            t.add(k);
        }
        let mut seen = std::collections::HashSet::new();
        let removed = t.rh.retain(&mut t.keys, |&k| {
            assert!(seen.insert(k), "{k} examined twice");
            k % 2 == 0
        });
        assert_eq!(removed, 200);
        assert_eq!(seen.len(), 400);
        t.check();
        for k in 1..=400 {
            assert_eq!(t.find(k).found, k % 2 == 0);
        }
    }

    #[test]
    fn clear_is_hysteretic() {
        let mut t = Table::new();
        for k in 1..=200 {
            t.add(k);
        }
        let cap = t.rh.capacity();
        assert_eq!(t.rh.clear(), Cleared::InPlace);
        assert_eq!(t.rh.clear(), Cleared::InPlace);
        assert_eq!(t.rh.clear(), Cleared::Resized(cap / 2));
        assert_eq!(t.rh.size(), 0);
    }
}
