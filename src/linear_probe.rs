//! Linear-probe engine: open addressing with a growing probe step and
//! tombstones.
//!
//! The engine owns the bookkeeping (live count, tombstone count, expansion
//! threshold, shrink hysteresis) and the probe walk. Tables own the slots
//! and plug in through [`ProbeTable`], so growth, tombstone compaction and
//! shrinking are written once for int keys and object keys alike.
//!
//! Probing starts at `hash & (capacity - 1)` and advances by 1, 2, 3, ...
//! until the step reaches 13, after which it stays 13. 13 is odd and so
//! coprime with any power-of-two capacity, which guarantees every slot is
//! eventually visited. Since the threshold keeps `size + removed` below
//! capacity, an empty slot always exists and every walk terminates.

use crate::config::{TableConfig, MIN_CAPACITY, MIN_CAPACITY_SHRINK};
use crate::error::Result;
use crate::hashing::{expansion_threshold, next_power_of_two};
use log::{debug, trace};

const MAX_PROBE_DELTA: usize = 13;

/// Slot storage driven by [`LinearProbe`].
pub(crate) trait ProbeTable {
    /// The slots swapped out while a table is rebuilt.
    type Slots;

    fn capacity(&self) -> usize;

    /// True if `pos` holds a live key (neither empty nor a tombstone).
    fn is_live(&self, pos: usize) -> bool;

    /// Installs fresh empty slots of `capacity` and returns the old ones.
    fn install_slots(&mut self, capacity: usize) -> Self::Slots;

    /// Empties every slot in place.
    fn clear_slots(&mut self);

    fn old_len(old: &Self::Slots) -> usize;

    fn old_is_live(old: &Self::Slots, pos: usize) -> bool;

    /// Re-inserts the live entry at `old[pos]` into the current slots. The
    /// key is known to be absent.
    fn move_from_old(&mut self, old: &mut Self::Slots, pos: usize);
}

/// Result of a probe walk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Probe {
    /// Slot holding the key, or the first empty slot of the walk.
    pub pos: usize,
    /// First tombstone passed on the way to `pos`.
    pub first_removed: Option<usize>,
}

impl Probe {
    /// Where a missing key goes: a passed tombstone is reused first.
    #[inline]
    pub fn insert_pos(&self) -> usize {
        self.first_removed.unwrap_or(self.pos)
    }
}

/// Walks the probe sequence for `hash` until `is_eq_or_empty` accepts a
/// slot, noting the first slot `is_removed` accepts along the way.
#[inline]
pub(crate) fn find_position(
    capacity: usize,
    hash: u32,
    mut is_eq_or_empty: impl FnMut(usize) -> bool,
    mut is_removed: impl FnMut(usize) -> bool,
) -> Probe {
    debug_assert!(capacity.is_power_of_two());
    let mask = capacity - 1;
    let mut addr = hash as usize & mask;
    let mut delta = 0;
    let mut first_removed = None;
    loop {
        if is_eq_or_empty(addr) {
            return Probe {
                pos: addr,
                first_removed,
            };
        }
        if first_removed.is_none() && is_removed(addr) {
            first_removed = Some(addr);
        }
        if delta < MAX_PROBE_DELTA {
            delta += 1;
        }
        addr = (addr + delta) & mask;
    }
}

/// Size bookkeeping and resize policy for a tombstone table.
#[derive(Clone, Debug)]
pub(crate) struct LinearProbe {
    load_factor: f32,
    initial_capacity: usize,
    size_which_triggers_expansion: usize,
    size: usize,
    removed: usize,
    second_time_shrinkable: bool,
}

impl LinearProbe {
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
            removed: 0,
            second_time_shrinkable: false,
        }
    }

    #[inline]
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn removed(&self) -> usize {
        self.removed
    }

    #[inline]
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    #[inline]
    pub fn threshold(&self) -> usize {
        self.size_which_triggers_expansion
    }

    /// True if `n` more adds cannot trigger a resize.
    #[inline]
    pub fn wont_expand(&self, n: usize) -> bool {
        self.size + self.removed + n < self.size_which_triggers_expansion
    }

    /// Swaps in empty slots of at least `capacity` and returns the old ones.
    /// Counters are the caller's business.
    pub fn new_table<T: ProbeTable>(&mut self, table: &mut T, capacity: usize) -> T::Slots {
        let capacity = next_power_of_two(capacity).max(MIN_CAPACITY);
        self.size_which_triggers_expansion = expansion_threshold(capacity, self.load_factor);
        table.install_slots(capacity)
    }

    /// Records an insert into a slot found by [`find_position`].
    pub fn added<T: ProbeTable>(&mut self, table: &mut T, probe: &Probe) {
        if probe.first_removed.is_some() {
            self.removed -= 1;
        }
        self.increment_size(table);
    }

    fn increment_size<T: ProbeTable>(&mut self, table: &mut T) {
        self.size += 1;
        if self.size + self.removed >= self.size_which_triggers_expansion {
            self.maybe_increase_table_capacity(table);
        }
    }

    fn maybe_increase_table_capacity<T: ProbeTable>(&mut self, table: &mut T) {
        let old_capacity = table.capacity();
        // mostly tombstones: a same-size rebuild reclaims them
        let new_capacity = if self.removed >= self.size {
            old_capacity
        } else {
            old_capacity * 2
        };
        debug!(
            "linear-probe table capacity {} -> {} (size {}, removed {})",
            old_capacity, new_capacity, self.size, self.removed
        );
        self.rebuild(table, new_capacity);
    }

    /// Records that a live key at some slot was turned into a tombstone,
    /// then compacts tombstones if they pollute probe chains.
    pub fn removed_one<T: ProbeTable>(&mut self, table: &mut T) {
        self.removed_one_deferred();
        self.maybe_rebalance_removes(table);
    }

    /// Like [`removed_one`](Self::removed_one) but never moves slots, for
    /// removals during a slot walk. Call
    /// [`maybe_rebalance_removes`](Self::maybe_rebalance_removes) after the
    /// walk.
    pub fn removed_one_deferred(&mut self) {
        self.removed += 1;
        self.size -= 1;
    }

    /// Rebuilds when tombstones exceed half of a halved table, or when the
    /// live count has dropped enough that a halved table would do.
    pub fn maybe_rebalance_removes<T: ProbeTable>(&mut self, table: &mut T) {
        let old_capacity = table.capacity();
        if old_capacity <= MIN_CAPACITY_SHRINK {
            return;
        }
        debug_assert!(
            self.removed + self.size < self.size_which_triggers_expansion,
            "adds keep size + removed under the expansion threshold"
        );
        let mut new_capacity = old_capacity >> 1;
        let shrink_below = self.size_which_triggers_expansion >> 2;
        let half_new_capacity = new_capacity >> 1;
        if self.removed > half_new_capacity || self.size < shrink_below {
            if self.size >= shrink_below {
                new_capacity = old_capacity;
            }
            debug!(
                "linear-probe rebalance capacity {} -> {} (size {}, removed {})",
                old_capacity, new_capacity, self.size, self.removed
            );
            self.rebuild(table, new_capacity);
        }
    }

    /// Copies every live entry into fresh slots of `new_capacity`,
    /// dropping all tombstones.
    pub fn rebuild<T: ProbeTable>(&mut self, table: &mut T, new_capacity: usize) {
        let mut old = self.new_table(table, new_capacity);
        self.removed = 0;
        for pos in 0..T::old_len(&old) {
            if T::old_is_live(&old, pos) {
                table.move_from_old(&mut old, pos);
            }
        }
    }

    /// Empties the table. Shrinks by half only when two clears in a row
    /// find the table less than half as full as its expansion point, so a
    /// table whose size hovers at a boundary is not reallocated each time.
    pub fn clear<T: ProbeTable>(&mut self, table: &mut T) {
        if self.size + self.removed < (self.size_which_triggers_expansion >> 1) {
            if self.second_time_shrinkable {
                self.second_time_shrinkable = false;
                let capacity = table.capacity();
                let new_capacity = self.initial_capacity.max(capacity >> 1);
                if new_capacity < capacity {
                    trace!(
                        "clear: second low-occupancy clear, shrinking {} -> {}",
                        capacity,
                        new_capacity
                    );
                    let _old = self.new_table(table, new_capacity);
                    self.size = 0;
                    self.removed = 0;
                    return;
                }
                trace!("clear: already at initial capacity {}", capacity);
            } else {
                trace!("clear: low occupancy, shrinkable on the next clear");
                self.second_time_shrinkable = true;
            }
        } else {
            self.second_time_shrinkable = false;
        }
        table.clear_slots();
        self.size = 0;
        self.removed = 0;
    }

    /// Counts live slots and checks them, and the threshold, against the
    /// counters.
    pub fn check_invariants<T: ProbeTable>(&self, table: &T) -> Result<()> {
        use crate::error::Error;
        let capacity = table.capacity();
        if !capacity.is_power_of_two() || capacity < MIN_CAPACITY {
            return Err(Error::Internal(format!(
                "capacity {capacity} is not a power of two >= {MIN_CAPACITY}"
            )));
        }
        let live = (0..capacity).filter(|&p| table.is_live(p)).count();
        if live != self.size {
            return Err(Error::Internal(format!(
                "{live} live slots but size is {}",
                self.size
            )));
        }
        if self.size + self.removed >= self.size_which_triggers_expansion {
            return Err(Error::Internal(format!(
                "size {} + removed {} reached the expansion threshold {}",
                self.size, self.removed, self.size_which_triggers_expansion
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::hash_int;

    const REMOVED: i32 = i32::MIN;

    // Bare int-key table used to drive the engine directly.
    struct Keys(Vec<i32>);

    impl ProbeTable for Keys {
        type Slots = Vec<i32>;
        fn capacity(&self) -> usize {
            self.0.len()
        }
        fn is_live(&self, pos: usize) -> bool {
            self.0[pos] != 0 && self.0[pos] != REMOVED
        }
        fn install_slots(&mut self, capacity: usize) -> Vec<i32> {
            std::mem::replace(&mut self.0, vec![0; capacity])
        }
        fn clear_slots(&mut self) {
            self.0.fill(0);
        }
        fn old_len(old: &Vec<i32>) -> usize {
            old.len()
        }
        fn old_is_live(old: &Vec<i32>, pos: usize) -> bool {
            old[pos] != 0 && old[pos] != REMOVED
        }
        fn move_from_old(&mut self, old: &mut Vec<i32>, pos: usize) {
            let key = old[pos];
            let p = probe(&self.0, key);
            self.0[p.pos] = key;
        }
    }

    fn probe(keys: &[i32], key: i32) -> Probe {
        find_position(
            keys.len(),
            hash_int(key),
            |i| keys[i] == 0 || keys[i] == key,
            |i| keys[i] == REMOVED,
        )
    }

    fn add(e: &mut LinearProbe, t: &mut Keys, key: i32) -> bool {
        let p = probe(&t.0, key);
        if t.0[p.pos] == key {
            return false;
        }
        t.0[p.insert_pos()] = key;
        e.added(t, &p);
        true
    }

    fn remove(e: &mut LinearProbe, t: &mut Keys, key: i32) -> bool {
        let p = probe(&t.0, key);
        if t.0[p.pos] != key {
            return false;
        }
        t.0[p.pos] = REMOVED;
        e.removed_one(t);
        true
    }

    fn fresh() -> (LinearProbe, Keys) {
        let e = LinearProbe::new(&TableConfig::default());
        let t = Keys(vec![0; e.initial_capacity()]);
        (e, t)
    }

    #[test]
    fn probe_sequence_reaches_every_slot() {
        // Only slot `target` accepts; the walk must find it from any start.
        for capacity in [16usize, 64, 256] {
            for target in [0, 1, capacity / 2, capacity - 1] {
                for hash in [0u32, 5, 77, 12345] {
                    let p = find_position(capacity, hash, |i| i == target, |_| false);
                    assert_eq!(p.pos, target);
                }
            }
        }
    }

    #[test]
    fn first_tombstone_is_reported() {
        let keys = vec![REMOVED; 16];
        let p = find_position(16, 3, |i| i == 9, |i| keys[i] == REMOVED);
        assert_eq!(p.first_removed, Some(3));
        assert_eq!(p.insert_pos(), 3);
    }

    #[test]
    fn growth_doubles_and_keeps_keys() {
        let (mut e, mut t) = fresh();
        for k in 1..=200 {
            assert!(add(&mut e, &mut t, k));
        }
        assert_eq!(e.size(), 200);
        assert!(t.capacity() >= 256);
        for k in 1..=200 {
            assert_eq!(t.0[probe(&t.0, k).pos], k);
        }
        e.check_invariants(&t).unwrap();
    }

    #[test]
    fn tombstones_are_reused_and_compacted() {
        let (mut e, mut t) = fresh();
        for k in 1..=1000 {
            add(&mut e, &mut t, k);
        }
        let grown = t.capacity();
        for k in 1..=990 {
            assert!(remove(&mut e, &mut t, k));
            e.check_invariants(&t).unwrap();
        }
        assert!(t.capacity() < grown, "removes shrink the table");
        assert!(t.capacity() >= MIN_CAPACITY);
        for k in 991..=1000 {
            assert_eq!(t.0[probe(&t.0, k).pos], k);
        }
    }

    #[test]
    fn clear_shrinks_only_on_second_low_clear() {
        let (mut e, mut t) = fresh();
        for k in 1..=100 {
            add(&mut e, &mut t, k);
        }
        let cap = t.capacity();
        e.clear(&mut t);
        assert_eq!(t.capacity(), cap, "first clear at high occupancy keeps capacity");
        add(&mut e, &mut t, 1);
        e.clear(&mut t);
        assert_eq!(t.capacity(), cap, "first low clear only arms the shrink");
        add(&mut e, &mut t, 1);
        e.clear(&mut t);
        assert_eq!(t.capacity(), cap / 2);
        assert_eq!(e.size(), 0);
    }

    #[test]
    fn clear_never_goes_below_initial_capacity() {
        let (mut e, mut t) = fresh();
        for _ in 0..5 {
            e.clear(&mut t);
        }
        assert_eq!(t.capacity(), e.initial_capacity());
    }
}
