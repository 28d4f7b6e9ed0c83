//! Tagged-slot storage for the object-keyed linear-probe tables.
//!
//! Each occupied slot keeps the entry's 32-bit hash, so a resize re-places
//! entries without calling back into `Hash` or `IdentityKey`. Lookups
//! compare the stored hash before running the caller's equality test.

use crate::config::TableConfig;
use crate::cursor::{next_live, previous_live};
use crate::error::{Error, Result};
use crate::linear_probe::{find_position, LinearProbe, Probe, ProbeTable};
use core::mem;

#[derive(Clone, Debug)]
pub(crate) enum Slot<E> {
    Empty,
    Removed,
    Occupied { hash: u32, entry: E },
}

impl<E> Slot<E> {
    #[inline]
    fn is_live(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }
}

fn empty_slots<E>(capacity: usize) -> Vec<Slot<E>> {
    (0..capacity).map(|_| Slot::Empty).collect()
}

#[derive(Clone, Debug)]
pub(crate) struct SlotTable<E> {
    slots: Vec<Slot<E>>,
}

impl<E> ProbeTable for SlotTable<E> {
    type Slots = Vec<Slot<E>>;

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn is_live(&self, pos: usize) -> bool {
        self.slots[pos].is_live()
    }

    fn install_slots(&mut self, capacity: usize) -> Vec<Slot<E>> {
        mem::replace(&mut self.slots, empty_slots(capacity))
    }

    fn clear_slots(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = Slot::Empty);
    }

    fn old_len(old: &Vec<Slot<E>>) -> usize {
        old.len()
    }

    fn old_is_live(old: &Vec<Slot<E>>, pos: usize) -> bool {
        old[pos].is_live()
    }

    fn move_from_old(&mut self, old: &mut Vec<Slot<E>>, pos: usize) {
        let slot = mem::replace(&mut old[pos], Slot::Empty);
        if let Slot::Occupied { hash, .. } = slot {
            let slots = &self.slots;
            let at = find_position(
                slots.len(),
                hash,
                |p| matches!(slots[p], Slot::Empty),
                |_| false,
            )
            .pos;
            self.slots[at] = slot;
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct ObjCore<E> {
    probe: LinearProbe,
    table: SlotTable<E>,
}

impl<E> ObjCore<E> {
    pub fn new(config: &TableConfig) -> Self {
        let probe = LinearProbe::new(config);
        let slots = empty_slots(probe.initial_capacity());
        ObjCore {
            probe,
            table: SlotTable { slots },
        }
    }

    /// Probes for an entry with `hash` that `eq` accepts. The flag tells
    /// whether `probe.pos` holds it.
    pub fn probe(&self, hash: u32, mut eq: impl FnMut(&E) -> bool) -> (Probe, bool) {
        let slots = &self.table.slots;
        let probe = find_position(
            slots.len(),
            hash,
            |p| match &slots[p] {
                Slot::Empty => true,
                Slot::Removed => false,
                Slot::Occupied { hash: h, entry } => *h == hash && eq(entry),
            },
            |p| matches!(slots[p], Slot::Removed),
        );
        let found = slots[probe.pos].is_live();
        (probe, found)
    }

    pub fn find(&self, hash: u32, eq: impl FnMut(&E) -> bool) -> Option<usize> {
        if self.probe.size() == 0 {
            return None;
        }
        let (probe, found) = self.probe(hash, eq);
        found.then_some(probe.pos)
    }

    /// Stores an entry whose absence `probe` established.
    pub fn insert_absent(&mut self, probe: &Probe, hash: u32, entry: E) {
        self.table.slots[probe.insert_pos()] = Slot::Occupied { hash, entry };
        self.probe.added(&mut self.table, probe);
    }

    fn take_at(&mut self, pos: usize) -> Option<E> {
        match mem::replace(&mut self.table.slots[pos], Slot::Removed) {
            Slot::Occupied { entry, .. } => Some(entry),
            other => {
                self.table.slots[pos] = other;
                None
            }
        }
    }

    pub fn remove_at(&mut self, pos: usize) -> Option<E> {
        let entry = self.take_at(pos)?;
        self.probe.removed_one(&mut self.table);
        Some(entry)
    }

    /// Removes an entry without moving any other slot, so a slot walk in
    /// progress stays valid. Call [`finish_removals`](Self::finish_removals)
    /// when the walk ends.
    pub fn remove_at_deferred(&mut self, pos: usize) -> Option<E> {
        let entry = self.take_at(pos)?;
        self.probe.removed_one_deferred();
        Some(entry)
    }

    pub fn finish_removals(&mut self) {
        self.probe.maybe_rebalance_removes(&mut self.table);
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
        self.table.slots.len()
    }

    #[inline]
    pub fn is_live(&self, pos: usize) -> bool {
        self.table.slots[pos].is_live()
    }

    pub fn entry_at(&self, pos: usize) -> Option<&E> {
        match self.table.slots.get(pos)? {
            Slot::Occupied { entry, .. } => Some(entry),
            _ => None,
        }
    }

    pub fn entry_at_mut(&mut self, pos: usize) -> Option<&mut E> {
        match self.table.slots.get_mut(pos)? {
            Slot::Occupied { entry, .. } => Some(entry),
            _ => None,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &E> + '_ {
        self.table.slots.iter().filter_map(|s| match s {
            Slot::Occupied { entry, .. } => Some(entry),
            _ => None,
        })
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

    /// Checks counters, that each stored hash still matches `rehash`, and
    /// that a lookup lands on every entry.
    pub fn check_invariants(
        &self,
        mut rehash: impl FnMut(&E) -> u32,
        mut same: impl FnMut(&E, &E) -> bool,
    ) -> Result<()> {
        self.probe.check_invariants(&self.table)?;
        for (pos, slot) in self.table.slots.iter().enumerate() {
            if let Slot::Occupied { hash, entry } = slot {
                if rehash(entry) != *hash {
                    return Err(Error::Internal(format!(
                        "entry at slot {pos} changed its hash while stored"
                    )));
                }
                if self.find(*hash, |e| same(e, entry)) != Some(pos) {
                    return Err(Error::Internal(format!(
                        "entry at slot {pos} is not found by lookup"
                    )));
                }
            }
        }
        Ok(())
    }
}
