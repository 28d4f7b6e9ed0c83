//! Value-equality object set on the robin-hood engine.

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::hashing::fold_hash;
use crate::reentrancy::ReentrancyGuard;
use crate::robin_hood::{Cleared, RobinHood, LHB_EMPTY};
use crate::snapshot::ReadOnly;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::mem;
use hashbrown::hash_map::DefaultHashBuilder;

type Entry<T> = Option<(u32, T)>;

/// A set of values compared with `Eq`, without tombstones.
///
/// Each slot is `None` or the value with its hash; removes shift the rest
/// of the probe run back, so lookups never walk past dead slots.
#[derive(Clone, Debug)]
pub struct ObjHashSetRh<T, S = DefaultHashBuilder> {
    rh: RobinHood,
    slots: Vec<Entry<T>>,
    hash_builder: S,
    guard: ReentrancyGuard,
}

fn empty_slots<T>(capacity: usize) -> Vec<Entry<T>> {
    (0..capacity).map(|_| None).collect()
}

impl<T: Hash + Eq> Default for ObjHashSetRh<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq> ObjHashSetRh<T> {
    pub fn new() -> Self {
        Self::with_size(crate::config::DEFAULT_SIZE_BEFORE_EXPANSION)
    }

    pub fn with_size(size_before_expansion: usize) -> Self {
        Self::with_size_and_hasher(size_before_expansion, DefaultHashBuilder::default())
    }

    pub fn with_config(config: &TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<T: Hash + Eq, S: BuildHasher> ObjHashSetRh<T, S> {
    pub fn with_size_and_hasher(size_before_expansion: usize, hash_builder: S) -> Self {
        Self::build(&TableConfig::new(size_before_expansion), hash_builder)
    }

    pub fn with_config_and_hasher(config: &TableConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, hash_builder))
    }

    fn build(config: &TableConfig, hash_builder: S) -> Self {
        let rh = RobinHood::new(config);
        let slots = empty_slots(rh.capacity());
        ObjHashSetRh {
            rh,
            slots,
            hash_builder,
            guard: ReentrancyGuard::new(),
        }
    }

    #[inline]
    fn hash_of<Q: Hash + ?Sized>(&self, value: &Q) -> u32 {
        fold_hash(self.hash_builder.hash_one(value))
    }

    fn probe_for<Q>(&self, hash: u32, value: &Q) -> crate::robin_hood::RhProbe
    where
        T: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let slots = &self.slots;
        self.rh.find_position(hash, |p| {
            matches!(&slots[p], Some((h, v)) if *h == hash && v.borrow() == value)
        })
    }

    /// Adds `value`. Returns false (dropping `value`) if an equal value is
    /// already present.
    pub fn add(&mut self, value: T) -> bool {
        let (hash, probe) = {
            let _g = self.guard.enter();
            let hash = self.hash_of(&value);
            (hash, self.probe_for(hash, &value))
        };
        if probe.found {
            return false;
        }
        self.rh
            .insert_at(&mut self.slots, probe.pos, Some((hash, value)), hash);
        if self.rh.added() {
            self.expand_table();
        }
        true
    }

    fn expand_table(&mut self) {
        let old_lhb = self.rh.new_table(self.rh.capacity() * 2);
        let old = mem::replace(&mut self.slots, empty_slots(self.rh.capacity()));
        for (entry, b) in old.into_iter().zip(old_lhb) {
            if b == LHB_EMPTY {
                continue;
            }
            if let Some((hash, value)) = entry {
                let at = self.rh.find_position_new(hash);
                self.rh.insert_at(&mut self.slots, at, Some((hash, value)), hash);
            }
        }
    }

    pub fn find<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let _g = self.guard.enter();
        let probe = self.probe_for(self.hash_of(value), value);
        probe.found.then_some(probe.pos)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(value).is_some()
    }

    pub fn remove<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.find(value)?;
        self.rh.remove_at(&mut self.slots, pos).map(|(_, v)| v)
    }

    /// Keeps only the values `keep` accepts, asking about each value once.
    /// Returns true if any was removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> bool {
        let _g = self.guard.enter();
        let removed = self.rh.retain(&mut self.slots, |slot| match slot {
            Some((_, v)) => keep(v),
            None => true,
        });
        removed > 0
    }

    pub fn get(&self, pos: usize) -> Result<&T> {
        match self.slots.get(pos) {
            Some(Some((_, v))) => Ok(v),
            _ => Err(Error::NoSuchElement),
        }
    }

    pub fn move_to_first(&self) -> Option<usize> {
        crate::cursor::next_live(self.capacity(), 0, |p| self.rh.is_live(p))
    }

    pub fn move_to_next(&self, pos: usize) -> Option<usize> {
        crate::cursor::next_live(self.capacity(), pos + 1, |p| self.rh.is_live(p))
    }

    pub fn move_to_last(&self) -> Option<usize> {
        crate::cursor::previous_live(self.capacity(), |p| self.rh.is_live(p))
    }

    pub fn move_to_previous(&self, pos: usize) -> Option<usize> {
        crate::cursor::previous_live(pos.min(self.capacity()), |p| self.rh.is_live(p))
    }

    pub fn clear(&mut self) {
        match self.rh.clear() {
            Cleared::InPlace => self.slots.iter_mut().for_each(|s| *s = None),
            Cleared::Resized(capacity) => self.slots = empty_slots(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.rh.size()
    }

    pub fn is_empty(&self) -> bool {
        self.rh.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.rh.capacity()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(|s| s.as_ref().map(|(_, v)| v))
    }

    pub fn check_invariants(&self) -> Result<()> {
        let _g = self.guard.enter();
        for (pos, slot) in self.slots.iter().enumerate() {
            match slot {
                Some((hash, v)) if self.hash_of(v) != *hash => {
                    return Err(Error::Internal(format!(
                        "value at slot {pos} changed its hash while stored"
                    )));
                }
                Some(_) if !self.rh.is_live(pos) => {
                    return Err(Error::Internal(format!("slot {pos} holds a value but is marked empty")));
                }
                _ => {}
            }
        }
        self.rh
            .check_invariants(|p| self.slots[p].as_ref().map_or(0, |(h, _)| *h))
    }
}

impl<T: Hash + Eq + Clone, S: BuildHasher + Clone> ObjHashSetRh<T, S> {
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn snapshot(&self) -> ReadOnly<Self> {
        ReadOnly::new(self.clone())
    }
}
