//! Value-equality object set on the linear-probe engine.

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::hashing::fold_hash;
use crate::obj_table::ObjCore;
use crate::reentrancy::ReentrancyGuard;
use crate::snapshot::ReadOnly;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// A set of values compared with `Eq` and hashed with `S`.
///
/// `Hash` runs once per add or lookup; resizes reuse the hash stored with
/// each entry. Removes leave tombstones, so [`retain`](Self::retain) can
/// delete during its walk and defers any compaction to the end.
///
/// In debug builds, calling back into the same set from `Hash` or `Eq`
/// panics.
#[derive(Clone, Debug)]
pub struct ObjHashSet<T, S = DefaultHashBuilder> {
    core: ObjCore<T>,
    hash_builder: S,
    guard: ReentrancyGuard,
}

impl<T: Hash + Eq> Default for ObjHashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq> ObjHashSet<T> {
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

impl<T: Hash + Eq, S: BuildHasher> ObjHashSet<T, S> {
    pub fn with_size_and_hasher(size_before_expansion: usize, hash_builder: S) -> Self {
        ObjHashSet {
            core: ObjCore::new(&TableConfig::new(size_before_expansion)),
            hash_builder,
            guard: ReentrancyGuard::new(),
        }
    }

    pub fn with_config_and_hasher(config: &TableConfig, hash_builder: S) -> Result<Self> {
        config.validate()?;
        Ok(ObjHashSet {
            core: ObjCore::new(config),
            hash_builder,
            guard: ReentrancyGuard::new(),
        })
    }

    #[inline]
    fn hash_of<Q: Hash + ?Sized>(&self, value: &Q) -> u32 {
        fold_hash(self.hash_builder.hash_one(value))
    }

    /// Adds `value`. Returns false (dropping `value`) if an equal value is
    /// already present.
    pub fn add(&mut self, value: T) -> bool {
        let _g = self.guard.enter();
        let hash = self.hash_of(&value);
        let (probe, found) = self.core.probe(hash, |e| *e == value);
        if found {
            return false;
        }
        self.core.insert_absent(&probe, hash, value);
        true
    }

    /// Slot holding a value equal to `value`.
    pub fn find<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let _g = self.guard.enter();
        let hash = self.hash_of(value);
        self.core.find(hash, |e| e.borrow() == value)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(value).is_some()
    }

    /// Removes and returns the value equal to `value`.
    pub fn remove<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let pos = self.find(value)?;
        self.core.remove_at(pos)
    }

    /// Keeps only the values `keep` accepts. Returns true if any was
    /// removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> bool {
        let _g = self.guard.enter();
        let mut any = false;
        for pos in 0..self.core.capacity() {
            let drop_it = matches!(self.core.entry_at(pos), Some(v) if !keep(v));
            if drop_it {
                self.core.remove_at_deferred(pos);
                any = true;
            }
        }
        if any {
            self.core.finish_removals();
        }
        any
    }

    /// The value at slot `pos`.
    pub fn get(&self, pos: usize) -> Result<&T> {
        self.core.entry_at(pos).ok_or(Error::NoSuchElement)
    }

    pub fn move_to_first(&self) -> Option<usize> {
        self.core.first()
    }

    pub fn move_to_last(&self) -> Option<usize> {
        self.core.last()
    }

    pub fn move_to_next(&self, pos: usize) -> Option<usize> {
        self.core.next_after(pos)
    }

    pub fn move_to_previous(&self, pos: usize) -> Option<usize> {
        self.core.previous_before(pos)
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

    /// Values in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.core.entries()
    }

    pub fn check_invariants(&self) -> Result<()> {
        let _g = self.guard.enter();
        self.core.check_invariants(|v| self.hash_of(v), |a, b| a == b)
    }
}

impl<T: Hash + Eq + Clone, S: BuildHasher + Clone> ObjHashSet<T, S> {
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn snapshot(&self) -> ReadOnly<Self> {
        ReadOnly::new(self.clone())
    }
}
