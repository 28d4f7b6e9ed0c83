//! Identity-keyed map from object references to ints.

use crate::config::TableConfig;
use crate::error::Result;
use crate::hashing::{hash_identity, IdentityKey};
use crate::obj_table::ObjCore;
use crate::snapshot::ReadOnly;

/// Maps object references, compared by identity, to ints. A missing key
/// reads as 0.
///
/// Removed entries leave tombstone slots, and a remove may rebuild the
/// table to drop them or shrink it. Slot positions from `find` are valid
/// only until the next mutation.
#[derive(Clone, Debug)]
pub struct Obj2IntIdentityHashMap<K> {
    core: ObjCore<(K, i32)>,
}

impl<K: IdentityKey> Default for Obj2IntIdentityHashMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IdentityKey> Obj2IntIdentityHashMap<K> {
    pub fn new() -> Self {
        Self::with_size(crate::config::DEFAULT_SIZE_BEFORE_EXPANSION)
    }

    pub fn with_size(size_before_expansion: usize) -> Self {
        Obj2IntIdentityHashMap {
            core: ObjCore::new(&TableConfig::new(size_before_expansion)),
        }
    }

    pub fn with_config(config: &TableConfig) -> Result<Self> {
        config.validate()?;
        Ok(Obj2IntIdentityHashMap {
            core: ObjCore::new(config),
        })
    }

    /// Slot holding `key`.
    pub fn find(&self, key: &K) -> Option<usize> {
        self.core
            .find(hash_identity(key), |(k, _)| k.same_identity(key))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    pub fn get(&self, key: &K) -> i32 {
        self.find(key)
            .and_then(|p| self.core.entry_at(p))
            .map_or(0, |(_, v)| *v)
    }

    /// Stores `value` under `key`; returns the previous value, or 0.
    pub fn put(&mut self, key: K, value: i32) -> i32 {
        let hash = hash_identity(&key);
        let (probe, found) = self.core.probe(hash, |(k, _)| k.same_identity(&key));
        if found {
            if let Some((_, v)) = self.core.entry_at_mut(probe.pos) {
                return core::mem::replace(v, value);
            }
        }
        self.core.insert_absent(&probe, hash, (key, value));
        0
    }

    /// Removes `key`; returns its value, or 0 if absent.
    pub fn remove(&mut self, key: &K) -> i32 {
        self.find(key)
            .and_then(|p| self.core.remove_at(p))
            .map_or(0, |(_, v)| v)
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

    /// Keys in slot order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.core.entries().map(|(k, _)| k)
    }

    /// Values in slot order, matching [`keys`](Self::keys).
    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.core.entries().map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, i32)> + '_ {
        self.core.entries().map(|(k, v)| (k, *v))
    }

    pub fn check_invariants(&self) -> Result<()> {
        self.core.check_invariants(
            |(k, _)| hash_identity(k),
            |(a, _), (b, _)| a.same_identity(b),
        )
    }
}

impl<K: IdentityKey + Clone> Obj2IntIdentityHashMap<K> {
    pub fn snapshot(&self) -> ReadOnly<Self> {
        ReadOnly::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::{DefaultKey, SlotMap};
    use std::rc::Rc;

    #[test]
    fn equal_contents_are_distinct_keys() {
        let a = Rc::new(String::from("fs"));
        let b = Rc::new(String::from("fs"));
        let mut m = Obj2IntIdentityHashMap::new();
        assert_eq!(m.put(a.clone(), 1), 0);
        assert_eq!(m.put(b.clone(), 2), 0);
        assert_eq!(m.get(&a), 1);
        assert_eq!(m.get(&b), 2);
        assert_eq!(m.put(a.clone(), 5), 1);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn remove_returns_value_or_zero() {
        let a = Rc::new(1u8);
        let mut m = Obj2IntIdentityHashMap::new();
        m.put(a.clone(), 9);
        assert_eq!(m.remove(&a), 9);
        assert_eq!(m.remove(&a), 0);
        assert!(!m.contains(&a));
        assert_eq!(m.get(&a), 0);
    }

    #[test]
    fn removes_can_rebuild_slots() {
        let owners: Vec<Rc<u32>> = (0..1000).map(Rc::new).collect();
        let mut m = Obj2IntIdentityHashMap::new();
        for (i, o) in owners.iter().enumerate() {
            m.put(Rc::clone(o), i as i32 + 1);
        }
        let grown = m.capacity();
        for o in &owners[100..] {
            assert_ne!(m.remove(o), 0);
        }
        assert!(m.capacity() < grown);
        for (i, o) in owners[..100].iter().enumerate() {
            let pos = m.find(o).unwrap();
            assert_eq!(m.get(o), i as i32 + 1);
            assert_eq!(m.find(o), Some(pos));
        }
        m.check_invariants().unwrap();
    }

    #[test]
    fn arena_handles_as_keys() {
        let mut arena: SlotMap<DefaultKey, u32> = SlotMap::new();
        let handles: Vec<_> = (0..500).map(|i| arena.insert(i)).collect();
        let mut m = Obj2IntIdentityHashMap::new();
        for (i, h) in handles.iter().enumerate() {
            m.put(*h, i as i32);
        }
        for (i, h) in handles.iter().enumerate() {
            assert_eq!(m.get(h), i as i32);
        }
        for h in handles.iter().step_by(2) {
            m.remove(h);
        }
        assert_eq!(m.len(), 250);
        m.check_invariants().unwrap();
        let total: i32 = m.values().sum();
        assert_eq!(total, (1..500).step_by(2).sum::<i32>());
    }

    #[test]
    fn keys_and_values_line_up() {
        let a = Rc::new(());
        let b = Rc::new(());
        let mut m = Obj2IntIdentityHashMap::new();
        m.put(a.clone(), 10);
        m.put(b.clone(), 20);
        for (k, v) in m.keys().zip(m.values()) {
            assert_eq!(m.get(k), v);
        }
    }
}
