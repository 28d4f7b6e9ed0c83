//! Hash mixing, capacity arithmetic, and object identity.

use crate::config::MIN_CAPACITY;
use std::rc::Rc;
use std::sync::Arc;

const C1: u32 = 0xcc9e_2d51;
const C2: u32 = 0x1b87_3593;
const SEED: u32 = 0x39c2_ab57;

/// Mixes an int key into a well-distributed 32-bit hash (one murmur3 round
/// plus the murmur3 finalizer).
#[inline]
pub fn hash_int(key: i32) -> u32 {
    let mut k1 = (key as u32).wrapping_mul(C1);
    k1 = k1.rotate_left(15);
    k1 = k1.wrapping_mul(C2);

    let mut h1 = SEED ^ k1;
    h1 = h1.rotate_left(13);
    h1 = h1.wrapping_mul(5).wrapping_add(0xe654_6b64);

    h1 ^= h1 >> 16;
    h1 = h1.wrapping_mul(0x85eb_ca6b);
    h1 ^= h1 >> 13;
    h1 = h1.wrapping_mul(0xc2b2_ae35);
    h1 ^= h1 >> 16;
    h1
}

/// Folds a 64-bit hash down to the 32 bits the engines probe with.
#[inline]
pub(crate) fn fold_hash(h: u64) -> u32 {
    (h ^ (h >> 32)) as u32
}

/// Smallest power of two `>= n`; 1 for 0.
#[inline]
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Capacity a table needs so that `number_of_elements` fit before it
/// expands. Never below [`MIN_CAPACITY`].
pub fn table_space(number_of_elements: usize, load_factor: f32) -> usize {
    let capacity = (number_of_elements as f64 / load_factor as f64).round() as usize;
    next_power_of_two(capacity).max(MIN_CAPACITY)
}

/// Element count at which a table of `capacity` slots expands.
#[inline]
pub(crate) fn expansion_threshold(capacity: usize, load_factor: f32) -> usize {
    (capacity as f64 * load_factor as f64) as usize
}

/// A reference whose identity, not its contents, is the key.
///
/// Two values are the same key iff their identities are equal. The
/// identity must stay fixed while the value is stored in a table.
pub trait IdentityKey {
    fn identity(&self) -> u64;

    #[inline]
    fn same_identity(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl<T: ?Sized> IdentityKey for Rc<T> {
    #[inline]
    fn identity(&self) -> u64 {
        Rc::as_ptr(self) as *const () as usize as u64
    }
}

impl<T: ?Sized> IdentityKey for Arc<T> {
    #[inline]
    fn identity(&self) -> u64 {
        Arc::as_ptr(self) as *const () as usize as u64
    }
}

impl<T: ?Sized> IdentityKey for &T {
    #[inline]
    fn identity(&self) -> u64 {
        *self as *const T as *const () as usize as u64
    }
}

/// Objects that live in a `SlotMap` arena are identified by their handle;
/// the generation keeps a reused slot from aliasing a removed object.
impl IdentityKey for slotmap::DefaultKey {
    #[inline]
    fn identity(&self) -> u64 {
        slotmap::Key::data(self).as_ffi()
    }
}

#[inline]
pub(crate) fn hash_identity<K: IdentityKey + ?Sized>(key: &K) -> u32 {
    let id = key.identity();
    // addresses are aligned, so mix both halves before the int mix
    hash_int(fold_hash(id) as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn hash_int_spreads_sequential_keys() {
        let mask = 1023u32;
        let mut buckets = std::collections::HashSet::new();
        for k in 1..=512 {
            buckets.insert(hash_int(k) & mask);
        }
        // 512 keys in 1024 buckets; a weak mix would collapse far more
        assert!(buckets.len() > 350, "only {} distinct buckets", buckets.len());
    }

    #[test]
    fn table_space_is_power_of_two_and_at_least_min() {
        assert_eq!(table_space(0, 0.66), MIN_CAPACITY);
        assert_eq!(table_space(10, 0.66), 16);
        assert_eq!(table_space(11, 0.66), 32);
        assert_eq!(table_space(1000, 0.66), 2048);
    }

    #[test]
    fn next_power_of_two_edges() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(17), 32);
        assert_eq!(next_power_of_two(64), 64);
    }

    #[test]
    fn rc_identity_differs_for_equal_contents() {
        let a = Rc::new(5);
        let b = Rc::new(5);
        assert!(!a.same_identity(&b));
        assert!(a.same_identity(&a.clone()));
    }

    #[test]
    fn slotmap_identity_survives_slot_reuse() {
        let mut arena: SlotMap<slotmap::DefaultKey, &str> = SlotMap::new();
        let k1 = arena.insert("a");
        arena.remove(k1);
        let k2 = arena.insert("b");
        assert!(!k1.same_identity(&k2));
    }
}
