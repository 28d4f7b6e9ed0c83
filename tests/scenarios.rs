// End-to-end scenarios across the public surface.
//
// Each test drives one structure through a short, fixed history and checks
// the observable outcome: membership, representation, and capacity.
use fs_index_tables::config::MIN_CAPACITY;
use fs_index_tables::{IntHashSet, IntHashSetRh, OrderedFsSet, PositiveIntSet};

// Test: duplicate adds are absorbed.
// Verifies: size counts distinct keys; contains is exact.
#[test]
fn int_set_with_duplicate() {
    let mut s = IntHashSet::with_size(10);
    assert_eq!(s.capacity(), 16);
    for k in [5, 3, 9, 3] {
        s.add(k).unwrap();
    }
    assert_eq!(s.len(), 3);
    assert!(s.contains(3));
    assert!(!s.contains(7));
}

// Test: a robin-hood int set stays on i16 slots for a narrow range and
// converts to i32 slots once a far key arrives.
#[test]
fn robin_hood_set_leaves_short_slots_for_far_key() {
    let mut s = IntHashSetRh::with_offset(10, 0);
    for k in 1..=20 {
        s.add(k).unwrap();
    }
    assert!(s.is_short_hash_set());
    s.add(100_000).unwrap();
    assert!(!s.is_short_hash_set());
    for k in 1..=20 {
        assert!(s.contains(k));
    }
    assert!(s.contains(100_000));
    s.check_invariants().unwrap();
}

// Test: removing from the middle of an ordered set keeps order.
#[test]
fn ordered_set_remove_middle() {
    let mut s = OrderedFsSet::with_comparator(|a: &i32, b: &i32| a.cmp(b));
    for k in 1..=10 {
        s.add(k);
    }
    s.remove(&5);
    assert_eq!(
        s.iter().copied().collect::<Vec<_>>(),
        vec![1, 2, 3, 4, 6, 7, 8, 9, 10]
    );
}

// Test: a far cluster starts an offset bit set; a small key then drops
// the offset and moves the set elsewhere without losing members.
#[test]
fn positive_set_offset_then_small_key() {
    let mut s = PositiveIntSet::new();
    s.add(1_000_000).unwrap();
    s.add(1_000_001).unwrap();
    assert!(s.is_offset_bit_set());
    s.add(2).unwrap();
    assert!(!s.uses_offset() || !s.is_bit_set());
    assert!(s.contains(2));
    assert!(s.contains(1_000_001));
    assert!(s.contains(1_000_000));
}

// Test: a set grown to 1000 keys and then emptied gives capacity back.
// Verifies: capacity shrinks, stays a power of two, never under 16.
#[test]
fn emptied_set_shrinks() {
    let mut s = IntHashSet::new();
    for k in 1..=1000 {
        s.add(k).unwrap();
    }
    let grown = s.capacity();
    for k in 1..=1000 {
        s.remove(k).unwrap();
    }
    for k in 1..=5 {
        s.add(k).unwrap();
    }
    assert!(s.capacity() < grown);
    assert!(s.capacity() >= MIN_CAPACITY);
    assert!(s.capacity().is_power_of_two());
    assert_eq!(s.len(), 5);
}
