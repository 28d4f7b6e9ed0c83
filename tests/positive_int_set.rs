// PositiveIntSet through the public API.
//
// Invariants exercised:
// - Only keys > 0 are accepted; rejected calls change nothing.
// - Ordered output is the same whichever representation is live.
// - A switch keeps every member.
use fs_index_tables::{Error, IntPositions, PositiveIntSet, SwitchPolicy};

fn fill(keys: impl IntoIterator<Item = i32>) -> PositiveIntSet {
    let mut s = PositiveIntSet::new();
    for k in keys {
        s.add(k).unwrap();
    }
    s
}

#[test]
fn rejects_non_positive_keys() {
    let mut s = fill([3]);
    assert_eq!(s.add(0), Err(Error::ZeroKey));
    assert_eq!(s.add(-1), Err(Error::NotPositive(-1)));
    assert_eq!(s.remove(0), Err(Error::ZeroKey));
    assert!(!s.contains(0));
    assert_eq!(s.find(-1), None);
    assert_eq!(s.len(), 1);
}

#[test]
fn ordered_output_is_representation_independent() {
    let dense: Vec<i32> = (1..=300).collect();
    let sparse: Vec<i32> = (1..=300).map(|i| i * 7_001).collect();
    let tiny: Vec<i32> = vec![900_000, 3, 40_000];

    let s = fill(dense.iter().rev().copied());
    assert!(s.is_bit_set());
    assert_eq!(s.to_ordered_int_array(), dense);

    let s = fill(sparse.iter().rev().copied());
    assert!(s.is_hash_set());
    assert_eq!(s.to_ordered_int_array(), sparse);
    assert_eq!(s.ordered_iter().collect::<Vec<_>>(), sparse);

    let s = fill(tiny.iter().copied());
    assert!(s.is_tiny_set());
    assert_eq!(s.to_ordered_int_array(), vec![3, 40_000, 900_000]);
    let mut unordered = s.to_unordered_int_array();
    unordered.sort_unstable();
    assert_eq!(unordered, vec![3, 40_000, 900_000]);
}

#[test]
fn bulk_add_appends() {
    let s = fill([10, 20]);
    let mut out = vec![1];
    s.bulk_add_to(&mut out);
    out.sort_unstable();
    assert_eq!(out, vec![1, 10, 20]);
}

#[test]
fn cursor_visits_each_member() {
    for keys in [vec![4, 5, 6], vec![2, 1_000_000], (1..=40).map(|i| i * 50_000).collect()] {
        let s = fill(keys.iter().copied());
        let mut c = s.cursor();
        let mut seen = vec![];
        while c.has_next() {
            seen.push(c.next().unwrap());
        }
        seen.sort_unstable();
        let mut want = keys.clone();
        want.sort_unstable();
        assert_eq!(seen, want);
    }
}

#[test]
fn zero_hysteresis_still_correct() {
    let policy = SwitchPolicy {
        hysteresis: 0,
        ..SwitchPolicy::default()
    };
    let mut s = PositiveIntSet::with_policy(policy);
    let mut x = 5u32;
    let mut model = std::collections::BTreeSet::new();
    for _ in 0..3000 {
        x = x.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let k = ((x >> 4) % 50_000) as i32 + 1;
        assert_eq!(s.add(k), Ok(model.insert(k)));
    }
    assert_eq!(s.to_ordered_int_array(), model.into_iter().collect::<Vec<_>>());
}

#[test]
fn estimates_validate_their_range() {
    assert!(matches!(
        PositiveIntSet::with_estimates(5, 100, 10),
        Err(Error::InvalidEstimate {
            initial_size: 5,
            est_min: 100,
            est_max: 10
        })
    ));
    let s = PositiveIntSet::with_estimates(0, 0, 0).unwrap();
    assert!(s.is_empty());
}
