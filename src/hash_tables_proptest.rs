#![cfg(test)]

// Property tests for the hash tables kept inside the crate so the engines'
// invariant checks run after every operation.

use crate::int2int_hash_map::Int2IntHashMap;
use crate::int2obj_hash_map::Int2ObjHashMap;
use crate::int_hash_set::IntHashSet;
use crate::int_hash_set_rh::IntHashSetRh;
use crate::obj_hash_set::ObjHashSet;
use crate::obj_hash_set_rh::ObjHashSetRh;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hasher};

// Mostly clustered keys so removes hit, with occasional wide ones that
// force the short-slot sets over to i32 slots and the two extremes.
fn arb_any_key() -> BoxedStrategy<i32> {
    prop_oneof![
        16 => -300i32..300,
        2 => any::<i32>(),
        1 => Just(i32::MAX),
        1 => Just(i32::MIN),
    ]
    .prop_map(|k| if k == 0 { 1 } else { k })
    .boxed()
}

// i32::MIN is the tombstone of the linear-probe int tables.
fn arb_key() -> BoxedStrategy<i32> {
    arb_any_key()
        .prop_map(|k| if k == i32::MIN { 1 } else { k })
        .boxed()
}

#[derive(Clone, Debug)]
enum SetOp {
    Add(i32),
    Remove(i32),
    Contains(i32),
    Clear,
    Iterate,
}

fn arb_set_ops_from(key: BoxedStrategy<i32>) -> impl Strategy<Value = Vec<SetOp>> {
    let op = prop_oneof![
        6 => key.clone().prop_map(SetOp::Add),
        3 => key.clone().prop_map(SetOp::Remove),
        2 => key.prop_map(SetOp::Contains),
        1 => Just(SetOp::Clear),
        1 => Just(SetOp::Iterate),
    ];
    proptest::collection::vec(op, 1..300)
}

fn arb_set_ops() -> impl Strategy<Value = Vec<SetOp>> {
    arb_set_ops_from(arb_key())
}

// Property: IntHashSet behaves like HashSet<i32>.
// - add/remove report presence exactly as the model does
// - iteration yields every element once
// - counters, capacity and probe placement hold after each op
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_int_hash_set(ops in arb_set_ops(), size in 0usize..40) {
        let mut sut = IntHashSet::with_size(size);
        let mut model: HashSet<i32> = HashSet::new();
        for op in ops {
            match op {
                SetOp::Add(k) => prop_assert_eq!(sut.add(k), Ok(model.insert(k))),
                SetOp::Remove(k) => prop_assert_eq!(sut.remove(k), Ok(model.remove(&k))),
                SetOp::Contains(k) => prop_assert_eq!(sut.contains(k), model.contains(&k)),
                SetOp::Clear => {
                    sut.clear();
                    model.clear();
                }
                SetOp::Iterate => {
                    let got: BTreeSet<i32> = sut.iter().collect();
                    prop_assert_eq!(got.len(), sut.len());
                    prop_assert_eq!(got, model.iter().copied().collect::<BTreeSet<_>>());
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.capacity().is_power_of_two());
            prop_assert!(sut.check_invariants().is_ok(), "{:?}", sut.check_invariants());
        }
    }
}

// Property: IntHashSetRh behaves like HashSet<i32>, and every element
// stays within robin-hood reach of its home slot.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_int_hash_set_rh(ops in arb_set_ops_from(arb_any_key()), size in 0usize..40) {
        let mut sut = IntHashSetRh::with_size(size);
        let mut model: HashSet<i32> = HashSet::new();
        for op in ops {
            match op {
                SetOp::Add(k) => prop_assert_eq!(sut.add(k), Ok(model.insert(k))),
                SetOp::Remove(k) => prop_assert_eq!(sut.remove(k), Ok(model.remove(&k))),
                SetOp::Contains(k) => prop_assert_eq!(sut.contains(k), model.contains(&k)),
                SetOp::Clear => {
                    sut.clear();
                    model.clear();
                }
                SetOp::Iterate => {
                    let got: BTreeSet<i32> = sut.iter().collect();
                    prop_assert_eq!(got, model.iter().copied().collect::<BTreeSet<_>>());
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.check_invariants().is_ok(), "{:?}", sut.check_invariants());
        }
    }
}

#[derive(Clone, Debug)]
enum MapOp {
    Put(i32, i32),
    Remove(i32),
    Get(i32),
    Clear,
}

fn arb_map_ops() -> impl Strategy<Value = Vec<MapOp>> {
    let op = prop_oneof![
        6 => (arb_key(), any::<i32>()).prop_map(|(k, v)| MapOp::Put(k, v)),
        3 => arb_key().prop_map(MapOp::Remove),
        2 => arb_key().prop_map(MapOp::Get),
        1 => Just(MapOp::Clear),
    ];
    proptest::collection::vec(op, 1..300)
}

// Property: Int2IntHashMap and Int2ObjHashMap behave like HashMap.
// - put returns the previous value (0 / None when absent)
// - get returns the last value put; keys come back sorted
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_int_maps(ops in arb_map_ops()) {
        let mut ints = Int2IntHashMap::new();
        let mut objs: Int2ObjHashMap<String> = Int2ObjHashMap::new();
        let mut model: HashMap<i32, i32> = HashMap::new();
        for op in ops {
            match op {
                MapOp::Put(k, v) => {
                    let prev = model.insert(k, v);
                    prop_assert_eq!(ints.put(k, v), Ok(prev.unwrap_or(0)));
                    prop_assert_eq!(objs.put(k, v.to_string()), Ok(prev.map(|p| p.to_string())));
                }
                MapOp::Remove(k) => {
                    let prev = model.remove(&k);
                    prop_assert_eq!(ints.remove(k), Ok(prev.unwrap_or(0)));
                    prop_assert_eq!(objs.remove(k), Ok(prev.map(|p| p.to_string())));
                }
                MapOp::Get(k) => {
                    let want = model.get(&k).copied();
                    prop_assert_eq!(ints.get(k), want.unwrap_or(0));
                    prop_assert_eq!(ints.contains_key(k), want.is_some());
                    prop_assert_eq!(objs.get(k).cloned(), want.map(|v| v.to_string()));
                }
                MapOp::Clear => {
                    ints.clear();
                    objs.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(ints.len(), model.len());
            prop_assert_eq!(objs.len(), model.len());
            prop_assert!(ints.check_invariants().is_ok());
            prop_assert!(objs.check_invariants().is_ok());
        }
        let mut keys: Vec<i32> = model.keys().copied().collect();
        keys.sort_unstable();
        prop_assert_eq!(ints.sorted_keys(), keys.clone());
        prop_assert_eq!(objs.sorted_keys(), keys);
    }
}

// Collision variant using a constant hasher to stress equality probing.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

#[derive(Clone, Debug)]
enum ObjOp {
    Add(String),
    Remove(String),
    Contains(String),
    RetainShorterThan(usize),
    Clear,
}

fn arb_obj_ops(word: &'static str) -> impl Strategy<Value = Vec<ObjOp>> {
    let op = prop_oneof![
        6 => word.prop_map(ObjOp::Add),
        3 => word.prop_map(ObjOp::Remove),
        2 => word.prop_map(ObjOp::Contains),
        1 => (0usize..4).prop_map(ObjOp::RetainShorterThan),
        1 => Just(ObjOp::Clear),
    ];
    proptest::collection::vec(op, 1..200)
}

fn run_obj_ops<S: BuildHasher + Clone>(
    ops: Vec<ObjOp>,
    mut lin: ObjHashSet<String, S>,
    mut rh: ObjHashSetRh<String, S>,
) -> Result<(), TestCaseError> {
    let mut model: HashSet<String> = HashSet::new();
    for op in ops {
        match op {
            ObjOp::Add(w) => {
                let fresh = model.insert(w.clone());
                prop_assert_eq!(lin.add(w.clone()), fresh);
                prop_assert_eq!(rh.add(w), fresh);
            }
            ObjOp::Remove(w) => {
                let had = model.remove(&w);
                prop_assert_eq!(lin.remove(w.as_str()).is_some(), had);
                prop_assert_eq!(rh.remove(w.as_str()).is_some(), had);
            }
            ObjOp::Contains(w) => {
                prop_assert_eq!(lin.contains(w.as_str()), model.contains(&w));
                prop_assert_eq!(rh.contains(w.as_str()), model.contains(&w));
            }
            ObjOp::RetainShorterThan(n) => {
                let before = model.len();
                model.retain(|w| w.len() < n);
                let any = model.len() != before;
                prop_assert_eq!(lin.retain(|w| w.len() < n), any);
                prop_assert_eq!(rh.retain(|w| w.len() < n), any);
            }
            ObjOp::Clear => {
                lin.clear();
                rh.clear();
                model.clear();
            }
        }
        prop_assert_eq!(lin.len(), model.len());
        prop_assert_eq!(rh.len(), model.len());
        prop_assert!(lin.check_invariants().is_ok());
        prop_assert!(rh.check_invariants().is_ok());
    }
    let want: BTreeSet<String> = model.into_iter().collect();
    prop_assert_eq!(lin.to_vec().into_iter().collect::<BTreeSet<_>>(), want.clone());
    prop_assert_eq!(rh.to_vec().into_iter().collect::<BTreeSet<_>>(), want);
    Ok(())
}

// Property: both object sets behave like HashSet<String>, including
// retain, under a real hasher and under total collision.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_obj_sets(ops in arb_obj_ops("[a-e]{0,3}")) {
        run_obj_ops(ops, ObjHashSet::with_size(4), ObjHashSetRh::with_size(4))?;
    }

    // at most 85 distinct words, so one colliding run stays under 128
    #[test]
    fn prop_obj_sets_with_collisions(ops in arb_obj_ops("[a-d]{0,3}")) {
        run_obj_ops(
            ops,
            ObjHashSet::with_size_and_hasher(4, ConstBuildHasher),
            ObjHashSetRh::with_size_and_hasher(4, ConstBuildHasher),
        )?;
    }
}
