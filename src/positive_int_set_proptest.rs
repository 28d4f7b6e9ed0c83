#![cfg(test)]

// Property tests for PositiveIntSet. Key mixes are chosen so runs cross
// every representation switch: dense small keys, a far cluster, and
// scattered wide keys.

use crate::config::SwitchPolicy;
use crate::positive_int_set::PositiveIntSet;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn arb_positive_key() -> impl Strategy<Value = i32> {
    prop_oneof![
        6 => 1i32..600,
        3 => 1_000_000i32..1_002_000,
        1 => 1i32..=i32::MAX,
    ]
}

#[derive(Clone, Debug)]
enum Op {
    Add(i32),
    Remove(i32),
    Contains(i32),
    Clear,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        8 => arb_positive_key().prop_map(Op::Add),
        3 => arb_positive_key().prop_map(Op::Remove),
        2 => arb_positive_key().prop_map(Op::Contains),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..400)
}

fn arb_policy() -> impl Strategy<Value = SwitchPolicy> {
    (0usize..64, 1usize..8, 0u32..3, 1usize..24).prop_map(
        |(hysteresis, overalloc_words, hash_set_overallocate_shift, tiny_set_max_size)| {
            SwitchPolicy {
                hysteresis,
                bit_set_overallocate: overalloc_words * 64,
                hash_set_overallocate_shift,
                tiny_set_max_size,
            }
        },
    )
}

fn check_against(
    sut: &PositiveIntSet,
    model: &BTreeSet<i32>,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(sut.len(), model.len());
    prop_assert_eq!(
        sut.to_ordered_int_array(),
        model.iter().copied().collect::<Vec<_>>()
    );
    let reprs = [sut.is_bit_set(), sut.is_tiny_set(), sut.is_hash_set()];
    prop_assert_eq!(reprs.iter().filter(|&&r| r).count(), 1);
    Ok(())
}

// Property: PositiveIntSet behaves like BTreeSet<i32> for positive keys,
// whatever representation it is in, and exactly one representation is
// live at a time.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_matches_btree_set(ops in arb_ops()) {
        let mut sut = PositiveIntSet::new();
        let mut model = BTreeSet::new();
        for op in ops {
            match op {
                Op::Add(k) => prop_assert_eq!(sut.add(k), Ok(model.insert(k))),
                Op::Remove(k) => prop_assert_eq!(sut.remove(k), Ok(model.remove(&k))),
                Op::Contains(k) => prop_assert_eq!(sut.contains(k), model.contains(&k)),
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            prop_assert_eq!(sut.len(), model.len());
        }
        check_against(&sut, &model)?;
    }

    #[test]
    fn prop_any_policy_keeps_membership(policy in arb_policy(), ops in arb_ops()) {
        let mut sut = PositiveIntSet::with_policy(policy);
        let mut model = BTreeSet::new();
        for op in ops {
            match op {
                Op::Add(k) => prop_assert_eq!(sut.add(k), Ok(model.insert(k))),
                Op::Remove(k) => prop_assert_eq!(sut.remove(k), Ok(model.remove(&k))),
                Op::Contains(k) => prop_assert_eq!(sut.contains(k), model.contains(&k)),
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
        }
        check_against(&sut, &model)?;
    }

    #[test]
    fn prop_estimates_only_change_layout(
        initial in 0i32..3000,
        lo in 1i32..2_000_000,
        span in 0i32..2_000_000,
        keys in proptest::collection::vec(arb_positive_key(), 0..300),
    ) {
        let mut sut = PositiveIntSet::with_estimates(initial, lo, lo + span).unwrap();
        let mut model = BTreeSet::new();
        for k in keys {
            prop_assert_eq!(sut.add(k), Ok(model.insert(k)));
        }
        check_against(&sut, &model)?;
    }
}
