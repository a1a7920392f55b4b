#![cfg(test)]

// Property tests for ChainTable kept inside the crate so they can check
// structural invariants through `assert_consistent`.

use crate::chain_table::{BucketState, ChainTable, Handle};
use crate::error::TableError;
use crate::hash::HashFunction;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations so shrinking moves toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Put(usize, i32),
    Get(usize),
    Unput(usize),
    Lookup(String),
    Mutate(usize, i32),
    Iterate,
    Drain,
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<Op>)> {
    (1usize..=8, proptest::collection::vec("[a-z]{0,4}", 1..=8)).prop_flat_map(
        |(buckets, pool)| {
            let idx = proptest::sample::select((0..pool.len()).collect::<Vec<_>>());
            let op = prop_oneof![
                6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Put(i, v)),
                3 => idx.clone().prop_map(Op::Get),
                3 => idx.clone().prop_map(Op::Unput),
                1 => "[a-z]{0,4}".prop_map(Op::Lookup),
                2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
                1 => Just(Op::Iterate),
                1 => Just(Op::Drain),
            ];
            proptest::collection::vec(op, 1..60)
                .prop_map(move |ops| (buckets, pool.clone(), ops))
        },
    )
}

// Runs one scenario against a std HashMap model.
// Invariants exercised after every op:
// - put returns the previous value; empty keys are rejected without mutation.
// - get/unput/contains_key agree with the model, including absent keys.
// - handles of removed entries never resolve again.
// - every entry sits in the bucket its digest selects, once (assert_consistent).
// - allocated buckets never revert to unallocated.
fn run_scenario<H: HashFunction>(
    mut sut: ChainTable<i32, H>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();
    let mut stale: Vec<Handle> = Vec::new();
    let mut allocated: BTreeSet<usize> = BTreeSet::new();

    for op in ops {
        match op {
            Op::Put(i, v) => {
                let k = &pool[i];
                let res = sut.put(k, v);
                if k.is_empty() {
                    prop_assert_eq!(res, Err(TableError::EmptyKey));
                } else {
                    prop_assert_eq!(res, Ok(model.insert(k.clone(), v)));
                    allocated.insert(sut.bucket_index(k));
                }
            }
            Op::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
            }
            Op::Unput(i) => {
                let k = &pool[i];
                let handle = sut.find(k);
                prop_assert_eq!(sut.unput(k), model.remove(k));
                stale.extend(handle);
            }
            Op::Lookup(s) => {
                prop_assert_eq!(sut.contains_key(&s), model.contains_key(&s));
            }
            Op::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k), model.get_mut(k)) {
                    (Some(a), Some(b)) => {
                        *a = a.wrapping_add(d);
                        *b = b.wrapping_add(d);
                    }
                    (None, None) => {}
                    _ => {
                        prop_assert!(false, "get_mut presence differs for {:?}", k);
                    }
                }
            }
            Op::Iterate => {
                let s: BTreeSet<(String, i32)> =
                    sut.iter().map(|(k, v)| (k.to_string(), *v)).collect();
                let m: BTreeSet<(String, i32)> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s, m);
            }
            Op::Drain => {
                let handles: Vec<Handle> = pool.iter().filter_map(|k| sut.find(k)).collect();
                let mut drained: Vec<(String, i32)> =
                    sut.drain().map(|(k, v)| (k.into_string(), v)).collect();
                let mut expected: Vec<(String, i32)> = model.drain().collect();
                drained.sort();
                expected.sort();
                prop_assert_eq!(drained, expected);
                stale.extend(handles);
            }
        }

        sut.assert_consistent();
        for h in &stale {
            prop_assert!(h.value(&sut).is_none());
        }
        for &slot in &allocated {
            let still_allocated =
                matches!(sut.bucket_state(slot), Some(BucketState::Allocated { .. }));
            prop_assert!(still_allocated, "bucket {} reverted to unallocated", slot);
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((buckets, pool, ops) in arb_scenario()) {
        let sut = ChainTable::new(buckets).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}

fn constant(_: &str) -> u64 {
    0
}

// Same invariants with every key in one chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((buckets, pool, ops) in arb_scenario()) {
        let sut = ChainTable::with_hasher(buckets, constant).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}
