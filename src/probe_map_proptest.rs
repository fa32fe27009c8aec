#![cfg(test)]

// Property tests for ProbeMap kept inside the crate so post-conditions can
// check the occupancy counters that drive the growth trigger.

use crate::probe_map::{LookupError, ProbeMap};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    TryGet(usize),
    GetOrInsertWith(usize, i32),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            3 => idx.clone().prop_map(OpI::Get),
            2 => idx.clone().prop_map(OpI::TryGet),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::GetOrInsertWith(i, v)),
            2 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            2 => (idx, any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            2 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap, shared by
// the default-hasher and worst-case-collision variants. Invariants checked
// after every op:
// - len/is_empty parity with the model.
// - live <= filled <= capacity; occupied load never above 50%.
// - capacity is zero or a power of two.
// - iteration yields each live entry exactly once and matches the model.
// - the get_or_insert_with default runs exactly once, and only on absence.
fn run_state_machine<S>(
    pool: &[String],
    ops: Vec<OpI>,
    mut sut: ProbeMap<String, i32, S>,
) -> Result<(), TestCaseError>
where
    S: BuildHasher,
{
    let mut model: HashMap<String, i32> = HashMap::new();
    let default_calls = Cell::new(0u32);

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                let old = sut.insert(k.clone(), v);
                let model_old = model.insert(k, v);
                prop_assert_eq!(old, model_old, "insert must report the replaced value");
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                // Borrowed removal: store String, remove by &str.
                prop_assert_eq!(sut.remove(k.as_str()), model.remove(k));
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
            }
            OpI::TryGet(i) => {
                let k = &pool[i];
                match model.get(k) {
                    Some(v) => prop_assert_eq!(sut.try_get(k), Ok(v)),
                    None => prop_assert_eq!(sut.try_get(k), Err(LookupError::KeyNotFound)),
                }
            }
            OpI::GetOrInsertWith(i, v) => {
                let k = pool[i].clone();
                let absent = !model.contains_key(&k);
                let before = default_calls.get();
                let out = *sut.get_or_insert_with(k.clone(), || {
                    default_calls.set(default_calls.get() + 1);
                    v
                });
                if absent {
                    prop_assert_eq!(default_calls.get(), before + 1, "default runs on absence");
                    prop_assert_eq!(out, v);
                    model.insert(k, v);
                } else {
                    prop_assert_eq!(default_calls.get(), before, "default must not run");
                    prop_assert_eq!(out, model[&k]);
                }
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(s.as_str()), model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k), model.get_mut(k)) {
                    (Some(v), Some(mv)) => {
                        *v = v.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "get_mut presence mismatch"),
                }
            }
            OpI::Iterate => {
                let it = sut.iter();
                prop_assert_eq!(it.len(), model.len(), "exact size hint");
                let pairs: Vec<(String, i32)> = it.map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(pairs.len(), model.len(), "each live entry exactly once");
                let s_pairs: BTreeMap<String, i32> = pairs.into_iter().collect();
                let m_pairs: BTreeMap<String, i32> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s_pairs, m_pairs);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), 0, "clear releases storage");
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.len() <= sut.filled());
        prop_assert!(sut.filled() <= sut.capacity());
        prop_assert!(sut.capacity() == 0 || sut.filled() * 2 <= sut.capacity());
        prop_assert!(sut.capacity() == 0 || sut.capacity().is_power_of_two());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: ProbeMap<String, i32> = ProbeMap::new();
        run_state_machine(&pool, ops, sut)?;
    }
}

// Collision variant using a constant hasher: every key lands on the same
// start index, so probe chains, tombstone traversal, and resurrection are
// exercised far more heavily than under a distributing hasher.
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

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: ProbeMap<String, i32, ConstBuildHasher> =
            ProbeMap::with_hasher(ConstBuildHasher);
        run_state_machine(&pool, ops, sut)?;
    }
}
