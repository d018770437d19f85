#![cfg(test)]

// Model-based property tests shared by every HtMap implementation, kept in
// the crate so both map kinds run the same scenario driver.

use crate::array_ht_map::{ArrayHtMap, Growth};
use crate::error::HtError;
use crate::hash_ht_map::HashHtMap;
use crate::ht_map::{HtMap, Value};
use crate::key::{Key, RawKey};
use crate::key_space::KeySpace;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Put(bool, usize, i32),
    PutWrongType(bool, usize),
    Remove(bool, usize),
    Get(bool, usize),
    Mutate(bool, usize, i32),
    CreateLate,
    Iterate,
    Clear,
}

#[derive(Clone, Debug, PartialEq)]
enum Val {
    Int(i32),
    Str(String),
}

enum Typed {
    Int(Key<i32>),
    Str(Key<String>),
}

impl Typed {
    fn raw(&self) -> &RawKey {
        match self {
            Typed::Int(k) => k.raw(),
            Typed::Str(k) => k.raw(),
        }
    }
}

// Two spaces with the same key names; `bool` in ops selects space b.
struct Fixture {
    a: KeySpace,
    b: KeySpace,
    a_keys: Vec<Typed>,
    b_keys: Vec<Typed>,
}

impl Fixture {
    fn new() -> Self {
        let a = KeySpace::new();
        let b = KeySpace::new();
        let mint = |ks: &KeySpace| -> Vec<Typed> {
            (0..4)
                .map(|i| {
                    let name = format!("k{i}");
                    if i % 2 == 0 {
                        Typed::Int(ks.create(&name).unwrap())
                    } else {
                        Typed::Str(ks.create(&name).unwrap())
                    }
                })
                .collect()
        };
        let a_keys = mint(&a);
        let b_keys = mint(&b);
        Self {
            a,
            b,
            a_keys,
            b_keys,
        }
    }

    fn slot(&self, in_b: bool, i: usize) -> (usize, &Typed) {
        let keys = if in_b { &self.b_keys } else { &self.a_keys };
        let idx = i % keys.len();
        (idx, &keys[idx])
    }

    fn all(&self) -> impl Iterator<Item = (bool, usize, &Typed)> {
        let a = self.a_keys.iter().enumerate().map(|(i, k)| (false, i, k));
        let b = self.b_keys.iter().enumerate().map(|(i, k)| (true, i, k));
        a.chain(b)
    }
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<bool>(), 0usize..16, any::<i32>()).prop_map(|(b, i, v)| Op::Put(b, i, v)),
        2 => (any::<bool>(), 0usize..16).prop_map(|(b, i)| Op::PutWrongType(b, i)),
        2 => (any::<bool>(), 0usize..16).prop_map(|(b, i)| Op::Remove(b, i)),
        2 => (any::<bool>(), 0usize..16).prop_map(|(b, i)| Op::Get(b, i)),
        1 => (any::<bool>(), 0usize..16, any::<i32>()).prop_map(|(b, i, d)| Op::Mutate(b, i, d)),
        1 => Just(Op::CreateLate),
        1 => Just(Op::Iterate),
        1 => Just(Op::Clear),
    ]
}

// Drives `sut` and a BTreeMap model through `ops`.
// - `rejects_b`: the map is bound to space a and must reject every key of b.
// - `ordered`: iteration must follow key id order.
fn run<M: HtMap>(
    sut: &mut M,
    fx: &mut Fixture,
    rejects_b: bool,
    ordered: bool,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: BTreeMap<(bool, usize), Val> = BTreeMap::new();

    for op in ops {
        match op {
            Op::Put(in_b, i, v) => {
                let (idx, key) = fx.slot(in_b, i);
                let (res, new) = match key {
                    Typed::Int(k) => (sut.put(k, v).map(|p| p.map(Val::Int)), Val::Int(v)),
                    Typed::Str(k) => (
                        sut.put(k, v.to_string()).map(|p| p.map(Val::Str)),
                        Val::Str(v.to_string()),
                    ),
                };
                if in_b && rejects_b {
                    let ok = matches!(res, Err(HtError::ForeignKeyUsage { .. }));
                    prop_assert!(ok, "unexpected result: {:?}", res);
                } else {
                    prop_assert_eq!(res, Ok(model.insert((in_b, idx), new)));
                }
            }
            Op::PutWrongType(in_b, i) => {
                let (_, key) = fx.slot(in_b, i);
                let bad: Value = match key {
                    Typed::Int(_) => Box::new(String::from("wrong")),
                    Typed::Str(_) => Box::new(0i32),
                };
                let res = sut.put_raw(key.raw(), bad);
                if in_b && rejects_b {
                    let ok = matches!(res, Err(HtError::ForeignKeyUsage { .. }));
                    prop_assert!(ok, "unexpected result: {:?}", res);
                } else {
                    let ok = matches!(res, Err(HtError::TypeMismatch { .. }));
                    prop_assert!(ok, "unexpected result: {:?}", res);
                }
            }
            Op::Remove(in_b, i) => {
                let (idx, key) = fx.slot(in_b, i);
                let res = match key {
                    Typed::Int(k) => sut.remove(k).map(|p| p.map(Val::Int)),
                    Typed::Str(k) => sut.remove(k).map(|p| p.map(Val::Str)),
                };
                if in_b && rejects_b {
                    prop_assert!(res.is_err());
                } else {
                    prop_assert_eq!(res, Ok(model.remove(&(in_b, idx))));
                }
            }
            Op::Get(in_b, i) => {
                let (idx, key) = fx.slot(in_b, i);
                let res = match key {
                    Typed::Int(k) => sut.get(k).map(|o| o.copied().map(Val::Int)),
                    Typed::Str(k) => sut.get(k).map(|o| o.cloned().map(Val::Str)),
                };
                if in_b && rejects_b {
                    prop_assert!(res.is_err());
                } else {
                    prop_assert_eq!(res, Ok(model.get(&(in_b, idx)).cloned()));
                }
            }
            Op::Mutate(in_b, i, d) => {
                let (idx, key) = fx.slot(in_b, i);
                if in_b && rejects_b {
                    prop_assert!(sut.get_raw_mut(key.raw()).is_err());
                    continue;
                }
                match key {
                    Typed::Int(k) => {
                        if let Some(v) = sut.get_mut(k).unwrap() {
                            *v = v.saturating_add(d);
                        }
                        if let Some(Val::Int(m)) = model.get_mut(&(in_b, idx)) {
                            *m = m.saturating_add(d);
                        }
                    }
                    Typed::Str(k) => {
                        if let Some(v) = sut.get_mut(k).unwrap() {
                            v.push('!');
                        }
                        if let Some(Val::Str(m)) = model.get_mut(&(in_b, idx)) {
                            m.push('!');
                        }
                    }
                }
            }
            Op::CreateLate => {
                let name = format!("late{}", fx.a_keys.len());
                let key = fx.a.create::<i32>(&name).unwrap();
                prop_assert_eq!(key.id(), fx.a_keys.len());
                fx.a_keys.push(Typed::Int(key));
            }
            Op::Iterate => {
                let seen: Vec<(bool, usize)> = sut
                    .iter()
                    .map(|(k, _)| (k.space_id() == fx.b.id(), k.id()))
                    .collect();
                if ordered {
                    prop_assert!(seen.windows(2).all(|w| w[0].1 < w[1].1));
                }
                let mut sorted = seen.clone();
                sorted.sort();
                let expected: Vec<(bool, usize)> = model.keys().copied().collect();
                prop_assert_eq!(sorted, expected);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        // Post-conditions after each op
        for (in_b, idx, key) in fx.all() {
            let has = sut.contains_key(key.raw());
            if in_b && rejects_b {
                prop_assert!(has.is_err());
            } else {
                prop_assert_eq!(has, Ok(model.contains_key(&(in_b, idx))));
            }
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Property: ArrayHtMap behaves like the model for its own space, grows for
// keys created after it, iterates in id order, and rejects every key of the
// other space.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_array_matches_model(ops in proptest::collection::vec(arb_op(), 1..80)) {
        let mut fx = Fixture::new();
        let mut sut = ArrayHtMap::new(&fx.a);
        run(&mut sut, &mut fx, true, true, ops)?;
    }

    #[test]
    fn prop_array_exact_growth_matches_model(ops in proptest::collection::vec(arb_op(), 1..80)) {
        let mut fx = Fixture::new();
        let mut sut = ArrayHtMap::with_growth(&fx.a, Growth::Exact);
        run(&mut sut, &mut fx, true, true, ops)?;
    }
}

// Property: HashHtMap behaves like the model with keys from both spaces at
// once, even though the spaces share key names and ids.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_hash_matches_model(ops in proptest::collection::vec(arb_op(), 1..80)) {
        let mut fx = Fixture::new();
        let mut sut = HashHtMap::with_capacity(8);
        run(&mut sut, &mut fx, false, false, ops)?;
    }
}
