// HtMap contract test suite, run against ArrayHtMap and HashHtMap.
//
// Core invariants exercised:
// - Round-trip: put then get returns the value; remove then get is absent;
//   removing an absent key is a no-op returning None.
// - Type safety: a value whose type differs from the key's declared type is
//   rejected with TypeMismatch and the stored value is unchanged.
// - Sentinel: set(key, None) removes.
// - Batch: put_all applies every entry or none.
// - ArrayHtMap: grows for keys created after the map; rejects foreign keys.
// - HashHtMap: keeps same-named keys from different spaces apart.
use htmap::{ArrayHtMap, HashHtMap, HtError, HtMap, KeySpace, RawKey, Value};
use std::collections::HashMap;

fn round_trip<M: HtMap>(m: &mut M, ks: &KeySpace) {
    let k1 = ks.get("a").unwrap().typed::<String>().unwrap();
    let k2 = ks.get("b").unwrap().typed::<i32>().unwrap();

    assert_eq!(m.put(&k1, "x".to_string()).unwrap(), None);
    assert_eq!(m.get(&k1).unwrap().map(String::as_str), Some("x"));
    assert_eq!(m.put(&k2, 42).unwrap(), None);
    assert_eq!(m.get(&k2).unwrap(), Some(&42));
    assert_eq!(m.len(), 2);

    assert_eq!(m.remove(&k1).unwrap(), Some("x".to_string()));
    assert_eq!(m.get(&k1).unwrap(), None);
    assert_eq!(m.remove(&k1).unwrap(), None);
    assert_eq!(m.remove(&k1).unwrap(), None);
    assert!(m.contains_key(&k2).unwrap());
    assert!(!m.contains_key(&k1).unwrap());
    assert_eq!(m.len(), 1);
}

fn two_key_space() -> KeySpace {
    let ks = KeySpace::new();
    ks.create::<String>("a").unwrap();
    ks.create::<i32>("b").unwrap();
    ks
}

// Test: basic round-trip through both implementations.
#[test]
fn round_trip_both_maps() {
    let ks = two_key_space();
    round_trip(&mut ArrayHtMap::new(&ks), &ks);
    round_trip(&mut HashHtMap::new(), &ks);
}

// Test: TypeMismatch at the untyped boundary.
// Verifies: the error names the key and expected type; previous value kept.
#[test]
fn type_mismatch_keeps_previous_value() {
    let ks = two_key_space();
    let b = ks.get("b").unwrap();
    let typed = b.typed::<i32>().unwrap();

    let mut am = ArrayHtMap::new(&ks);
    let mut hm = HashHtMap::new();
    am.put(&typed, 7).unwrap();
    hm.put(&typed, 7).unwrap();

    for err in [
        am.put_raw(&b, Box::new("seven")).unwrap_err(),
        hm.put_raw(&b, Box::new(7i64)).unwrap_err(),
    ] {
        assert_eq!(
            err,
            HtError::TypeMismatch {
                key: "b".into(),
                expected: "i32",
            }
        );
        assert_eq!(err.to_string(), "type mismatch on key 'b': declared value type is i32");
    }
    assert_eq!(am.get(&typed).unwrap(), Some(&7));
    assert_eq!(hm.get(&typed).unwrap(), Some(&7));

    // A correctly typed untyped put goes through and returns the old cell.
    let prev = am.put_raw(&b, Box::new(8i32)).unwrap().unwrap();
    assert_eq!(prev.downcast_ref::<i32>(), Some(&7));
    assert_eq!(am.get(&typed).unwrap(), Some(&8));
}

// Test: set with the no-value sentinel.
#[test]
fn set_none_removes() {
    let ks = two_key_space();
    let a = ks.get("a").unwrap().typed::<String>().unwrap();
    let mut m = ArrayHtMap::new(&ks);
    assert_eq!(m.set(&a, Some("v".to_string())).unwrap(), None);
    assert_eq!(m.set(&a, Some("w".to_string())).unwrap(), Some("v".to_string()));
    assert_eq!(m.set(&a, None).unwrap(), Some("w".to_string()));
    assert!(m.is_empty());
    assert_eq!(m.set(&a, None).unwrap(), None);
}

// Test: keys created after the map was built.
// Verifies: the array grows on demand and the late key round-trips.
#[test]
fn array_map_accepts_late_keys() {
    let ks = two_key_space();
    let mut m = ArrayHtMap::new(&ks);
    assert_eq!(m.capacity(), 2);
    let late = ks.create::<Vec<u8>>("late").unwrap();
    assert_eq!(m.get(&late).unwrap(), None);
    m.put(&late, vec![1, 2, 3]).unwrap();
    assert!(m.capacity() >= 3);
    assert_eq!(m.get(&late).unwrap(), Some(&vec![1, 2, 3]));
    m.get_mut(&late).unwrap().unwrap().push(4);
    assert_eq!(m.remove(&late).unwrap(), Some(vec![1, 2, 3, 4]));
}

// Test: foreign keys on ArrayHtMap.
// Verifies: ForeignKeyUsage for every operation; no slot is read or written.
#[test]
fn array_map_rejects_foreign_keys() {
    let ks = KeySpace::new();
    let own = ks.create::<f64>("DKEY").unwrap();
    let other = KeySpace::new();
    let foreign = other.create::<f64>("DKEY").unwrap();
    let mut m = ArrayHtMap::new(&ks);
    m.put(&own, 1.0).unwrap();

    let expected = HtError::ForeignKeyUsage {
        key: "DKEY".into(),
        key_space: other.id(),
        map_space: ks.id(),
    };
    assert_eq!(m.put(&foreign, 3.4).unwrap_err(), expected);
    assert_eq!(m.get(&foreign).unwrap_err(), expected);
    assert_eq!(m.get_mut(&foreign).unwrap_err(), expected);
    assert_eq!(m.remove(&foreign).unwrap_err(), expected);
    assert_eq!(m.contains_key(&foreign).unwrap_err(), expected);
    assert_eq!(m.get(&own).unwrap(), Some(&1.0));
}

// Test: same-named keys from two spaces in one HashHtMap.
// Verifies: each get returns only the value stored under that exact key.
#[test]
fn hash_map_keeps_spaces_apart() {
    let s1 = KeySpace::new();
    let s2 = KeySpace::new();
    let k1 = s1.create::<String>("name").unwrap();
    let k2 = s2.create::<String>("name").unwrap();
    assert_eq!(k1.id(), k2.id());

    let mut m = HashHtMap::with_capacity(2);
    m.put(&k1, "one".to_string()).unwrap();
    m.put(&k2, "two".to_string()).unwrap();
    assert_eq!(m.len(), 2);
    assert_eq!(m.get(&k1).unwrap().map(String::as_str), Some("one"));
    assert_eq!(m.get(&k2).unwrap().map(String::as_str), Some("two"));
    assert_eq!(m.remove(&k1).unwrap(), Some("one".to_string()));
    assert_eq!(m.get(&k2).unwrap().map(String::as_str), Some("two"));
}

// Test: put_all is all-or-nothing.
// Verifies: one bad entry (wrong type, or foreign key for ArrayHtMap)
// rejects the whole batch; a clean batch applies fully.
#[test]
fn put_all_is_atomic() {
    let ks = two_key_space();
    let a = ks.get("a").unwrap();
    let b = ks.get("b").unwrap();
    let other = KeySpace::new();
    let foreign = other.create::<i32>("b").unwrap().into_raw();

    let mut m = ArrayHtMap::new(&ks);
    let bad: Vec<(RawKey, Value)> = vec![
        (a.clone(), Box::new("ok".to_string())),
        (b.clone(), Box::new("not an i32")),
    ];
    assert!(matches!(m.put_all(bad), Err(HtError::TypeMismatch { .. })));
    assert!(m.is_empty());

    let bad: Vec<(RawKey, Value)> = vec![
        (a.clone(), Box::new("ok".to_string())),
        (foreign.clone(), Box::new(1i32)),
    ];
    assert!(matches!(m.put_all(bad), Err(HtError::ForeignKeyUsage { .. })));
    assert!(m.is_empty());

    let good: Vec<(RawKey, Value)> = vec![
        (a.clone(), Box::new("ok".to_string())),
        (b.clone(), Box::new(5i32)),
    ];
    m.put_all(good).unwrap();
    assert_eq!(m.len(), 2);

    // Move everything into a HashHtMap, which also takes the foreign key.
    let mut h = HashHtMap::new();
    h.put_all(m).unwrap();
    h.put_raw(&foreign, Box::new(9i32)).unwrap();
    assert_eq!(h.len(), 3);
    assert_eq!(h.get(&b.typed::<i32>().unwrap()).unwrap(), Some(&5));
}

// Test: iteration agrees with lookups.
// Verifies: ArrayHtMap yields id order; HashHtMap yields the same entry set.
#[test]
fn iteration_matches_contents() {
    let ks = KeySpace::new();
    let keys: Vec<_> = (0..10)
        .map(|i| ks.create::<usize>(&format!("n{i}")).unwrap())
        .collect();
    let mut am = ArrayHtMap::new(&ks);
    let mut hm = HashHtMap::new();
    for k in keys.iter().rev().step_by(2) {
        am.put(k, k.id() * 10).unwrap();
        hm.put(k, k.id() * 10).unwrap();
    }

    let from_array: Vec<(usize, usize)> = am
        .iter()
        .map(|(k, v)| (k.id(), *v.downcast_ref::<usize>().unwrap()))
        .collect();
    assert_eq!(from_array, vec![(1, 10), (3, 30), (5, 50), (7, 70), (9, 90)]);

    let from_hash: HashMap<usize, usize> = (&hm)
        .into_iter()
        .map(|(k, v)| (k.id(), *v.downcast_ref::<usize>().unwrap()))
        .collect();
    let expected: HashMap<usize, usize> = from_array.iter().copied().collect();
    assert_eq!(from_hash, expected);

    // Restartable: a second pass yields the same entries.
    assert_eq!(am.iter().count(), 5);
    assert_eq!(am.iter().count(), 5);
}

// Test: maps can be handed across threads.
#[test]
fn maps_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ArrayHtMap>();
    assert_send_sync::<HashHtMap>();
    assert_send_sync::<KeySpace>();
}
