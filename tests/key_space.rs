// KeySpace test suite.
//
// Core invariants exercised:
// - Dense ids: the i-th successful create gets id i; len counts creations.
// - Unique names: a duplicate create fails and changes nothing.
// - Snapshot reads: get/len/keys never block and never observe a partially
//   published snapshot, even while other threads are creating keys.
// - Serialized get_or_create: racing callers all receive the same key.
use htmap::{ArrayHtMap, HtError, HtMap, KeySpace, ValueType};
use std::sync::Barrier;
use std::thread;

// Test: ids follow creation order.
// Verifies: id == 0-based creation index and len == number of creates.
#[test]
fn ids_are_dense_and_ordered() {
    let ks = KeySpace::new();
    for i in 0..20 {
        let k = ks.create::<u64>(&format!("key{i}")).unwrap();
        assert_eq!(k.id(), i);
        assert_eq!(ks.len(), i + 1);
    }
    let seq = ks.keys();
    assert_eq!(seq.len(), 20);
    for (i, k) in seq.iter().enumerate() {
        assert_eq!(k.id(), i);
        assert_eq!(k.name(), format!("key{i}"));
    }
}

// Test: duplicate names.
// Verifies: DuplicateKeyName is returned and len is unchanged.
#[test]
fn duplicate_name_leaves_space_unchanged() {
    let ks = KeySpace::new();
    let first = ks.create::<String>("KEY1").unwrap();
    let err = ks.create::<f32>("KEY1").unwrap_err();
    assert_eq!(
        err,
        HtError::DuplicateKeyName {
            name: "KEY1".into()
        }
    );
    assert_eq!(err.to_string(), "invalid attempt to create a second key with name 'KEY1'");
    assert_eq!(ks.len(), 1);
    assert_eq!(ks.get("KEY1").unwrap(), *first.raw());

    let err = ks.create_raw("KEY1", ValueType::of::<u8>()).unwrap_err();
    assert!(matches!(err, HtError::DuplicateKeyName { .. }));
    assert_eq!(ks.len(), 1);
}

// Test: lookup by name.
// Verifies: get returns the very key that was created, or None.
#[test]
fn get_returns_created_key_or_none() {
    let ks = KeySpace::new();
    assert!(ks.get("missing").is_none());
    let k = ks.create::<Vec<f64>>("list").unwrap();
    let found = ks.get("list").unwrap();
    assert_eq!(found, *k.raw());
    assert_eq!(found.value_type(), ValueType::of::<Vec<f64>>());
    assert_eq!(found.typed::<Vec<f64>>().unwrap(), k);
    assert!(ks.get("missing").is_none());
}

// Test: concurrent creation with per-thread maps.
// Assumes: each thread creates uniquely named keys in a shared space.
// Verifies: every key round-trips through an ArrayHtMap built before the
// key existed, and the final space has dense ids for all keys.
#[test]
fn concurrent_creation() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;
    let ks = KeySpace::new();
    let barrier = Barrier::new(THREADS);

    thread::scope(|s| {
        for t in 0..THREADS {
            let ks = &ks;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                let mut m = ArrayHtMap::new(ks);
                let mut keys = Vec::with_capacity(PER_THREAD);
                for i in 0..PER_THREAD {
                    let k = ks.create::<String>(&format!("k-{t}.{i}")).unwrap();
                    m.put(&k, k.name().to_owned()).unwrap();
                    keys.push(k);
                    if i % 7 == 0 {
                        thread::yield_now();
                    }
                }
                for k in &keys {
                    assert_eq!(m.get(k).unwrap().map(String::as_str), Some(k.name()));
                }
                assert_eq!(m.len(), PER_THREAD);
            });
        }
    });

    assert_eq!(ks.len(), THREADS * PER_THREAD);
    for (i, k) in ks.keys().iter().enumerate() {
        assert_eq!(k.id(), i);
        assert_eq!(ks.get(k.name()).as_ref(), Some(k));
    }
}

// Test: readers during creation.
// Verifies: every snapshot a reader loads is internally consistent
// (keys[i].id == i, names resolve) and snapshots only ever grow.
#[test]
fn readers_see_whole_snapshots() {
    let ks = KeySpace::new();
    thread::scope(|s| {
        let writer = s.spawn(|| {
            for i in 0..500 {
                ks.create::<u32>(&format!("w{i}")).unwrap();
            }
        });
        for _ in 0..3 {
            s.spawn(|| {
                let mut last = 0;
                while last < 500 {
                    let seq = ks.keys();
                    assert!(seq.len() >= last);
                    for (i, k) in seq.iter().enumerate() {
                        assert_eq!(k.id(), i);
                    }
                    if let Some(k) = seq.last() {
                        assert_eq!(ks.get(k.name()).as_ref(), Some(k));
                    }
                    assert!(ks.len() >= seq.len());
                    last = seq.len();
                }
            });
        }
        writer.join().unwrap();
    });
}

// Test: racing get_or_create.
// Verifies: all threads receive the identical key and only one is created.
#[test]
fn get_or_create_is_serialized() {
    let ks = KeySpace::new();
    let barrier = Barrier::new(8);
    let keys: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    ks.get_or_create::<i64>("shared").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(ks.len(), 1);
    assert!(keys.windows(2).all(|w| w[0] == w[1]));
}
