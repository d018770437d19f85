//! HashHtMap: sparse storage keyed by key identity, usable with keys from
//! any number of key spaces.
//!
//! Entries live in a `SlotMap`; a `HashTable` of slot keys indexes them by
//! the key's hash. Each entry stores its precomputed hash, so rehashing the
//! index never hashes a key again.

use crate::error::Result;
use crate::ht_map::{check_value, HtMap, Value};
use crate::key::RawKey;
use core::any::Any;
use core::fmt;
use core::hash::BuildHasher;
use hashbrown::hash_table;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

#[derive(Debug)]
struct Entry {
    key: RawKey,
    value: Value,
    hash: u64,
}

pub struct HashHtMap<S = RandomState> {
    hasher: S,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry>,
}

impl HashHtMap {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    /// Pre-sizes for about `expected` entries.
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_capacity_and_hasher(expected, Default::default())
    }
}

impl Default for HashHtMap {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> HashHtMap<S>
where
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::new(),
            slots: SlotMap::with_key(),
        }
    }

    pub fn with_capacity_and_hasher(expected: usize, hasher: S) -> Self {
        Self {
            hasher,
            index: HashTable::with_capacity(expected),
            slots: SlotMap::with_capacity_and_key(expected),
        }
    }

    fn make_hash(&self, key: &RawKey) -> u64 {
        self.hasher.hash_one(key)
    }

    fn find(&self, key: &RawKey) -> Option<DefaultKey> {
        let hash = self.make_hash(key);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|e| e.key == *key)
                    .unwrap_or(false)
            })
            .copied()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_> {
        IterMut {
            it: self.slots.iter_mut(),
        }
    }
}

impl<S> HtMap for HashHtMap<S>
where
    S: BuildHasher,
{
    type Iter<'a>
        = Iter<'a>
    where
        Self: 'a;

    fn check_key(&self, _key: &RawKey) -> Result<()> {
        Ok(())
    }

    fn get_raw(&self, key: &RawKey) -> Result<Option<&(dyn Any + Send + Sync)>> {
        Ok(self
            .find(key)
            .and_then(|k| self.slots.get(k))
            .map(|e| &*e.value))
    }

    fn get_raw_mut(&mut self, key: &RawKey) -> Result<Option<&mut (dyn Any + Send + Sync)>> {
        Ok(match self.find(key) {
            Some(k) => self.slots.get_mut(k).map(|e| &mut *e.value),
            None => None,
        })
    }

    fn put_raw(&mut self, key: &RawKey, value: Value) -> Result<Option<Value>> {
        check_value(key, &*value)?;
        let hash = self.make_hash(key);
        match self.index.entry(
            hash,
            |&kk| self.slots.get(kk).map(|e| e.key == *key).unwrap_or(false),
            |&kk| self.slots.get(kk).map(|e| e.hash).unwrap_or(0),
        ) {
            hash_table::Entry::Occupied(o) => {
                let k = *o.get();
                let prev = self
                    .slots
                    .get_mut(k)
                    .map(|e| core::mem::replace(&mut e.value, value));
                Ok(prev)
            }
            hash_table::Entry::Vacant(v) => {
                let k = self.slots.insert(Entry {
                    key: key.clone(),
                    value,
                    hash,
                });
                v.insert(k);
                Ok(None)
            }
        }
    }

    fn remove_raw(&mut self, key: &RawKey) -> Result<Option<Value>> {
        let hash = self.make_hash(key);
        let found = self.index.find_entry(hash, |&kk| {
            self.slots.get(kk).map(|e| e.key == *key).unwrap_or(false)
        });
        match found {
            Ok(o) => {
                let (k, _) = o.remove();
                Ok(self.slots.remove(k).map(|e| e.value))
            }
            Err(_) => Ok(None),
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
    }

    fn iter(&self) -> Iter<'_> {
        Iter {
            it: self.slots.iter(),
        }
    }
}

/// Entries in unspecified order.
pub struct Iter<'a> {
    it: slotmap::basic::Iter<'a, DefaultKey, Entry>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a RawKey, &'a (dyn Any + Send + Sync));

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &*e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Mutable entries in unspecified order.
pub struct IterMut<'a> {
    it: slotmap::basic::IterMut<'a, DefaultKey, Entry>,
}

impl<'a> Iterator for IterMut<'a> {
    type Item = (&'a RawKey, &'a mut (dyn Any + Send + Sync));

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (&e.key, &mut *e.value))
    }
}

/// Owned entries in unspecified order.
pub struct IntoIter {
    it: slotmap::basic::IntoIter<DefaultKey, Entry>,
}

impl Iterator for IntoIter {
    type Item = (RawKey, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (e.key, e.value))
    }
}

impl<'a, S: BuildHasher> IntoIterator for &'a HashHtMap<S> {
    type Item = (&'a RawKey, &'a (dyn Any + Send + Sync));
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl<S> IntoIterator for HashHtMap<S> {
    type Item = (RawKey, Value);
    type IntoIter = IntoIter;

    fn into_iter(self) -> IntoIter {
        IntoIter {
            it: self.slots.into_iter(),
        }
    }
}

impl<S> fmt::Debug for HashHtMap<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.slots.values().map(|e| &e.key))
            .finish()
    }
}
