//! UniMap: an `ArrayHtMap` over a single process-wide `KeySpace`.
//!
//! Useful as a general attribute bag where every component registers its
//! keys once, at startup, in the shared space.

use crate::array_ht_map::{self, ArrayHtMap};
use crate::error::Result;
use crate::ht_map::{HtMap, Value};
use crate::key::{Key, RawKey};
use crate::key_space::KeySpace;
use core::any::Any;
use std::sync::LazyLock;

static KEY_SPACE: LazyLock<KeySpace> = LazyLock::new(KeySpace::new);

#[derive(Debug)]
pub struct UniMap {
    inner: ArrayHtMap,
}

impl UniMap {
    pub fn new() -> Self {
        Self {
            inner: ArrayHtMap::new(&KEY_SPACE),
        }
    }

    /// The key space shared by every `UniMap`.
    pub fn key_space() -> &'static KeySpace {
        &KEY_SPACE
    }

    /// Registers a key in the shared key space.
    ///
    /// # Errors
    ///
    /// `HtError::DuplicateKeyName` if the name is already taken.
    pub fn create_key<T: Any + Send + Sync>(name: &str) -> Result<Key<T>> {
        KEY_SPACE.create(name)
    }

    pub fn iter_mut(&mut self) -> array_ht_map::IterMut<'_> {
        self.inner.iter_mut()
    }
}

impl Default for UniMap {
    fn default() -> Self {
        Self::new()
    }
}

impl HtMap for UniMap {
    type Iter<'a>
        = array_ht_map::Iter<'a>
    where
        Self: 'a;

    fn check_key(&self, key: &RawKey) -> Result<()> {
        self.inner.check_key(key)
    }

    fn get_raw(&self, key: &RawKey) -> Result<Option<&(dyn Any + Send + Sync)>> {
        self.inner.get_raw(key)
    }

    fn get_raw_mut(&mut self, key: &RawKey) -> Result<Option<&mut (dyn Any + Send + Sync)>> {
        self.inner.get_raw_mut(key)
    }

    fn put_raw(&mut self, key: &RawKey, value: Value) -> Result<Option<Value>> {
        self.inner.put_raw(key, value)
    }

    fn remove_raw(&mut self, key: &RawKey) -> Result<Option<Value>> {
        self.inner.remove_raw(key)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn clear(&mut self) {
        self.inner.clear()
    }

    fn iter(&self) -> array_ht_map::Iter<'_> {
        self.inner.iter()
    }
}

impl<'a> IntoIterator for &'a UniMap {
    type Item = (&'a RawKey, &'a (dyn Any + Send + Sync));
    type IntoIter = array_ht_map::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl IntoIterator for UniMap {
    type Item = (RawKey, Value);
    type IntoIter = array_ht_map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
