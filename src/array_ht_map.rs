//! ArrayHtMap: dense storage indexed by key id, bound to one `KeySpace`.
//!
//! Slot `i` holds the value for the key with id `i`. The slot vector is
//! sized to the space's key count at construction and grows on demand when
//! a key created later is written. Keys from any other space are rejected
//! with `HtError::ForeignKeyUsage` before any indexing happens.

use crate::error::{HtError, Result};
use crate::ht_map::{check_value, HtMap, Value};
use crate::key::RawKey;
use crate::key_space::KeySpace;
use core::any::Any;
use core::fmt;

/// How the slot vector grows when a key id falls outside it.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Growth {
    /// Grow to exactly the current key count of the space.
    Exact,
    /// At least double the slot count.
    #[default]
    Doubling,
}

#[derive(Debug)]
struct Slot {
    key: RawKey,
    value: Value,
}

pub struct ArrayHtMap {
    space: KeySpace,
    slots: Vec<Option<Slot>>,
    len: usize,
    growth: Growth,
}

impl ArrayHtMap {
    pub fn new(space: &KeySpace) -> Self {
        Self::with_growth(space, Growth::default())
    }

    pub fn with_growth(space: &KeySpace, growth: Growth) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(space.len(), || None);
        Self {
            space: space.clone(),
            slots,
            len: 0,
            growth,
        }
    }

    pub fn space(&self) -> &KeySpace {
        &self.space
    }

    pub fn growth(&self) -> Growth {
        self.growth
    }

    /// Current number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_> {
        IterMut {
            it: self.slots.iter_mut(),
        }
    }

    fn ensure_slot(&mut self, id: usize) {
        let cur = self.slots.len();
        if id < cur {
            return;
        }
        let needed = (id + 1).max(self.space.len());
        let target = match self.growth {
            Growth::Exact => needed,
            Growth::Doubling => needed.max(cur * 2),
        };
        tracing::trace!(space = %self.space.id(), from = cur, to = target, "growing slots");
        self.slots.resize_with(target, || None);
    }
}

impl HtMap for ArrayHtMap {
    type Iter<'a>
        = Iter<'a>
    where
        Self: 'a;

    fn check_key(&self, key: &RawKey) -> Result<()> {
        if self.space.owns(key) {
            Ok(())
        } else {
            Err(HtError::ForeignKeyUsage {
                key: key.name().to_owned(),
                key_space: key.space_id(),
                map_space: self.space.id(),
            })
        }
    }

    fn get_raw(&self, key: &RawKey) -> Result<Option<&(dyn Any + Send + Sync)>> {
        self.check_key(key)?;
        Ok(self
            .slots
            .get(key.id())
            .and_then(Option::as_ref)
            .map(|s| &*s.value))
    }

    fn get_raw_mut(&mut self, key: &RawKey) -> Result<Option<&mut (dyn Any + Send + Sync)>> {
        self.check_key(key)?;
        Ok(self
            .slots
            .get_mut(key.id())
            .and_then(Option::as_mut)
            .map(|s| &mut *s.value))
    }

    fn put_raw(&mut self, key: &RawKey, value: Value) -> Result<Option<Value>> {
        self.check_key(key)?;
        check_value(key, &*value)?;
        self.ensure_slot(key.id());
        let slot = &mut self.slots[key.id()];
        match slot {
            Some(s) => Ok(Some(core::mem::replace(&mut s.value, value))),
            None => {
                *slot = Some(Slot {
                    key: key.clone(),
                    value,
                });
                self.len += 1;
                Ok(None)
            }
        }
    }

    fn remove_raw(&mut self, key: &RawKey) -> Result<Option<Value>> {
        self.check_key(key)?;
        let prev = self.slots.get_mut(key.id()).and_then(Option::take);
        if prev.is_some() {
            self.len -= 1;
        }
        Ok(prev.map(|s| s.value))
    }

    fn len(&self) -> usize {
        self.len
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.len = 0;
    }

    fn iter(&self) -> Iter<'_> {
        Iter {
            it: self.slots.iter(),
        }
    }
}

/// Entries in key id order.
pub struct Iter<'a> {
    it: core::slice::Iter<'a, Option<Slot>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a RawKey, &'a (dyn Any + Send + Sync));

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .by_ref()
            .flatten()
            .next()
            .map(|s| (&s.key, &*s.value))
    }
}

/// Mutable entries in key id order.
pub struct IterMut<'a> {
    it: core::slice::IterMut<'a, Option<Slot>>,
}

impl<'a> Iterator for IterMut<'a> {
    type Item = (&'a RawKey, &'a mut (dyn Any + Send + Sync));

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .by_ref()
            .flatten()
            .next()
            .map(|s| (&s.key, &mut *s.value))
    }
}

/// Owned entries in key id order.
pub struct IntoIter {
    it: std::vec::IntoIter<Option<Slot>>,
}

impl Iterator for IntoIter {
    type Item = (RawKey, Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.by_ref().flatten().next().map(|s| (s.key, s.value))
    }
}

impl<'a> IntoIterator for &'a ArrayHtMap {
    type Item = (&'a RawKey, &'a (dyn Any + Send + Sync));
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl IntoIterator for ArrayHtMap {
    type Item = (RawKey, Value);
    type IntoIter = IntoIter;

    fn into_iter(self) -> IntoIter {
        IntoIter {
            it: self.slots.into_iter(),
        }
    }
}

impl fmt::Debug for ArrayHtMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayHtMap")
            .field("space", &self.space.id())
            .field("keys", &self.iter().map(|(k, _)| k.name()).collect::<Vec<_>>())
            .finish()
    }
}
