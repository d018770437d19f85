//! The operation set shared by `ArrayHtMap`, `HashHtMap` and `UniMap`.

use crate::error::{HtError, Result};
use crate::key::{Key, RawKey};
use core::any::Any;

/// Opaque stored cell. The key, not the cell, carries the value type.
pub type Value = Box<dyn Any + Send + Sync>;

/// Rejects a value whose concrete type is not the key's declared type.
pub(crate) fn check_value(key: &RawKey, value: &(dyn Any + Send + Sync)) -> Result<()> {
    if key.value_type().accepts(value) {
        Ok(())
    } else {
        Err(HtError::TypeMismatch {
            key: key.name().to_owned(),
            expected: key.value_type().name(),
        })
    }
}

/// Heterogeneous typed map keyed by registered keys.
///
/// Implementations provide the untyped `*_raw` operations; the typed
/// operations taking `Key<T>` are derived from them and never require the
/// caller to downcast.
pub trait HtMap {
    /// Iterator over `(key, value)` pairs.
    type Iter<'a>: Iterator<Item = (&'a RawKey, &'a (dyn Any + Send + Sync))>
    where
        Self: 'a;

    /// Fails if this map can never hold `key`. Maps that accept keys from
    /// any space always succeed.
    fn check_key(&self, key: &RawKey) -> Result<()>;

    fn get_raw(&self, key: &RawKey) -> Result<Option<&(dyn Any + Send + Sync)>>;

    fn get_raw_mut(&mut self, key: &RawKey) -> Result<Option<&mut (dyn Any + Send + Sync)>>;

    /// Stores `value` under `key`, returning the previous cell.
    ///
    /// # Errors
    ///
    /// `HtError::TypeMismatch` if `value` is not of `key.value_type()`; the
    /// previous value stays in place.
    fn put_raw(&mut self, key: &RawKey, value: Value) -> Result<Option<Value>>;

    fn remove_raw(&mut self, key: &RawKey) -> Result<Option<Value>>;

    fn len(&self) -> usize;

    fn clear(&mut self);

    fn iter(&self) -> Self::Iter<'_>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key<K>(&self, key: &K) -> Result<bool>
    where
        K: AsRef<RawKey> + ?Sized,
    {
        Ok(self.get_raw(key.as_ref())?.is_some())
    }

    fn get<T: Any + Send + Sync>(&self, key: &Key<T>) -> Result<Option<&T>> {
        Ok(self.get_raw(key.raw())?.and_then(|v| v.downcast_ref::<T>()))
    }

    fn get_mut<T: Any + Send + Sync>(&mut self, key: &Key<T>) -> Result<Option<&mut T>> {
        Ok(self
            .get_raw_mut(key.raw())?
            .and_then(|v| v.downcast_mut::<T>()))
    }

    /// Stores `value` under `key`, returning the previous value.
    fn put<T: Any + Send + Sync>(&mut self, key: &Key<T>, value: T) -> Result<Option<T>> {
        let prev = self.put_raw(key.raw(), Box::new(value))?;
        Ok(prev.and_then(|p| p.downcast::<T>().ok()).map(|b| *b))
    }

    fn remove<T: Any + Send + Sync>(&mut self, key: &Key<T>) -> Result<Option<T>> {
        let prev = self.remove_raw(key.raw())?;
        Ok(prev.and_then(|p| p.downcast::<T>().ok()).map(|b| *b))
    }

    /// `put` for `Some`, `remove` for `None`.
    fn set<T: Any + Send + Sync>(&mut self, key: &Key<T>, value: Option<T>) -> Result<Option<T>> {
        match value {
            Some(v) => self.put(key, v),
            None => self.remove(key),
        }
    }

    /// Stores every entry, or none of them.
    ///
    /// All keys and values are validated before the first write, so an
    /// error leaves the map unchanged.
    fn put_all<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (RawKey, Value)>,
    {
        let entries: Vec<(RawKey, Value)> = entries.into_iter().collect();
        for (key, value) in &entries {
            self.check_key(key)?;
            check_value(key, &**value)?;
        }
        for (key, value) in entries {
            self.put_raw(&key, value)?;
        }
        Ok(())
    }
}
