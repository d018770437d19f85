//! KeySpace: registry of named, typed keys with copy-on-write publication.
//!
//! Readers load the current `Snapshot` through an `ArcSwap` and never block.
//! Writers (`create*`, `get_or_create*`) serialize on a per-space mutex,
//! build a new snapshot from the current one plus the new key, and publish it
//! with a single store. A reader therefore sees either the old or the new
//! snapshot in full, and `keys()[i].id() == i` holds for every snapshot.

use crate::error::{HtError, Result};
use crate::key::{Key, RawKey, SpaceId, ValueType};
use arc_swap::ArcSwap;
use core::any::Any;
use core::fmt;
use core::ops::Deref;
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// Immutable published state. Never mutated after it is stored.
struct Snapshot {
    keys: Vec<RawKey>,
    names: HashMap<Box<str>, RawKey>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            keys: Vec::new(),
            names: HashMap::new(),
        }
    }

    fn with_key(&self, key: RawKey) -> Self {
        let mut keys = Vec::with_capacity(self.keys.len() + 1);
        keys.extend(self.keys.iter().cloned());
        keys.push(key.clone());

        let mut names = HashMap::with_capacity(self.names.len() + 1);
        names.extend(self.names.iter().map(|(n, k)| (n.clone(), k.clone())));
        names.insert(Box::from(key.name()), key);

        Self { keys, names }
    }
}

struct Inner {
    id: SpaceId,
    state: ArcSwap<Snapshot>,
    create_lock: Mutex<()>,
}

/// Registry that mints uniquely named keys.
///
/// Cloning a `KeySpace` yields another handle to the same registry.
#[derive(Clone)]
pub struct KeySpace {
    inner: Arc<Inner>,
}

impl KeySpace {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                id: SpaceId::next(),
                state: ArcSwap::from_pointee(Snapshot::empty()),
                create_lock: Mutex::new(()),
            }),
        }
    }

    pub fn id(&self) -> SpaceId {
        self.inner.id
    }

    /// Registers a new key for values of type `T`.
    ///
    /// # Errors
    ///
    /// `HtError::DuplicateKeyName` if `name` is already registered; the
    /// space is left unchanged.
    pub fn create<T: Any + Send + Sync>(&self, name: &str) -> Result<Key<T>> {
        self.create_raw(name, ValueType::of::<T>())
            .map(Key::from_raw)
    }

    /// Registers a new key whose value type is only known at runtime.
    ///
    /// # Errors
    ///
    /// `HtError::DuplicateKeyName` if `name` is already registered.
    pub fn create_raw(&self, name: &str, value_type: ValueType) -> Result<RawKey> {
        let _g = self.inner.create_lock.lock();
        let cur = self.inner.state.load_full();
        if cur.names.contains_key(name) {
            tracing::debug!(space = %self.inner.id, name, "duplicate key name rejected");
            return Err(HtError::DuplicateKeyName {
                name: name.to_owned(),
            });
        }
        Ok(self.publish_locked(&cur, name, value_type))
    }

    /// Looks up a key by name without locking.
    pub fn get(&self, name: &str) -> Option<RawKey> {
        self.inner.state.load().names.get(name).cloned()
    }

    /// Returns the key named `name`, creating it for type `T` if absent.
    ///
    /// Lookup and creation happen under the creation lock, so concurrent
    /// callers all receive the same key.
    ///
    /// # Errors
    ///
    /// `HtError::TypeMismatch` if the key exists with a value type other than `T`.
    pub fn get_or_create<T: Any + Send + Sync>(&self, name: &str) -> Result<Key<T>> {
        let raw = self.get_or_create_raw(name, ValueType::of::<T>());
        raw.typed::<T>().ok_or_else(|| HtError::TypeMismatch {
            key: raw.name().to_owned(),
            expected: raw.value_type().name(),
        })
    }

    /// Returns the key named `name`, whatever its value type, or creates it
    /// with `value_type`.
    pub fn get_or_create_raw(&self, name: &str, value_type: ValueType) -> RawKey {
        let _g = self.inner.create_lock.lock();
        let cur = self.inner.state.load_full();
        match cur.names.get(name) {
            Some(key) => key.clone(),
            None => self.publish_locked(&cur, name, value_type),
        }
    }

    /// Number of keys created so far.
    pub fn len(&self) -> usize {
        self.inner.state.load().keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Immutable snapshot of all keys in creation (id) order.
    pub fn keys(&self) -> KeySeq {
        KeySeq {
            snap: self.inner.state.load_full(),
        }
    }

    /// True if `key` was created by this space.
    pub fn owns(&self, key: &RawKey) -> bool {
        key.space_id() == self.inner.id
    }

    // Caller holds `create_lock` and has checked that `name` is free in `cur`.
    fn publish_locked(&self, cur: &Snapshot, name: &str, value_type: ValueType) -> RawKey {
        let id = cur.keys.len();
        let key = RawKey::new(id, name, value_type, self.inner.id);
        self.inner.state.store(Arc::new(cur.with_key(key.clone())));
        tracing::debug!(
            space = %self.inner.id,
            id,
            name,
            value_type = value_type.name(),
            "key created"
        );
        key
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeySpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeySpace")
            .field("id", &self.inner.id)
            .field("len", &self.len())
            .finish()
    }
}

/// A pinned, immutable view of a key space's keys in id order.
///
/// Holding a `KeySeq` keeps its snapshot alive; keys created afterwards are
/// not visible through it.
#[derive(Clone)]
pub struct KeySeq {
    snap: Arc<Snapshot>,
}

impl Deref for KeySeq {
    type Target = [RawKey];

    fn deref(&self) -> &[RawKey] {
        &self.snap.keys
    }
}

impl<'a> IntoIterator for &'a KeySeq {
    type Item = &'a RawKey;
    type IntoIter = core::slice::Iter<'a, RawKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.snap.keys.iter()
    }
}

impl fmt::Debug for KeySeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.snap.keys.iter().map(RawKey::name))
            .finish()
    }
}
