//! Key handles: the untyped `RawKey` and the typed `Key<T>` view over it.

use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Process-unique identity of a `KeySpace`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SpaceId(u64);

impl SpaceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        SpaceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "key space #{}", self.0)
    }
}

/// Runtime descriptor of the value type a key accepts.
///
/// Equality and hashing consider only the `TypeId`.
#[derive(Copy, Clone)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// True if `value`'s concrete type is exactly this type.
    pub fn accepts(&self, value: &(dyn Any + Send + Sync)) -> bool {
        (*value).type_id() == self.id
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

impl Hash for ValueType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug)]
struct KeyData {
    id: usize,
    name: Box<str>,
    value_type: ValueType,
    space: SpaceId,
}

/// Untyped handle to a key registered in a `KeySpace`.
///
/// Cloning shares the same key record. Two `RawKey`s are equal only if they
/// are the same registered key; keys with equal names from different spaces
/// never compare equal.
#[derive(Clone)]
pub struct RawKey(Arc<KeyData>);

impl RawKey {
    pub(crate) fn new(id: usize, name: &str, value_type: ValueType, space: SpaceId) -> Self {
        RawKey(Arc::new(KeyData {
            id,
            name: name.into(),
            value_type,
            space,
        }))
    }

    /// Dense id assigned by the key space, equal to the creation order.
    pub fn id(&self) -> usize {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn value_type(&self) -> ValueType {
        self.0.value_type
    }

    pub fn space_id(&self) -> SpaceId {
        self.0.space
    }

    /// Typed view of this key, or `None` if its value type is not `T`.
    pub fn typed<T: Any>(&self) -> Option<Key<T>> {
        self.0.value_type.is::<T>().then(|| Key::from_raw(self.clone()))
    }
}

impl PartialEq for RawKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RawKey {}

impl Hash for RawKey {
    // (space, id) identifies exactly one key record.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.space.hash(state);
        self.0.id.hash(state);
    }
}

impl fmt::Display for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl fmt::Debug for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawKey")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("value_type", &self.0.value_type)
            .field("space", &self.0.space)
            .finish()
    }
}

impl AsRef<RawKey> for RawKey {
    fn as_ref(&self) -> &RawKey {
        self
    }
}

/// Typed handle to a registered key whose values are of type `T`.
///
/// A `Key<T>` only exists for keys whose `ValueType` is exactly `T`, which
/// is what lets maps hand back `&T` without the caller casting.
pub struct Key<T> {
    raw: RawKey,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    pub(crate) fn from_raw(raw: RawKey) -> Self {
        Self {
            raw,
            _ty: PhantomData,
        }
    }

    pub fn id(&self) -> usize {
        self.raw.id()
    }

    pub fn name(&self) -> &str {
        self.raw.name()
    }

    pub fn value_type(&self) -> ValueType {
        self.raw.value_type()
    }

    pub fn space_id(&self) -> SpaceId {
        self.raw.space_id()
    }

    pub fn raw(&self) -> &RawKey {
        &self.raw
    }

    pub fn into_raw(self) -> RawKey {
        self.raw
    }
}

impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        Self::from_raw(self.raw.clone())
    }
}

impl<T> PartialEq for Key<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Key<T> {}

impl<T> PartialEq<RawKey> for Key<T> {
    fn eq(&self, other: &RawKey) -> bool {
        self.raw == *other
    }
}

impl<T> Hash for Key<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> AsRef<RawKey> for Key<T> {
    fn as_ref(&self) -> &RawKey {
        &self.raw
    }
}

impl<T> From<Key<T>> for RawKey {
    fn from(key: Key<T>) -> Self {
        key.raw
    }
}

impl<T> fmt::Display for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

impl<T> fmt::Debug for Key<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.raw).finish()
    }
}
