//! htmap: heterogeneous typed maps addressed by keys registered in a
//! shared `KeySpace`.
//!
//! ```
//! use htmap::{ArrayHtMap, HtMap, KeySpace};
//!
//! let space = KeySpace::new();
//! let name = space.create::<String>("name").unwrap();
//! let age = space.create::<u32>("age").unwrap();
//!
//! let mut m = ArrayHtMap::new(&space);
//! m.put(&name, "ada".to_string()).unwrap();
//! m.put(&age, 36).unwrap();
//! assert_eq!(m.get(&age).unwrap(), Some(&36));
//! ```
//!
//! Internal Design:
//!
//! Summary
//! - Goal: store values of differing types in one container and read them
//!   back as their own types, with the key (not the caller) carrying the type.
//! - Layers:
//!   - KeySpace: mints `Key<T>`/`RawKey` handles with dense ids and unique
//!     names; publishes an immutable snapshot of all keys on each creation.
//!   - HtMap: the contract. Implementations provide untyped `*_raw`
//!     operations over opaque `Box<dyn Any + Send + Sync>` cells; the typed
//!     operations are derived from them.
//!   - ArrayHtMap: dense slots indexed by key id, bound to one KeySpace.
//!   - HashHtMap<S>: hash index keyed by key identity, any KeySpace.
//!   - UniMap: ArrayHtMap over one process-wide KeySpace.
//!
//! Constraints
//! - Key registration is rare and serialized per KeySpace by a mutex; all
//!   KeySpace reads are lock-free loads of the current snapshot.
//! - Maps are not internally synchronized. They are `Send + Sync`, and
//!   mutation needs `&mut`, so sharing a mutable map takes an outer lock.
//! - `put_raw` checks the value's concrete type against the key's declared
//!   type; this is the only runtime type enforcement the storage performs.
//! - ArrayHtMap rejects keys from other spaces (`ForeignKeyUsage`) before
//!   indexing; ids are only meaningful inside their own space.
//! - Every failing call leaves the key space or map unchanged.
//!
//! Ownership
//! - A KeySpace owns its keys through its snapshot. A key refers back to its
//!   space only by `SpaceId`, so there is no reference cycle.
//! - ArrayHtMap holds a KeySpace handle to size its slots from the current
//!   key count.
//!
//! Notes and non-goals
//! - No persistence or serialization of keys or maps.
//! - Maps are not `Clone`: cells are not required to be clonable.
//! - Key ids are never reused; a key lives as long as its KeySpace.

mod array_ht_map;
mod error;
mod hash_ht_map;
mod ht_map;
mod ht_map_proptest;
mod key;
mod key_space;
mod uni_map;

// Public surface
pub use array_ht_map::{ArrayHtMap, Growth};
pub use error::{HtError, Result};
pub use hash_ht_map::HashHtMap;
pub use ht_map::{HtMap, Value};
pub use key::{Key, RawKey, SpaceId, ValueType};
pub use key_space::{KeySeq, KeySpace};
pub use uni_map::UniMap;

pub mod iter {
    //! Iterator types of the map implementations.
    pub use crate::array_ht_map::{
        IntoIter as ArrayIntoIter, Iter as ArrayIter, IterMut as ArrayIterMut,
    };
    pub use crate::hash_ht_map::{
        IntoIter as HashIntoIter, Iter as HashIter, IterMut as HashIterMut,
    };
}
