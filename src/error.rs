use crate::key::SpaceId;

pub type Result<T, E = HtError> = std::result::Result<T, E>;

/// Errors reported by `KeySpace` and the `HtMap` implementations.
///
/// Every failing call leaves the key space or map exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HtError {
    /// A key with this name already exists in the key space.
    #[error("invalid attempt to create a second key with name '{name}'")]
    DuplicateKeyName { name: String },

    /// A supplied value, or a requested key type, differs from the key's
    /// declared value type.
    #[error("type mismatch on key '{key}': declared value type is {expected}")]
    TypeMismatch { key: String, expected: &'static str },

    /// A key from another key space was given to a map bound to one space.
    #[error("key '{key}' from {key_space} used with a map bound to {map_space}")]
    ForeignKeyUsage {
        key: String,
        key_space: SpaceId,
        map_space: SpaceId,
    },
}
